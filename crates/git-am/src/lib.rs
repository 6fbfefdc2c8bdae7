//! Resumable mailbox-to-commit patch applier session engine.
//!
//! The pipeline is a single-threaded state machine (`session`) that drives
//! five external collaborators — mail splitter, mail parser, patch applier,
//! commit writer, and index/ref store — all reached through the
//! [`external::ExternalTool`] trait so the real `git` binary can be swapped
//! for a scripted double in tests.

pub mod apply_commit;
pub mod authscript;
pub mod cli;
pub mod detect;
pub mod error;
pub mod external;
pub mod mailinfo;
pub mod repo;
pub mod run_loop;
pub mod session;
pub mod split;

use std::io;

use cli::Cli;
use error::{AmError, Result};
use external::ExternalTool;
use session::Session;

const SESSION_DIR_NAME: &str = "rebase-apply";

/// Top-level entry point shared by `main` and integration tests: discover
/// the repository, resume or start a session, and drive it to completion.
pub fn run(cli: &Cli, tool: &dyn ExternalTool) -> Result<i32> {
    let repo_paths = repo::discover(tool)?;
    let session_dir = repo_paths.git_dir.join(SESSION_DIR_NAME);

    let mut session = Session::new(&session_dir, &repo_paths.work_tree);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut log = stderr.lock();

    if let Some(ref fmt) = cli.patch_format {
        if fmt != "mbox" {
            return Err(AmError::UserInput(format!(
                "Patch format {fmt} is not supported."
            )));
        }
    }

    if Session::in_progress(&session_dir) {
        session.load()?;
    } else {
        let format = detect::detect_patch_format(&cli.paths)?;
        if format != detect::PatchFormat::Mbox {
            return Err(AmError::DetectionFailure);
        }
        let paths = if cli.paths.is_empty() {
            vec!["-".to_string()]
        } else {
            cli.paths.clone()
        };
        session.setup(tool, format, &paths)?;
    }

    let reflog_action = std::env::var("GIT_REFLOG_ACTION").unwrap_or_else(|_| "am".to_string());

    match run_loop::am_run(tool, &mut session, &reflog_action, &mut out, &mut log) {
        Ok(()) => Ok(0),
        Err(e) if e.is_resumable() => {
            use std::io::Write;
            writeln!(log, "{e}").ok();
            Ok(e.exit_code())
        }
        Err(e) => Err(e),
    }
}

pub fn session_dir_name() -> &'static str {
    SESSION_DIR_NAME
}
