//! Apply / Commit Driver (component F): applies the current patch to the
//! index and, on success, synthesizes a commit advancing `HEAD`.

use regex::bytes::Regex;

use crate::authscript::AuthorTriple;
use crate::error::{AmError, Result};
use crate::external::{ExternalTool, ToolInvocation};
use crate::session::Session;

/// Outcome of one apply attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Failed,
}

/// Apply the session's `patch` file to the index with `git apply --index`.
/// Never mutates persisted session state; the caller decides what to do
/// with a `Failed` outcome (leave the session live for `--continue`).
pub fn run_apply(tool: &dyn ExternalTool, session: &Session) -> Result<ApplyOutcome> {
    let patch_path = session.store().path_of("patch");
    let patch_path_str = patch_path.to_string_lossy();
    let invocation = ToolInvocation::new(&["apply", "--index", patch_path_str.as_ref()])
        .with_cwd(session.repo_root());
    let output = tool.run(&invocation)?;
    Ok(if output.status_ok {
        ApplyOutcome::Applied
    } else {
        ApplyOutcome::Failed
    })
}

pub(crate) fn first_line(msg: &[u8]) -> &[u8] {
    match msg.iter().position(|&b| b == b'\n') {
        Some(i) => &msg[..i],
        None => msg,
    }
}

fn validate_identity(triple: &AuthorTriple) -> Result<()> {
    if triple.name.is_empty() {
        return Err(AmError::InvalidIdentity("empty author name".into()));
    }
    let email_re = Regex::new(r"^[^\s@]+@[^\s@]+$").expect("static regex is valid");
    if !email_re.is_match(triple.email.as_ref()) {
        return Err(AmError::InvalidIdentity(format!(
            "malformed author email: {}",
            triple.email
        )));
    }
    Ok(())
}

/// Write the current index as a tree, create a commit with `msg` and the
/// given authorship, and advance `HEAD` to it.
///
/// Parent resolution: if `HEAD` currently resolves, that commit is the
/// sole parent; otherwise the new commit is parentless (unborn branch) and
/// a note is written to `log` explaining that history was empty.
pub fn do_commit(
    tool: &dyn ExternalTool,
    session: &Session,
    author: &AuthorTriple,
    msg: &[u8],
    reflog_action: &str,
    log: &mut impl std::io::Write,
) -> Result<()> {
    validate_identity(author)?;

    let repo_root = session.repo_root();

    let tree_out = tool.run(&ToolInvocation::new(&["write-tree"]).with_cwd(repo_root))?;
    if !tree_out.status_ok {
        return Err(AmError::Bug(
            "git write-tree failed to write a tree".into(),
        ));
    }
    let tree = trim_hex(&tree_out.stdout);

    let head_out = tool.run(
        &ToolInvocation::new(&["rev-parse", "--verify", "-q", "HEAD"]).with_cwd(repo_root),
    )?;
    let parent = if head_out.status_ok {
        Some(trim_hex(&head_out.stdout))
    } else {
        writeln!(log, "applying to an empty history").ok();
        None
    };

    let mut commit_args: Vec<&str> = vec!["commit-tree", &tree];
    if let Some(ref p) = parent {
        commit_args.push("-p");
        commit_args.push(p);
    }

    let invocation = ToolInvocation::new(&commit_args)
        .with_cwd(repo_root)
        .with_stdin(msg.to_vec())
        .with_env("GIT_AUTHOR_NAME", author.name.to_string())
        .with_env("GIT_AUTHOR_EMAIL", author.email.to_string())
        .with_env("GIT_AUTHOR_DATE", author.date.to_string());
    let commit_out = tool.run(&invocation)?;
    if !commit_out.status_ok {
        return Err(AmError::Bug("failed to write commit object".into()));
    }
    let new_commit = trim_hex(&commit_out.stdout);

    let reflog_msg = format!(
        "{}: {}",
        reflog_action,
        String::from_utf8_lossy(first_line(msg))
    );

    let mut update_args: Vec<&str> = vec!["update-ref", "-m", &reflog_msg, "HEAD", &new_commit];
    if let Some(ref p) = parent {
        update_args.push(p);
    }
    let update_out = tool.run(&ToolInvocation::new(&update_args).with_cwd(repo_root))?;
    if !update_out.status_ok {
        return Err(AmError::Bug(
            "HEAD update failed: ref did not match expected parent".into(),
        ));
    }

    Ok(())
}

fn trim_hex(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout).trim().to_string()
}
