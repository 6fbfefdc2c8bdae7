//! Thin helpers for talking to the repository layer (itself an external
//! collaborator, per the spec): locating the working tree and control
//! directory, and reading the one ambient config value this crate cares
//! about.

use std::path::PathBuf;

use crate::error::{AmError, Result};
use crate::external::{ExternalTool, ToolInvocation};

/// Resolved repository location: the working tree root and the `.git`
/// control directory (which may be elsewhere, e.g. with `--git-dir` or a
/// linked worktree).
pub struct RepoPaths {
    pub work_tree: PathBuf,
    pub git_dir: PathBuf,
}

/// Discover the repository surrounding the current directory by shelling
/// out to `git rev-parse`, exactly as any other plumbing consumer would.
pub fn discover(tool: &dyn ExternalTool) -> Result<RepoPaths> {
    let top = tool.run(&ToolInvocation::new(&["rev-parse", "--show-toplevel"]))?;
    if !top.status_ok {
        return Err(AmError::UserInput(
            "not a git repository (or any of the parent directories)".into(),
        ));
    }
    let git_dir_out = tool.run(&ToolInvocation::new(&["rev-parse", "--git-dir"]))?;
    if !git_dir_out.status_ok {
        return Err(AmError::Bug("git-dir resolution failed after toplevel succeeded".into()));
    }

    let work_tree = PathBuf::from(String::from_utf8_lossy(&top.stdout).trim());
    let git_dir_raw = String::from_utf8_lossy(&git_dir_out.stdout).trim().to_string();
    let git_dir = if PathBuf::from(&git_dir_raw).is_absolute() {
        PathBuf::from(git_dir_raw)
    } else {
        work_tree.join(git_dir_raw)
    };

    Ok(RepoPaths { work_tree, git_dir })
}

/// Read `advice.amworkdir` from the repository's own config store,
/// defaulting to `true` on any non-zero exit or malformed value, matching
/// C git's `git_config_get_bool` fallback behavior.
pub fn advice_amworkdir(tool: &dyn ExternalTool, repo_root: &std::path::Path) -> bool {
    let invocation = ToolInvocation::new(&["config", "--bool", "advice.amworkdir"])
        .with_cwd(repo_root);
    match tool.run(&invocation) {
        Ok(out) if out.status_ok => {
            String::from_utf8_lossy(&out.stdout).trim() != "false"
        }
        _ => true,
    }
}
