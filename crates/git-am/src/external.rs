//! The core's only form of dispatch: invoking the five external
//! collaborators (splitter, parser, applier, commit writer, index/ref
//! store) named in the spec as subprocesses of the real `git` binary.
//!
//! Every collaborator call is routed through the single `ExternalTool`
//! trait so tests can substitute a `MockTool` instead of shelling out.

use std::io::Write;
use std::path::Path;

use git_utils::subprocess::{GitCommand, StdioMode};

use crate::error::{AmError, Result};

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub status_ok: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// One invocation of an external collaborator: a `git <args...>` command,
/// run with an optional working directory, stdin payload, and extra
/// environment variables (used for `GIT_AUTHOR_*`/`GIT_COMMITTER_*` when
/// invoking `commit-tree`).
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub args: Vec<String>,
    pub cwd: Option<std::path::PathBuf>,
    pub stdin: Option<Vec<u8>>,
    pub env: Vec<(String, String)>,
}

impl ToolInvocation {
    pub fn new(args: &[&str]) -> Self {
        Self {
            args: args.iter().map(|s| s.to_string()).collect(),
            cwd: None,
            stdin: None,
            env: Vec::new(),
        }
    }

    pub fn with_cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_stdin(mut self, data: Vec<u8>) -> Self {
        self.stdin = Some(data);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.env.push((key.into(), val.into()));
        self
    }
}

/// Abstraction over "run one external collaborator and collect its exit
/// status plus captured stdout/stderr". The production implementation
/// shells out to the real `git` binary; tests inject a scripted mock.
pub trait ExternalTool {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Production `ExternalTool` backed by `git_utils::subprocess::GitCommand`,
/// invoking the `git` binary found on `PATH`.
pub struct SystemGit;

impl ExternalTool for SystemGit {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let mut cmd = GitCommand::new("git")
            .args(&invocation.args)
            .stdout(StdioMode::Pipe)
            .stderr(StdioMode::Pipe);

        if invocation.stdin.is_some() {
            cmd = cmd.stdin(StdioMode::Pipe);
        }

        if let Some(ref dir) = invocation.cwd {
            cmd = cmd.working_dir(dir);
        }

        for (k, v) in &invocation.env {
            cmd = cmd.env(k, v);
        }

        let output = if let Some(ref payload) = invocation.stdin {
            run_with_stdin(cmd, payload)?
        } else {
            cmd.run()?
        };

        Ok(ToolOutput {
            status_ok: output.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn run_with_stdin(
    cmd: GitCommand,
    payload: &[u8],
) -> Result<git_utils::subprocess::GitCommandResult> {
    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(payload).map_err(|e| AmError::Io {
            path: std::path::PathBuf::from("<stdin>"),
            source: e,
        })?;
    }
    let output = child.wait_with_output().map_err(|e| AmError::Io {
        path: std::path::PathBuf::from("<git>"),
        source: e,
    })?;
    Ok(git_utils::subprocess::GitCommandResult {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Test-support double for `ExternalTool`. Not gated behind `#[cfg(test)]`
/// so integration tests under `tests/` can use it.
pub mod testing {
    use super::*;
    use std::cell::RefCell;

    /// A scripted response for one matching invocation prefix.
    pub struct ScriptedResponse {
        pub matches: Box<dyn Fn(&ToolInvocation) -> bool>,
        pub output: ToolOutput,
    }

    /// Records every invocation it receives and answers from a list of
    /// scripted responses, matched in order; falls back to a successful
    /// empty response if nothing matches.
    #[derive(Default)]
    pub struct MockTool {
        responses: RefCell<Vec<ScriptedResponse>>,
        calls: RefCell<Vec<ToolInvocation>>,
    }

    impl MockTool {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(
            &self,
            matches: impl Fn(&ToolInvocation) -> bool + 'static,
            output: ToolOutput,
        ) {
            self.responses.borrow_mut().push(ScriptedResponse {
                matches: Box::new(matches),
                output,
            });
        }

        pub fn calls(&self) -> Vec<ToolInvocation> {
            self.calls.borrow().clone()
        }
    }

    impl ExternalTool for MockTool {
        fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            let responses = self.responses.borrow();
            for resp in responses.iter() {
                if (resp.matches)(invocation) {
                    return Ok(resp.output.clone());
                }
            }
            Ok(ToolOutput {
                status_ok: true,
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        }
    }
}
