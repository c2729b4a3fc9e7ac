use crate::error::{LifecycleError, Result};
use crate::git::{CommandOutput, GitExecutor};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Executes commands with the `git` binary found on `PATH`
pub struct SystemGit {
    workdir: PathBuf,
}

impl SystemGit {
    /// Run every command inside `workdir`
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        SystemGit {
            workdir: workdir.as_ref().to_path_buf(),
        }
    }
}

impl GitExecutor for SystemGit {
    /// Spawn git and block until it exits
    ///
    /// Stdin is closed so a command can never wait on an interactive editor
    /// or credential prompt; git reports the failure instead.
    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(workdir = %self.workdir.display(), args = ?args, "spawning git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                LifecycleError::command(
                    format!("git {}", args.join(" ")),
                    format!("Failed to execute git: {}", e),
                )
            })?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(exit_code = result.exit_code, "git finished");
        Ok(result)
    }
}
