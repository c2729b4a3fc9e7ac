//! Ordered buffer of git commands with abort-on-first-failure execution.

use std::fmt;

use crate::error::{LifecycleError, Result};
use crate::git::GitExecutor;
use crate::report::{Event, Reporter};

/// One git invocation, kept as an argument vector (no shell involved)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<String>,
}

impl GitCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GitCommand {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn checkout(branch: &str) -> Self {
        GitCommand::new(["checkout", branch])
    }

    pub fn create_branch(name: &str, base: &str) -> Self {
        GitCommand::new(["checkout", "-b", name, base])
    }

    pub fn merge_no_ff(source: &str) -> Self {
        GitCommand::new(["merge", "--no-ff", "--no-edit", source])
    }

    /// Push a branch or tag to the remote
    pub fn push(remote: &str, refname: &str) -> Self {
        GitCommand::new(["push", remote, refname])
    }

    pub fn pull(remote: &str, branch: &str) -> Self {
        GitCommand::new(["pull", remote, branch])
    }

    pub fn annotated_tag(tag: &str, message: &str) -> Self {
        GitCommand::new(["tag", "-a", tag, "-m", message])
    }

    pub fn delete_local(branch: &str) -> Self {
        GitCommand::new(["branch", "-d", branch])
    }

    pub fn delete_remote(remote: &str, branch: &str) -> Self {
        GitCommand::new(["push", remote, "--delete", branch])
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git")?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Outcome of a successful flush
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// Commands that ran, or would have run in a dry run
    pub commands: Vec<GitCommand>,
    pub dry_run: bool,
}

/// Commands waiting to be executed, in order
///
/// Owned by a single lifecycle operation. Flushing always drains the queue,
/// whether it succeeds or not.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<GitCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, command: GitCommand) {
        tracing::debug!(command = %command, "queued");
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Executes the queued commands strictly in order.
    ///
    /// In dry-run mode nothing reaches the executor; each command is only
    /// reported. Otherwise the first non-zero exit stops the flush: commands
    /// already executed stay applied, the rest are dropped.
    ///
    /// # Returns
    /// * `Ok(ExecutionResult)` - Every command succeeded (or the run was dry)
    /// * `Err(CommandExecution)` - Carries the failing command, its stderr (or
    ///   stdout) and the last command that succeeded
    pub fn flush(
        &mut self,
        git: &dyn GitExecutor,
        dry_run: bool,
        reporter: &dyn Reporter,
    ) -> Result<ExecutionResult> {
        let commands = std::mem::take(&mut self.commands);
        tracing::info!(count = commands.len(), dry_run, "flushing command queue");

        if dry_run {
            for command in &commands {
                reporter.report(&Event::DryRun(command.to_string()));
            }
            return Ok(ExecutionResult {
                commands,
                dry_run: true,
            });
        }

        let mut last_success: Option<&GitCommand> = None;
        for command in &commands {
            let output = git.run(command.args()).map_err(|e| match e {
                LifecycleError::CommandExecution { command, message, .. } => {
                    LifecycleError::CommandExecution {
                        command,
                        message,
                        last_success: last_success.map(ToString::to_string),
                    }
                }
                other => other,
            })?;

            if !output.success() {
                tracing::debug!(command = %command, exit_code = output.exit_code, "command failed");
                return Err(LifecycleError::CommandExecution {
                    command: command.to_string(),
                    message: output.error_message(),
                    last_success: last_success.map(ToString::to_string),
                });
            }

            reporter.report(&Event::Executed(command.to_string()));
            last_success = Some(command);
        }

        Ok(ExecutionResult {
            commands,
            dry_run: false,
        })
    }
}
