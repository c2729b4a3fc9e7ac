//! Git backend abstraction layer
//!
//! The lifecycle engine talks to git through two traits:
//!
//! - [Repository]: read-only branch queries (existence, hashes, ahead/behind,
//!   working tree state). Answers are always read live, never cached.
//! - [GitExecutor]: runs a single git command and returns its exit status and
//!   output. Every mutating operation goes through this trait, driven by the
//!   [CommandQueue](crate::queue::CommandQueue).
//!
//! The concrete implementations include:
//!
//! - [repository::Git2Repository]: queries via the `git2` crate
//! - [executor::SystemGit]: commands via the `git` binary
//! - [mock::MockRepository]: an in-memory simulation of both, for tests
//!
//! # Usage
//!
//! ```rust
//! # use git_lifecycle::git::Repository;
//! # fn example(repo: &dyn Repository) -> git_lifecycle::Result<()> {
//! if repo.branch_exists_local("develop") {
//!     let counts = repo.ahead_behind("feature/login", "develop")?;
//!     println!("{} ahead, {} behind", counts.ahead, counts.behind);
//! }
//! # Ok(())
//! # }
//! ```

pub mod executor;
pub mod mock;
pub mod repository;

pub use executor::SystemGit;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;

/// Commit counts of one branch relative to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AheadBehind {
    /// Commits on the first branch missing from the second
    pub ahead: usize,
    /// Commits on the second branch missing from the first
    pub behind: usize,
}

/// Read-only branch queries against the repository
///
/// Existence and cleanliness checks answer with a plain `bool` and never fail;
/// structural queries fail with [crate::error::LifecycleError::CommandExecution].
pub trait Repository: Send + Sync {
    /// Name of the currently checked out branch
    fn current_branch(&self) -> Result<String>;

    /// Whether a local branch with this name exists
    fn branch_exists_local(&self, name: &str) -> bool;

    /// Whether the remote advertises a branch head with this name
    fn branch_exists_remote(&self, remote: &str, name: &str) -> bool;

    /// Commit the tip of a local branch points at
    fn branch_head(&self, name: &str) -> Result<Oid>;

    /// Counts commits reachable from one branch and not the other
    fn ahead_behind(&self, branch: &str, other: &str) -> Result<AheadBehind>;

    /// True when there are no staged or unstaged changes (untracked files are ignored)
    fn is_working_tree_clean(&self) -> bool;

    /// Paths with unresolved merge conflicts, sorted
    fn unmerged_paths(&self) -> Result<Vec<String>>;

    /// Whether two branches point at the same commit.
    ///
    /// Used to detect a working branch that has no commits of its own yet.
    fn hashes_equal(&self, branch: &str, other: &str) -> Result<bool> {
        Ok(self.branch_head(branch)? == self.branch_head(other)?)
    }
}

/// Exit status and captured output of one git invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Error text to surface: stderr, or stdout when stderr is empty
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs git commands
///
/// Implementations must block until the command finishes. A non-zero exit is
/// reported through [CommandOutput::exit_code], not as an `Err`; `Err` is
/// reserved for failing to run the command at all.
pub trait GitExecutor: Send + Sync {
    /// Run `git` with the given arguments
    fn run(&self, args: &[String]) -> Result<CommandOutput>;
}
