use crate::error::{LifecycleError, Result};
use crate::git::{AheadBehind, CommandOutput, GitExecutor, Repository};
use crate::queue::GitCommand;
use git2::Oid;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MockState {
    current: String,
    local: BTreeMap<String, Oid>,
    remote: BTreeSet<String>,
    tags: Vec<String>,
    dirty: bool,
    unmerged: Vec<String>,
    ahead_behind: HashMap<(String, String), AheadBehind>,
    failures: Vec<Failure>,
    log: Vec<String>,
    next_oid: u8,
}

/// Injected failure: commands starting with `prefix`, optionally only while
/// `branch` is checked out
struct Failure {
    prefix: String,
    branch: Option<String>,
    stderr: String,
}

impl MockState {
    fn new_oid(&mut self) -> Oid {
        self.next_oid = self.next_oid.wrapping_add(1);
        Oid::from_bytes(&[self.next_oid; 20]).unwrap_or_else(|_| Oid::zero())
    }
}

/// In-memory repository for testing without actual git operations
///
/// Implements both [Repository] and [GitExecutor]: the commands it receives
/// are applied to the simulated branches, so queries made after a flush see
/// their effect. Every command and every conflict query is recorded in order.
pub struct MockRepository {
    state: Mutex<MockState>,
}

impl MockRepository {
    /// Create an empty mock repository with `main` checked out
    pub fn new() -> Self {
        MockRepository {
            state: Mutex::new(MockState {
                current: "main".to_string(),
                ..MockState::default()
            }),
        }
    }

    /// Create a repository where every given branch points at the same commit
    pub fn with_branches(branches: &[&str]) -> Self {
        let repo = Self::new();
        {
            let mut state = repo.state();
            let oid = state.new_oid();
            for branch in branches {
                state.local.insert(branch.to_string(), oid);
            }
            if let Some(first) = branches.first() {
                state.current = first.to_string();
            }
        }
        repo
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Advance a branch by one commit
    pub fn commit(&self, branch: &str) -> Oid {
        let mut state = self.state();
        let oid = state.new_oid();
        state.local.insert(branch.to_string(), oid);
        oid
    }

    /// Mark a branch as present on the remote
    pub fn add_remote_branch(&self, name: impl Into<String>) {
        self.state().remote.insert(name.into());
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state().dirty = dirty;
    }

    /// Paths reported as unmerged by the next conflict queries
    pub fn set_unmerged(&self, paths: &[&str]) {
        self.state().unmerged = paths.iter().map(|p| p.to_string()).collect();
    }

    pub fn set_ahead_behind(&self, branch: &str, other: &str, counts: AheadBehind) {
        self.state()
            .ahead_behind
            .insert((branch.to_string(), other.to_string()), counts);
    }

    /// Make every command starting with `command_prefix` (e.g. `"git push"`) fail
    pub fn fail_on(&self, command_prefix: impl Into<String>, stderr: impl Into<String>) {
        self.state().failures.push(Failure {
            prefix: command_prefix.into(),
            branch: None,
            stderr: stderr.into(),
        });
    }

    /// Like [fail_on](Self::fail_on), but only while `branch` is checked out
    pub fn fail_on_branch(
        &self,
        branch: impl Into<String>,
        command_prefix: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.state().failures.push(Failure {
            prefix: command_prefix.into(),
            branch: Some(branch.into()),
            stderr: stderr.into(),
        });
    }

    /// Executed commands, rendered as `git <args>`
    pub fn commands(&self) -> Vec<String> {
        self.state()
            .log
            .iter()
            .filter(|line| line.starts_with("git "))
            .cloned()
            .collect()
    }

    /// Executed commands interleaved with conflict queries (`query unmerged`)
    pub fn events(&self) -> Vec<String> {
        self.state().log.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.state().tags.clone()
    }

    pub fn remote_branches(&self) -> Vec<String> {
        self.state().remote.iter().cloned().collect()
    }

    pub fn local_branches(&self) -> Vec<String> {
        self.state().local.keys().cloned().collect()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn failed(stderr: impl Into<String>) -> CommandOutput {
    CommandOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

impl GitExecutor for MockRepository {
    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let mut state = self.state();
        let line = GitCommand::new(args.iter().cloned()).to_string();
        state.log.push(line.clone());

        let current = state.current.clone();
        if let Some(failure) = state.failures.iter().find(|failure| {
            line.starts_with(failure.prefix.as_str())
                && failure.branch.as_deref().map_or(true, |b| b == current)
        }) {
            return Ok(failed(failure.stderr.clone()));
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["checkout", "-b", name, base] => {
                if state.local.contains_key(*name) {
                    return Ok(failed(format!(
                        "fatal: a branch named '{}' already exists",
                        name
                    )));
                }
                let Some(oid) = state.local.get(*base).copied() else {
                    return Ok(failed(format!("fatal: '{}' is not a commit", base)));
                };
                state.local.insert(name.to_string(), oid);
                state.current = name.to_string();
            }
            ["checkout", name] => {
                if !state.local.contains_key(*name) {
                    return Ok(failed(format!(
                        "error: pathspec '{}' did not match any file(s) known to git",
                        name
                    )));
                }
                state.current = name.to_string();
            }
            ["merge", .., source] => {
                if !state.local.contains_key(*source) {
                    return Ok(failed(format!("merge: {} - not something we can merge", source)));
                }
                let oid = state.new_oid();
                let current = state.current.clone();
                state.local.insert(current, oid);
            }
            ["branch", "-d", name] => {
                if state.current == *name {
                    return Ok(failed(format!(
                        "error: Cannot delete branch '{}' checked out",
                        name
                    )));
                }
                if state.local.remove(*name).is_none() {
                    return Ok(failed(format!("error: branch '{}' not found.", name)));
                }
            }
            ["push", _, "--delete", name] => {
                if !state.remote.remove(*name) {
                    return Ok(failed(format!(
                        "error: unable to delete '{}': remote ref does not exist",
                        name
                    )));
                }
            }
            ["push", _, name] => {
                if state.local.contains_key(*name) {
                    state.remote.insert(name.to_string());
                }
            }
            ["tag", "-a", tag, ..] => {
                state.tags.push(tag.to_string());
            }
            _ => {}
        }

        Ok(CommandOutput::default())
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.state().current.clone())
    }

    fn branch_exists_local(&self, name: &str) -> bool {
        self.state().local.contains_key(name)
    }

    fn branch_exists_remote(&self, _remote: &str, name: &str) -> bool {
        self.state().remote.contains(name)
    }

    fn branch_head(&self, name: &str) -> Result<Oid> {
        self.state().local.get(name).copied().ok_or_else(|| {
            LifecycleError::command(
                format!("rev-parse {}", name),
                format!("fatal: ambiguous argument '{}': unknown revision", name),
            )
        })
    }

    fn ahead_behind(&self, branch: &str, other: &str) -> Result<AheadBehind> {
        self.branch_head(branch)?;
        self.branch_head(other)?;
        Ok(self
            .state()
            .ahead_behind
            .get(&(branch.to_string(), other.to_string()))
            .copied()
            .unwrap_or_default())
    }

    fn is_working_tree_clean(&self) -> bool {
        !self.state().dirty
    }

    fn unmerged_paths(&self) -> Result<Vec<String>> {
        let mut state = self.state();
        state.log.push("query unmerged".to_string());
        Ok(state.unmerged.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(repo: &MockRepository, args: &[&str]) -> CommandOutput {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        repo.run(&args).unwrap()
    }

    #[test]
    fn test_mock_branch_creation() {
        let repo = MockRepository::with_branches(&["main", "develop"]);
        assert!(run(&repo, &["checkout", "-b", "feature/x", "develop"]).success());
        assert!(repo.branch_exists_local("feature/x"));
        assert_eq!(repo.current_branch().unwrap(), "feature/x");
        assert!(repo.hashes_equal("feature/x", "develop").unwrap());
    }

    #[test]
    fn test_mock_duplicate_branch_fails() {
        let repo = MockRepository::with_branches(&["main", "develop"]);
        let output = run(&repo, &["checkout", "-b", "develop", "main"]);
        assert!(!output.success());
        assert!(output.stderr.contains("already exists"));
    }

    #[test]
    fn test_mock_commit_moves_head() {
        let repo = MockRepository::with_branches(&["main", "develop"]);
        repo.commit("develop");
        assert!(!repo.hashes_equal("main", "develop").unwrap());
    }

    #[test]
    fn test_mock_merge_and_delete() {
        let repo = MockRepository::with_branches(&["develop", "feature/x"]);
        repo.commit("feature/x");
        assert!(run(&repo, &["merge", "--no-ff", "--no-edit", "feature/x"]).success());
        assert!(!repo.hashes_equal("develop", "feature/x").unwrap());
        assert!(run(&repo, &["branch", "-d", "feature/x"]).success());
        assert!(!repo.branch_exists_local("feature/x"));
    }

    #[test]
    fn test_mock_remote_tracking() {
        let repo = MockRepository::with_branches(&["develop"]);
        run(&repo, &["push", "origin", "develop"]);
        assert!(repo.branch_exists_remote("origin", "develop"));
        run(&repo, &["push", "origin", "--delete", "develop"]);
        assert!(!repo.branch_exists_remote("origin", "develop"));
    }

    #[test]
    fn test_mock_injected_failure() {
        let repo = MockRepository::with_branches(&["develop"]);
        repo.fail_on("git push", "fatal: could not read from remote");
        let output = run(&repo, &["push", "origin", "develop"]);
        assert_eq!(output.exit_code, 1);
        assert_eq!(repo.commands(), vec!["git push origin develop"]);
    }

    #[test]
    fn test_mock_logs_commands_as_displayed() {
        let repo = MockRepository::with_branches(&["main"]);
        run(&repo, &["tag", "-a", "v1.2.0", "-m", "Release 1.2.0"]);
        assert_eq!(
            repo.commands(),
            vec![GitCommand::annotated_tag("v1.2.0", "Release 1.2.0").to_string()]
        );
        assert_eq!(repo.tags(), vec!["v1.2.0"]);
    }

    #[test]
    fn test_mock_failure_scoped_to_branch() {
        let repo = MockRepository::with_branches(&["main", "develop", "release/1.0.0"]);
        repo.commit("release/1.0.0");
        repo.fail_on_branch("develop", "git merge", "CONFLICT (content)");

        assert!(run(&repo, &["merge", "--no-ff", "--no-edit", "release/1.0.0"]).success());
        run(&repo, &["checkout", "develop"]);
        let output = run(&repo, &["merge", "--no-ff", "--no-edit", "release/1.0.0"]);
        assert!(!output.success());
        assert_eq!(output.stderr, "CONFLICT (content)");
    }

    #[test]
    fn test_mock_default() {
        let repo = MockRepository::default();
        assert!(repo.local_branches().is_empty());
        assert!(repo.is_working_tree_clean());
        assert!(repo.unmerged_paths().unwrap().is_empty());
    }
}
