//! Branch lifecycle state machine
//!
//! A working branch moves through `Absent -> Active -> Merging -> Deleted`.
//! Nothing is persisted: every operation re-derives the state from the
//! repository, validates it, queues the git commands that move the branch to
//! its next state and flushes them.
//!
//! All four branch kinds share one `start` and one `finish` workflow; the
//! differences (base branch, merge targets and their order, tagging) come
//! from [KindDescriptor](crate::domain::KindDescriptor).
//!
//! Validation and state errors are raised before anything is queued. A merge
//! conflict can stop `finish` halfway: merges into earlier targets stay
//! applied and the user resumes with plain git.

use crate::config::Config;
use crate::conflict::ConflictDetector;
use crate::domain::{validate_branch_name, validate_version, BaseBranch, BranchKind};
use crate::error::{LifecycleError, Result};
use crate::git::{AheadBehind, GitExecutor, Repository};
use crate::queue::{CommandQueue, ExecutionResult, GitCommand};
use crate::report::{Event, Reporter};

/// Snapshot of the checked out branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStatus {
    pub branch: String,
    /// Kind and short name when the branch carries a configured prefix
    pub kind: Option<(BranchKind, String)>,
    pub clean: bool,
    /// Branch the ahead/behind counts are relative to
    pub compared_to: Option<String>,
    pub ahead_behind: Option<AheadBehind>,
}

/// Drives start/finish/switch operations for one configuration
pub struct LifecycleController<'a> {
    config: &'a Config,
    repo: &'a dyn Repository,
    git: &'a dyn GitExecutor,
    reporter: &'a dyn Reporter,
    dry_run: bool,
}

impl<'a> LifecycleController<'a> {
    /// Create a controller; debug mode from the config makes every flush a dry run
    pub fn new(
        config: &'a Config,
        repo: &'a dyn Repository,
        git: &'a dyn GitExecutor,
        reporter: &'a dyn Reporter,
    ) -> Self {
        LifecycleController {
            config,
            repo,
            git,
            reporter,
            dry_run: config.debug,
        }
    }

    /// Force dry-run mode for this controller regardless of the config
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = self.dry_run || dry_run;
        self
    }

    /// Validated short name; releases are named by their version
    fn short_name(&self, kind: BranchKind, name: &str) -> Result<String> {
        match kind {
            BranchKind::Release => Ok(validate_version(name)?.to_string()),
            _ => validate_branch_name(name),
        }
    }

    /// Flush into the running result of the operation.
    ///
    /// A failure at the head of a flush gets the last command of an earlier
    /// flush as its last successful step.
    fn flush(&self, queue: &mut CommandQueue, total: &mut ExecutionResult) -> Result<()> {
        let result = queue
            .flush(self.git, self.dry_run, self.reporter)
            .map_err(|e| match e {
                LifecycleError::CommandExecution {
                    command,
                    message,
                    last_success: None,
                } => LifecycleError::CommandExecution {
                    command,
                    message,
                    last_success: total.commands.last().map(ToString::to_string),
                },
                other => other,
            })?;
        total.dry_run = result.dry_run;
        total.commands.extend(result.commands);
        Ok(())
    }

    /// Check out `branch` right away, executing whatever is already queued first
    fn checkout(
        &self,
        queue: &mut CommandQueue,
        branch: &str,
        total: &mut ExecutionResult,
    ) -> Result<()> {
        queue.enqueue(GitCommand::checkout(branch));
        self.flush(queue, total)
    }

    fn require_clean(&self, action: &str) -> Result<()> {
        if self.repo.is_working_tree_clean() {
            Ok(())
        } else {
            Err(LifecycleError::state(format!(
                "Working tree has uncommitted changes; commit or stash them before {}",
                action
            )))
        }
    }

    fn require_local(&self, branch: &str, role: &str) -> Result<()> {
        if self.repo.branch_exists_local(branch) {
            Ok(())
        } else {
            Err(LifecycleError::state(format!(
                "{} '{}' does not exist locally",
                role, branch
            )))
        }
    }

    /// Create a new working branch from the kind's base branch.
    ///
    /// The branch is checked out locally and not pushed.
    ///
    /// # Errors
    /// * `Validation` - Bad name (or version, for releases)
    /// * `State` - Branch already exists, base branch missing, or dirty working tree
    /// * `CommandExecution` - git failed while checking out or creating the branch
    pub fn start(&self, kind: BranchKind, name: &str) -> Result<ExecutionResult> {
        let short = self.short_name(kind, name)?;
        let full = kind.full_name(self.config, &short);

        if self.repo.branch_exists_local(&full) {
            return Err(LifecycleError::state(format!(
                "Branch '{}' already exists",
                full
            )));
        }

        let descriptor = kind.descriptor(self.config);
        let base = descriptor.based_on.resolve(self.config);
        self.require_local(base, "Base branch")?;
        self.require_clean(&format!("starting {} '{}'", kind, short))?;

        self.reporter
            .report(&Event::Operation(format!("Starting {} '{}'", kind, short)));
        tracing::info!(%kind, branch = %full, base, "starting branch");

        let mut queue = CommandQueue::new();
        let mut result = ExecutionResult::default();
        queue.enqueue(GitCommand::checkout(base));
        queue.enqueue(GitCommand::create_branch(&full, base));
        self.flush(&mut queue, &mut result)?;

        self.reporter.report(&Event::BranchCreated {
            branch: full,
            base: base.to_string(),
        });
        Ok(result)
    }

    /// Merge a working branch into its targets, then delete it.
    ///
    /// Targets are processed in the kind's fixed order. For each one the
    /// target is checked out (flushing earlier work), the merge is queued and
    /// the working tree is checked for unresolved paths. The check runs before
    /// the queued merge is executed, so it reports conflicts left in the tree,
    /// not conflicts the pending merge will produce; a conflicting merge still
    /// fails when the queue is flushed.
    ///
    /// # Errors
    /// * `Validation` - Bad name (or version, for releases)
    /// * `State` - Branch or a merge target missing, or branch has no commits yet
    /// * `MergeConflict` - Unresolved paths found; branch deletion is never queued
    /// * `CommandExecution` - git failed; earlier steps stay applied
    pub fn finish(&self, kind: BranchKind, name: &str) -> Result<ExecutionResult> {
        let short = self.short_name(kind, name)?;
        let full = kind.full_name(self.config, &short);
        self.require_local(&full, "Branch")?;

        let descriptor = kind.descriptor(self.config);
        let base = descriptor.based_on.resolve(self.config);
        let targets: Vec<(BaseBranch, &str)> = descriptor
            .merge_targets
            .iter()
            .map(|target| (*target, target.resolve(self.config)))
            .collect();
        self.require_local(base, "Base branch")?;
        for (_, target) in &targets {
            self.require_local(target, "Merge target")?;
        }

        if self.repo.hashes_equal(&full, base)? {
            return Err(LifecycleError::state(format!(
                "Branch '{}' has no commits yet (same commit as '{}')",
                full, base
            )));
        }

        self.reporter
            .report(&Event::Operation(format!("Finishing {} '{}'", kind, short)));
        tracing::info!(%kind, branch = %full, "finishing branch");

        let remote = self.config.remote.as_str();
        let tag = format!("v{}", short);
        let detector = ConflictDetector::new(self.repo);
        let mut queue = CommandQueue::new();
        let mut result = ExecutionResult::default();

        for (target_kind, target) in &targets {
            self.checkout(&mut queue, target, &mut result)?;
            queue.enqueue(GitCommand::merge_no_ff(&full));

            let paths = detector.unresolved_paths()?;
            if !paths.is_empty() {
                self.reporter.report(&Event::ConflictsFound {
                    target: target.to_string(),
                    paths: paths.clone(),
                });
                return Err(LifecycleError::MergeConflict {
                    target: target.to_string(),
                    paths,
                });
            }

            if self.config.push_branches {
                queue.enqueue(GitCommand::push(remote, target));
            }

            if descriptor.tag_on_main && *target_kind == BaseBranch::Main {
                queue.enqueue(GitCommand::annotated_tag(
                    &tag,
                    &format!("Release {}", short),
                ));
                if self.config.push_branches {
                    queue.enqueue(GitCommand::push(remote, &tag));
                }
            }
        }

        queue.enqueue(GitCommand::delete_local(&full));
        let delete_remote =
            self.config.push_branches && self.repo.branch_exists_remote(remote, &full);
        if delete_remote {
            queue.enqueue(GitCommand::delete_remote(remote, &full));
        } else if self.config.push_branches {
            self.reporter.report(&Event::RemoteDeleteSkipped {
                branch: full.clone(),
            });
        }

        self.flush(&mut queue, &mut result)?;

        for (_, target) in &targets {
            self.reporter.report(&Event::Merged {
                source: full.clone(),
                target: target.to_string(),
            });
        }
        if descriptor.tag_on_main {
            self.reporter.report(&Event::Tagged { tag });
        }
        self.reporter.report(&Event::BranchDeleted {
            branch: full.clone(),
            remote: false,
        });
        if delete_remote {
            self.reporter.report(&Event::BranchDeleted {
                branch: full,
                remote: true,
            });
        }

        Ok(result)
    }

    pub fn start_feature(&self, name: &str) -> Result<ExecutionResult> {
        self.start(BranchKind::Feature, name)
    }

    pub fn finish_feature(&self, name: &str) -> Result<ExecutionResult> {
        self.finish(BranchKind::Feature, name)
    }

    pub fn start_release(&self, version: &str) -> Result<ExecutionResult> {
        self.start(BranchKind::Release, version)
    }

    pub fn finish_release(&self, version: &str) -> Result<ExecutionResult> {
        self.finish(BranchKind::Release, version)
    }

    pub fn start_bugfix(&self, name: &str) -> Result<ExecutionResult> {
        self.start(BranchKind::Bugfix, name)
    }

    pub fn finish_bugfix(&self, name: &str) -> Result<ExecutionResult> {
        self.finish(BranchKind::Bugfix, name)
    }

    pub fn start_hotfix(&self, name: &str) -> Result<ExecutionResult> {
        self.start(BranchKind::Hotfix, name)
    }

    pub fn finish_hotfix(&self, name: &str) -> Result<ExecutionResult> {
        self.finish(BranchKind::Hotfix, name)
    }

    /// Check out an existing local branch and pull it from the remote.
    ///
    /// The pull is skipped when the remote has no such branch.
    pub fn switch_branch(&self, name: &str) -> Result<ExecutionResult> {
        let branch = validate_branch_name(name)?;
        self.require_local(&branch, "Branch")?;
        self.require_clean(&format!("switching to '{}'", branch))?;

        self.reporter
            .report(&Event::Operation(format!("Switching to '{}'", branch)));

        let remote = self.config.remote.as_str();
        let mut queue = CommandQueue::new();
        let mut result = ExecutionResult::default();
        queue.enqueue(GitCommand::checkout(&branch));
        if self.repo.branch_exists_remote(remote, &branch) {
            queue.enqueue(GitCommand::pull(remote, &branch));
        } else {
            self.reporter.report(&Event::Info(format!(
                "'{}' is not on remote '{}', skipping pull",
                branch, remote
            )));
        }
        self.flush(&mut queue, &mut result)?;

        self.reporter.report(&Event::Switched { branch });
        Ok(result)
    }

    /// Describe the checked out branch relative to its base branch.
    ///
    /// Working branches compare against the base of their kind; any other
    /// branch compares against develop.
    pub fn status(&self) -> Result<BranchStatus> {
        let branch = self.repo.current_branch()?;
        let kind = BranchKind::from_branch_name(self.config, &branch);

        let base = match &kind {
            Some((kind, _)) => kind.descriptor(self.config).based_on.resolve(self.config),
            None => self.config.develop_branch.as_str(),
        };

        let (compared_to, ahead_behind) =
            if base != branch && self.repo.branch_exists_local(base) {
                (
                    Some(base.to_string()),
                    Some(self.repo.ahead_behind(&branch, base)?),
                )
            } else {
                (None, None)
            };

        Ok(BranchStatus {
            clean: self.repo.is_working_tree_clean(),
            branch,
            kind,
            compared_to,
            ahead_behind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::report::RecordingReporter;

    fn repo() -> MockRepository {
        MockRepository::with_branches(&["main", "develop"])
    }

    #[test]
    fn test_start_queues_checkout_and_create() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let result = controller.start_feature("login").unwrap();

        assert_eq!(
            repo.commands(),
            vec!["git checkout develop", "git checkout -b feature/login develop"]
        );
        assert_eq!(result.commands.len(), 2);
        assert!(repo.remote_branches().is_empty());
    }

    #[test]
    fn test_start_twice_fails() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        controller.start_bugfix("x").unwrap();
        let before = repo.commands().len();
        let err = controller.start_bugfix("x").unwrap_err();

        assert!(matches!(err, LifecycleError::State(_)));
        assert!(err.to_string().contains("already exists"));
        assert_eq!(repo.commands().len(), before);
    }

    #[test]
    fn test_hotfix_starts_from_main() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        controller.start_hotfix("crash").unwrap();

        assert_eq!(
            repo.commands(),
            vec!["git checkout main", "git checkout -b hotfix/crash main"]
        );
    }

    #[test]
    fn test_start_rejects_dirty_tree() {
        let config = Config::default();
        let repo = repo();
        repo.set_dirty(true);
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let err = controller.start_feature("login").unwrap_err();

        assert!(matches!(err, LifecycleError::State(_)));
        assert!(repo.commands().is_empty());
    }

    #[test]
    fn test_start_rejects_invalid_name() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let err = controller.start_feature("my login").unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));

        let err = controller.start_release("1.2").unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert!(repo.commands().is_empty());
    }

    #[test]
    fn test_finish_without_commits_fails() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);
        controller.start_feature("login").unwrap();
        let before = repo.commands().len();

        let err = controller.finish_feature("login").unwrap_err();

        assert!(matches!(err, LifecycleError::State(_)));
        assert!(err.to_string().contains("no commits yet"));
        assert_eq!(repo.commands().len(), before);
    }

    #[test]
    fn test_finish_missing_branch_fails() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let err = controller.finish_hotfix("nothing").unwrap_err();
        assert!(matches!(err, LifecycleError::State(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_hotfix_no_commits_compares_against_main() {
        let config = Config::default();
        let repo = repo();
        repo.commit("develop");
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);
        controller.start_hotfix("crash").unwrap();

        // hotfix/crash equals main but differs from develop
        let err = controller.finish_hotfix("crash").unwrap_err();
        assert!(err.to_string().contains("same commit as 'main'"));
    }

    #[test]
    fn test_debug_mode_executes_nothing() {
        let config = Config {
            debug: true,
            ..Config::default()
        };
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let result = controller.start_feature("login").unwrap();

        assert!(result.dry_run);
        assert_eq!(result.commands.len(), 2);
        assert!(repo.commands().is_empty());
        assert!(!repo.branch_exists_local("feature/login"));
    }

    #[test]
    fn test_switch_pulls_only_when_remote_exists() {
        let config = Config::default();
        let repo = repo();
        repo.add_remote_branch("develop");
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        controller.switch_branch("develop").unwrap();
        controller.switch_branch("main").unwrap();

        assert_eq!(
            repo.commands(),
            vec![
                "git checkout develop",
                "git pull origin develop",
                "git checkout main"
            ]
        );
    }

    #[test]
    fn test_switch_rejects_missing_and_dirty() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let err = controller.switch_branch("nope").unwrap_err();
        assert!(matches!(err, LifecycleError::State(_)));

        repo.set_dirty(true);
        let err = controller.switch_branch("develop").unwrap_err();
        assert!(err.to_string().contains("uncommitted changes"));
        assert!(repo.commands().is_empty());
    }

    #[test]
    fn test_status_reports_ahead_behind_against_base() {
        let config = Config::default();
        let repo = repo();
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);
        controller.start_hotfix("crash").unwrap();
        repo.commit("hotfix/crash");
        repo.set_ahead_behind(
            "hotfix/crash",
            "main",
            AheadBehind {
                ahead: 1,
                behind: 0,
            },
        );

        let status = controller.status().unwrap();

        assert_eq!(status.branch, "hotfix/crash");
        assert_eq!(status.kind, Some((BranchKind::Hotfix, "crash".to_string())));
        assert_eq!(status.compared_to.as_deref(), Some("main"));
        assert_eq!(
            status.ahead_behind,
            Some(AheadBehind {
                ahead: 1,
                behind: 0
            })
        );
        assert!(status.clean);
    }

    #[test]
    fn test_status_on_develop_has_no_comparison() {
        let config = Config::default();
        let repo = MockRepository::with_branches(&["develop", "main"]);
        let reporter = RecordingReporter::new();
        let controller = LifecycleController::new(&config, &repo, &repo, &reporter);

        let status = controller.status().unwrap();
        assert_eq!(status.branch, "develop");
        assert!(status.kind.is_none());
        assert!(status.ahead_behind.is_none());
    }
}
