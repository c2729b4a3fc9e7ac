// tests/integration_test.rs
//
// Runs the workflows against real repositories with the git binary.
use git2::Signature;
use git_lifecycle::config::Config;
use git_lifecycle::git::{Git2Repository, GitExecutor, Repository, SystemGit};
use git_lifecycle::report::RecordingReporter;
use git_lifecycle::{LifecycleController, LifecycleError};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Repository with one commit on `main` and a `develop` branch at the same commit
fn init_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test Author").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    repo.set_head("refs/heads/main").unwrap();

    fs::write(dir.path().join("README.md"), "hello\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test Author", "test@example.com").unwrap();
    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
        .unwrap();

    let commit = repo.find_commit(oid).unwrap();
    repo.branch("develop", &commit, false).unwrap();
    dir
}

fn git(dir: &Path, args: &[&str]) {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let output = SystemGit::new(dir).run(&args).unwrap();
    assert!(output.success(), "git {:?} failed: {}", args, output.stderr);
}

fn commit_file(dir: &Path, file: &str, content: &str) {
    fs::write(dir.join(file), content).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "-m", &format!("update {}", file)]);
}

fn local_config() -> Config {
    Config {
        push_branches: false,
        ..Config::default()
    }
}

#[test]
fn test_feature_lifecycle_on_real_repository() {
    let dir = init_repo();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let git = SystemGit::new(dir.path());
    let config = local_config();
    let reporter = RecordingReporter::new();
    let controller = LifecycleController::new(&config, &repo, &git, &reporter);

    controller.start_feature("login").unwrap();
    assert_eq!(repo.current_branch().unwrap(), "feature/login");
    assert!(repo.hashes_equal("feature/login", "develop").unwrap());

    let err = controller.finish_feature("login").unwrap_err();
    assert!(matches!(err, LifecycleError::State(_)));

    commit_file(dir.path(), "login.txt", "login\n");
    controller.finish_feature("login").unwrap();

    assert!(!repo.branch_exists_local("feature/login"));
    assert_eq!(repo.current_branch().unwrap(), "develop");

    let raw = git2::Repository::open(dir.path()).unwrap();
    let head = raw.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.parent_count(), 2, "merge must not fast-forward");
    assert!(dir.path().join("login.txt").exists());
}

#[test]
fn test_release_lifecycle_tags_main() {
    let dir = init_repo();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let git = SystemGit::new(dir.path());
    let config = local_config();
    let reporter = RecordingReporter::new();
    let controller = LifecycleController::new(&config, &repo, &git, &reporter);

    controller.start_release("1.0.0").unwrap();
    commit_file(dir.path(), "CHANGELOG.md", "1.0.0\n");
    controller.finish_release("1.0.0").unwrap();

    let raw = git2::Repository::open(dir.path()).unwrap();
    let tag = raw.find_reference("refs/tags/v1.0.0").unwrap();
    let tagged = tag.peel_to_commit().unwrap().id();
    assert_eq!(tagged, repo.branch_head("main").unwrap());
    assert!(raw.find_tag(tag.target().unwrap()).is_ok(), "tag must be annotated");
    assert_eq!(repo.current_branch().unwrap(), "develop");
    assert!(dir.path().join("CHANGELOG.md").exists(), "develop contains the release");
    assert!(!repo.branch_exists_local("release/1.0.0"));
}

#[test]
fn test_queries_on_real_repository() {
    let dir = init_repo();
    let repo = Git2Repository::open(dir.path()).unwrap();

    assert_eq!(repo.current_branch().unwrap(), "main");
    assert!(repo.branch_exists_local("develop"));
    assert!(!repo.branch_exists_local("feature/none"));
    assert!(!repo.branch_exists_remote("origin", "develop"));
    assert!(repo.is_working_tree_clean());

    commit_file(dir.path(), "a.txt", "a\n");
    let counts = repo.ahead_behind("main", "develop").unwrap();
    assert_eq!((counts.ahead, counts.behind), (1, 0));

    fs::write(dir.path().join("untracked.txt"), "x\n").unwrap();
    assert!(repo.is_working_tree_clean(), "untracked files do not count");
    fs::write(dir.path().join("a.txt"), "changed\n").unwrap();
    assert!(!repo.is_working_tree_clean());

    assert!(matches!(
        repo.branch_head("missing"),
        Err(LifecycleError::CommandExecution { .. })
    ));
}

#[test]
fn test_unmerged_paths_after_conflicting_merge() {
    let dir = init_repo();
    let repo = Git2Repository::open(dir.path()).unwrap();

    commit_file(dir.path(), "README.md", "main side\n");
    git(dir.path(), &["checkout", "develop"]);
    commit_file(dir.path(), "README.md", "develop side\n");

    let output = SystemGit::new(dir.path())
        .run(&["merge".to_string(), "main".to_string()])
        .unwrap();
    assert!(!output.success());

    assert_eq!(repo.unmerged_paths().unwrap(), vec!["README.md"]);
}

#[test]
fn test_switch_checks_out_local_branch() {
    let dir = init_repo();
    let repo = Git2Repository::open(dir.path()).unwrap();
    let git = SystemGit::new(dir.path());
    let config = local_config();
    let reporter = RecordingReporter::new();
    let controller = LifecycleController::new(&config, &repo, &git, &reporter);

    controller.switch_branch("develop").unwrap();

    assert_eq!(repo.current_branch().unwrap(), "develop");
}

#[test]
fn test_cli_init_and_validation_exit_codes() {
    let dir = init_repo();
    let bin = env!("CARGO_BIN_EXE_git-lifecycle");

    let init = Command::new(bin)
        .args(["init", "--yes"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(init.status.success());
    assert!(dir.path().join("gitlifecycle.json").exists());

    let bad = Command::new(bin)
        .args(["feature:start", "my", "login"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(bad.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&bad.stderr).contains("single word"));

    let dry = Command::new(bin)
        .args(["--dry-run", "feature:start", "login"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(dry.status.success());
    assert!(String::from_utf8_lossy(&dry.stdout).contains("git checkout -b feature/login develop"));
    let repo = Git2Repository::open(dir.path()).unwrap();
    assert!(!repo.branch_exists_local("feature/login"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_git-lifecycle"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("feature:start"));
    assert!(stdout.contains("release:finish"));
}
