use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use git_lifecycle::config::ConfigStore;
use git_lifecycle::domain::BranchKind;
use git_lifecycle::git::{Git2Repository, Repository, SystemGit};
use git_lifecycle::queue::ExecutionResult;
use git_lifecycle::ui::{self, ConsoleReporter, TerminalPrompter};
use git_lifecycle::{init, LifecycleController, LifecycleError};

#[derive(Parser)]
#[command(
    name = "git-lifecycle",
    version,
    about = "Start and finish feature, release, bugfix and hotfix branches"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Print the git commands instead of running them"
    )]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration file
    Init {
        #[arg(short, long, help = "Write the defaults without asking")]
        yes: bool,
    },
    /// Create a feature branch from develop
    #[command(name = "feature:start")]
    FeatureStart {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Merge a feature branch into develop and delete it
    #[command(name = "feature:finish")]
    FeatureFinish {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Create a release branch from develop
    #[command(name = "release:start")]
    ReleaseStart {
        #[arg(required = true, num_args = 1..)]
        version: Vec<String>,
    },
    /// Merge a release into main (tagged) and develop, then delete it
    #[command(name = "release:finish")]
    ReleaseFinish {
        #[arg(required = true, num_args = 1..)]
        version: Vec<String>,
    },
    /// Create a bugfix branch from develop
    #[command(name = "bugfix:start")]
    BugfixStart {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Merge a bugfix branch into develop and delete it
    #[command(name = "bugfix:finish")]
    BugfixFinish {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Create a hotfix branch from main
    #[command(name = "hotfix:start")]
    HotfixStart {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Merge a hotfix into main and develop, then delete it
    #[command(name = "hotfix:finish")]
    HotfixFinish {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Check out a local branch and pull it
    Switch {
        #[arg(required = true, num_args = 1..)]
        branch: Vec<String>,
    },
    /// Show the checked out branch relative to its base branch
    Status,
}

/// Words the shell split apart are joined back so validation can reject the space
fn joined(words: &[String]) -> String {
    words.join(" ")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GIT_LIFECYCLE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(args) {
        report_failure(&e);
        std::process::exit(1);
    }
}

/// The only place an error turns into output and an exit status
fn report_failure(err: &anyhow::Error) {
    ui::display_error(&format!("{:#}", err));

    match err.downcast_ref::<LifecycleError>() {
        Some(LifecycleError::CommandExecution {
            last_success: Some(step),
            ..
        }) => {
            ui::display_status(&format!("Last successful step: {}", step));
            ui::display_status("Earlier steps were applied; continue manually with git");
        }
        Some(LifecycleError::MergeConflict { .. }) => {
            ui::display_status(
                "Earlier merge targets were already updated; resolve, commit, and rerun the finish command",
            );
        }
        _ => {}
    }
}

fn run(args: Args) -> Result<()> {
    let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
    let store = match &args.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::in_dir(&cwd),
    };
    let reporter = ConsoleReporter;
    let prompter = TerminalPrompter;
    let repo = Git2Repository::open(&cwd);

    if let Commands::Init { yes } = args.command {
        let repo = repo.as_ref().ok().map(|r| r as &dyn Repository);
        if let Some(config) = init::run_init(&store, &prompter, &reporter, yes, repo)? {
            ui::display_config(&config);
        }
        return Ok(());
    }

    let repo = repo?;
    let config = init::load_or_init(&store, &prompter, &reporter, Some(&repo as &dyn Repository))
        .with_context(|| format!("Cannot load {}", store.path().display()))?;
    let git = SystemGit::new(repo.workdir());
    let controller =
        LifecycleController::new(&config, &repo, &git, &reporter).with_dry_run(args.dry_run);

    let result: ExecutionResult = match &args.command {
        Commands::Init { .. } => return Ok(()),
        Commands::FeatureStart { name } => controller.start(BranchKind::Feature, &joined(name))?,
        Commands::FeatureFinish { name } => controller.finish(BranchKind::Feature, &joined(name))?,
        Commands::ReleaseStart { version } => {
            controller.start(BranchKind::Release, &joined(version))?
        }
        Commands::ReleaseFinish { version } => {
            controller.finish(BranchKind::Release, &joined(version))?
        }
        Commands::BugfixStart { name } => controller.start(BranchKind::Bugfix, &joined(name))?,
        Commands::BugfixFinish { name } => controller.finish(BranchKind::Bugfix, &joined(name))?,
        Commands::HotfixStart { name } => controller.start(BranchKind::Hotfix, &joined(name))?,
        Commands::HotfixFinish { name } => controller.finish(BranchKind::Hotfix, &joined(name))?,
        Commands::Switch { branch } => controller.switch_branch(&joined(branch))?,
        Commands::Status => {
            ui::display_branch_status(&controller.status()?);
            return Ok(());
        }
    };

    if result.dry_run {
        ui::display_status(&format!(
            "Dry run: {} command(s) printed, nothing executed",
            result.commands.len()
        ));
    } else {
        ui::display_success("Done");
    }

    Ok(())
}
