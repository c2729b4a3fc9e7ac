//! Creating the workflow configuration, interactively or from defaults.

use crate::config::{Config, ConfigStore};
use crate::domain::{validate_branch_name, BranchKind};
use crate::error::{LifecycleError, Result};
use crate::git::Repository;
use crate::report::{Event, Reporter};
use crate::ui::Prompter;

/// Ask the user for every configuration value.
///
/// Text answers are validated as branch names and re-asked until valid; the
/// staging branch is only asked for when staging is enabled.
pub fn prompt_config(prompter: &dyn Prompter) -> Result<Config> {
    let defaults = Config::default();

    let main_branch = prompter.input(
        "Name of the production branch",
        &defaults.main_branch,
        &validate_branch_name,
    )?;
    let develop_branch = prompter.input(
        "Name of the development branch",
        &defaults.develop_branch,
        &validate_branch_name,
    )?;

    let use_staging = prompter.confirm("Use a staging branch?", defaults.use_staging)?;
    let staging_branch = if use_staging {
        Some(prompter.input(
            "Name of the staging branch",
            defaults.staging_branch.as_deref().unwrap_or("staging"),
            &validate_branch_name,
        )?)
    } else {
        defaults.staging_branch.clone()
    };

    let push_branches = prompter.confirm(
        "Push merged branches and delete finished branches on the remote?",
        defaults.push_branches,
    )?;
    let create_branches =
        prompter.confirm("Check for missing branches after setup?", defaults.create_branches)?;

    let mut prefixes = defaults.prefixes.clone();
    for kind in BranchKind::ALL {
        let answer = prompter.input(
            &format!("Prefix for {} branches", kind),
            defaults.prefixes.get(kind),
            &validate_branch_name,
        )?;
        *prefixes.get_mut(kind) = answer;
    }

    Ok(Config {
        main_branch,
        develop_branch,
        use_staging,
        staging_branch,
        push_branches,
        create_branches,
        debug: defaults.debug,
        remote: defaults.remote,
        prefixes,
    })
}

/// The `init` workflow.
///
/// With `assume_yes` the defaults are written without asking anything, even
/// over an existing file. Otherwise an existing file is only replaced after
/// confirmation.
///
/// # Returns
/// * `Ok(Some(Config))` - The configuration that was persisted
/// * `Ok(None)` - The user kept the existing configuration
pub fn run_init(
    store: &ConfigStore,
    prompter: &dyn Prompter,
    reporter: &dyn Reporter,
    assume_yes: bool,
    repo: Option<&dyn Repository>,
) -> Result<Option<Config>> {
    reporter.report(&Event::Operation("Initializing git-lifecycle".to_string()));

    let config = if assume_yes {
        Config::default()
    } else {
        if store.exists()
            && !prompter.confirm(
                &format!("{} already exists. Overwrite it?", store.path().display()),
                false,
            )?
        {
            reporter.report(&Event::Info("Keeping the existing configuration".to_string()));
            return Ok(None);
        }
        prompt_config(prompter)?
    };

    store.persist(&config)?;
    reporter.report(&Event::Info(format!(
        "Configuration written to {}",
        store.path().display()
    )));

    if config.create_branches {
        if let Some(repo) = repo {
            report_missing_branches(&config, repo, reporter);
        }
    }

    Ok(Some(config))
}

/// Advise how to create long-lived branches that do not exist yet
fn report_missing_branches(config: &Config, repo: &dyn Repository, reporter: &dyn Reporter) {
    for branch in config.long_lived_branches() {
        if branch == config.main_branch || repo.branch_exists_local(branch) {
            continue;
        }
        reporter.report(&Event::Warning(format!(
            "Branch '{}' does not exist yet; create it with: git branch {} {}",
            branch, branch, config.main_branch
        )));
    }

    if !repo.branch_exists_local(&config.main_branch) {
        reporter.report(&Event::Warning(format!(
            "Branch '{}' does not exist yet; commit to it before starting any workflow",
            config.main_branch
        )));
    }
}

/// Load the configuration, offering to create one when none exists.
///
/// Declining the offer is a configuration error.
pub fn load_or_init(
    store: &ConfigStore,
    prompter: &dyn Prompter,
    reporter: &dyn Reporter,
    repo: Option<&dyn Repository>,
) -> Result<Config> {
    if store.exists() {
        return store.load();
    }

    if prompter.confirm(
        "No git-lifecycle configuration found. Initialize it now?",
        true,
    )? {
        if let Some(config) = run_init(store, prompter, reporter, false, repo)? {
            return Ok(config);
        }
    }

    Err(LifecycleError::configuration(format!(
        "no configuration found at {} (run `git-lifecycle init`)",
        store.path().display()
    )))
}
