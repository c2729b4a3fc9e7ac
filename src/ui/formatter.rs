//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Functions here have no side effects beyond printing.

use console::style;

use crate::config::Config;
use crate::lifecycle::BranchStatus;
use crate::report::{Event, Reporter};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a warning with yellow icon.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Print a git command in cyan, indented.
pub fn display_command(command: &str, dry_run: bool) {
    if dry_run {
        println!("  {} {}", style("[dry run]").dim(), style(command).cyan());
    } else {
        println!("  {}", style(command).cyan());
    }
}

/// Draws `title` inside a box.
///
/// ```text
/// ┌──────────────────┐
/// │ Starting feature │
/// └──────────────────┘
/// ```
pub fn banner(title: &str) -> String {
    let width = console::measure_text_width(title) + 2;
    let line = "─".repeat(width);
    format!("┌{}┐\n│ {} │\n└{}┘", line, title, line)
}

/// Print a bold bordered banner.
pub fn display_banner(title: &str) {
    println!("\n{}", style(banner(title)).bold());
}

/// Display the effective configuration.
pub fn display_config(config: &Config) {
    println!("{}", style("Configuration:").bold());
    println!("  main:     {}", config.main_branch);
    println!("  develop:  {}", config.develop_branch);
    match config.staging() {
        Some(staging) => println!("  staging:  {}", staging),
        None => println!("  staging:  {}", style("disabled").dim()),
    }
    println!("  remote:   {}", config.remote);
    println!("  push:     {}", config.push_branches);
    println!("  debug:    {}", config.debug);
    println!(
        "  prefixes: feature={} release={} bugfix={} hotfix={}",
        config.prefixes.feature,
        config.prefixes.release,
        config.prefixes.bugfix,
        config.prefixes.hotfix
    );
}

/// Display the status of the checked out branch.
pub fn display_branch_status(status: &BranchStatus) {
    println!("{} {}", style("On branch").bold(), style(&status.branch).green());

    if let Some((kind, name)) = &status.kind {
        println!("  {} branch '{}'", kind, name);
    }

    if status.clean {
        println!("  working tree clean");
    } else {
        println!("  {}", style("working tree has uncommitted changes").yellow());
    }

    if let (Some(base), Some(counts)) = (&status.compared_to, &status.ahead_behind) {
        println!(
            "  {} ahead, {} behind '{}'",
            counts.ahead, counts.behind, base
        );
    }
}

/// Reporter that renders events on the terminal
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: &Event) {
        match event {
            Event::Operation(title) => display_banner(title),
            Event::Executed(command) => display_command(command, false),
            Event::DryRun(command) => display_command(command, true),
            Event::ConflictsFound { .. } | Event::Warning(_) => {
                display_warning(&event.to_string())
            }
            Event::Info(message) => display_status(message),
            _ => display_success(&event.to_string()),
        }
    }
}
