use std::sync::OnceLock;

use regex::Regex;

use crate::error::{LifecycleError, Result};

fn branch_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-_./]+$").expect("valid branch name pattern"))
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)$").expect("valid version pattern")
    })
}

/// Rejects input the shell would have split into several words.
fn single_token<'a>(input: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::validation(format!("{} must not be empty", what)));
    }
    if trimmed.split_whitespace().nth(1).is_some() {
        return Err(LifecycleError::validation(format!(
            "{} '{}' must be a single word without spaces",
            what, trimmed
        )));
    }
    Ok(trimmed)
}

/// Validates a branch name (or branch-name fragment such as a prefix).
///
/// Only `[A-Za-z0-9-_./]` is accepted. Returns the normalized name with
/// surrounding whitespace removed.
///
/// # Examples
///
/// ```
/// use git_lifecycle::domain::validate_branch_name;
///
/// assert_eq!(validate_branch_name("login").unwrap(), "login");
/// assert!(validate_branch_name("two words").is_err());
/// assert!(validate_branch_name("bad:name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<String> {
    let name = single_token(name, "Branch name")?;

    if !branch_name_regex().is_match(name) {
        let invalid: String = name
            .chars()
            .filter(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
            .collect();
        return Err(LifecycleError::validation(format!(
            "Branch name '{}' contains invalid characters '{}' (allowed: A-Z a-z 0-9 - _ . /)",
            name, invalid
        )));
    }

    Ok(name.to_string())
}

/// Validates a strict `MAJOR.MINOR.PATCH` version.
///
/// Leading zeros, pre-release and build metadata are all rejected.
///
/// # Examples
///
/// ```
/// use git_lifecycle::domain::validate_version;
///
/// assert_eq!(validate_version("1.2.3").unwrap().to_string(), "1.2.3");
/// assert!(validate_version("1.2").is_err());
/// assert!(validate_version("1.2.3-rc1").is_err());
/// ```
pub fn validate_version(version: &str) -> Result<semver::Version> {
    let version = single_token(version, "Version")?;

    if !version_regex().is_match(version) {
        return Err(LifecycleError::validation(format!(
            "Version '{}' is not a valid semantic version (expected MAJOR.MINOR.PATCH, e.g. 1.4.0)",
            version
        )));
    }

    semver::Version::parse(version)
        .map_err(|e| LifecycleError::validation(format!("Version '{}': {}", version, e)))
}
