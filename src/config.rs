use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{validate_branch_name, BranchKind};
use crate::error::{LifecycleError, Result};

/// File name of the persisted configuration, relative to the invocation directory
pub const CONFIG_FILE_NAME: &str = "gitlifecycle.json";

/// Represents the complete workflow configuration.
///
/// Loaded once per invocation and never mutated by lifecycle operations.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub main_branch: String,

    pub develop_branch: String,

    pub use_staging: bool,

    /// Required (and validated) only when `use_staging` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_branch: Option<String>,

    /// Push merge targets and delete finished branches on the remote too
    pub push_branches: bool,

    /// Advisory: remind the user to create missing long-lived branches after init
    pub create_branches: bool,

    /// Print queued commands instead of executing them
    pub debug: bool,

    #[serde(default = "default_remote")]
    pub remote: String,

    pub prefixes: Prefixes,
}

/// Branch name prefix per branch kind
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Prefixes {
    pub feature: String,
    pub release: String,
    pub bugfix: String,
    pub hotfix: String,
}

impl Prefixes {
    /// Prefix configured for a kind
    pub fn get(&self, kind: BranchKind) -> &str {
        match kind {
            BranchKind::Feature => &self.feature,
            BranchKind::Release => &self.release,
            BranchKind::Bugfix => &self.bugfix,
            BranchKind::Hotfix => &self.hotfix,
        }
    }

    /// Mutable access to the prefix of a kind
    pub fn get_mut(&mut self, kind: BranchKind) -> &mut String {
        match kind {
            BranchKind::Feature => &mut self.feature,
            BranchKind::Release => &mut self.release,
            BranchKind::Bugfix => &mut self.bugfix,
            BranchKind::Hotfix => &mut self.hotfix,
        }
    }
}

impl Default for Prefixes {
    fn default() -> Self {
        Prefixes {
            feature: "feature/".to_string(),
            release: "release/".to_string(),
            bugfix: "bugfix/".to_string(),
            hotfix: "hotfix/".to_string(),
        }
    }
}

/// Returns the default remote name.
fn default_remote() -> String {
    "origin".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            main_branch: "main".to_string(),
            develop_branch: "develop".to_string(),
            use_staging: false,
            staging_branch: Some("staging".to_string()),
            push_branches: true,
            create_branches: false,
            debug: false,
            remote: default_remote(),
            prefixes: Prefixes::default(),
        }
    }
}

impl Config {
    /// Staging branch name when staging is enabled
    pub fn staging(&self) -> Option<&str> {
        if self.use_staging {
            self.staging_branch.as_deref()
        } else {
            None
        }
    }

    /// Long-lived branches this config relies on, in main/develop/staging order
    pub fn long_lived_branches(&self) -> Vec<&str> {
        let mut branches = vec![self.main_branch.as_str(), self.develop_branch.as_str()];
        branches.extend(self.staging());
        branches
    }
}

const REQUIRED_STRINGS: [&str; 2] = ["mainBranch", "developBranch"];
const BOOLEAN_FIELDS: [&str; 4] = ["useStaging", "pushBranches", "createBranches", "debug"];

/// Validates semantic rules of a typed configuration.
///
/// Checks every named branch and prefix with the branch-name validator and
/// requires `stagingBranch` when `useStaging` is set.
pub fn validate(config: &Config) -> Result<()> {
    check_name("mainBranch", &config.main_branch)?;
    check_name("developBranch", &config.develop_branch)?;

    if config.use_staging {
        match config.staging_branch.as_deref() {
            Some(staging) if !staging.trim().is_empty() => check_name("stagingBranch", staging)?,
            _ => {
                return Err(LifecycleError::configuration(
                    "stagingBranch is required when useStaging is true",
                ))
            }
        }
    }

    check_name("remote", &config.remote)?;

    for kind in BranchKind::ALL {
        let prefix = config.prefixes.get(kind);
        if prefix.trim().is_empty() {
            return Err(LifecycleError::configuration(format!(
                "prefixes.{} is required",
                kind
            )));
        }
        check_name(&format!("prefixes.{}", kind), prefix)?;
    }

    Ok(())
}

fn check_name(field: &str, value: &str) -> Result<()> {
    validate_branch_name(value)
        .map(|_| ())
        .map_err(|e| LifecycleError::configuration(format!("{}: {}", field, e)))
}

/// Structural checks on the raw merged JSON, before it is typed.
///
/// Catches missing required fields and wrongly typed booleans with a message
/// naming the field rather than a generic deserialization error.
fn validate_value(value: &Value) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| LifecycleError::configuration("configuration must be a JSON object"))?;

    for field in REQUIRED_STRINGS {
        match object.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(LifecycleError::configuration(format!(
                    "{} is required",
                    field
                )))
            }
            Some(_) => {
                return Err(LifecycleError::configuration(format!(
                    "{} must be a string",
                    field
                )))
            }
        }
    }

    for field in BOOLEAN_FIELDS {
        if let Some(v) = object.get(field) {
            if !v.is_boolean() {
                return Err(LifecycleError::configuration(format!(
                    "{} must be a boolean",
                    field
                )));
            }
        }
    }

    for field in ["stagingBranch", "remote"] {
        if let Some(v) = object.get(field) {
            if !(v.is_string() || v.is_null()) {
                return Err(LifecycleError::configuration(format!(
                    "{} must be a string",
                    field
                )));
            }
        }
    }

    let prefixes = match object.get("prefixes") {
        Some(Value::Object(p)) => p,
        Some(Value::Null) | None => {
            return Err(LifecycleError::configuration("prefixes is required"))
        }
        Some(_) => {
            return Err(LifecycleError::configuration(
                "prefixes must be an object",
            ))
        }
    };

    for kind in BranchKind::ALL {
        match prefixes.get(kind.name()) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(LifecycleError::configuration(format!(
                    "prefixes.{} is required",
                    kind
                )))
            }
            Some(_) => {
                return Err(LifecycleError::configuration(format!(
                    "prefixes.{} must be a string",
                    kind
                )))
            }
        }
    }

    Ok(())
}

/// Shallow merge: top-level keys of `persisted` replace the defaults,
/// nested objects are not merged.
fn merge_with_defaults(persisted: Value) -> Result<Value> {
    let mut merged: Map<String, Value> = match serde_json::to_value(Config::default())? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    match persisted {
        Value::Object(map) => {
            for (key, value) in map {
                merged.insert(key, value);
            }
            Ok(Value::Object(merged))
        }
        _ => Err(LifecycleError::configuration(
            "configuration must be a JSON object",
        )),
    }
}

/// Parses configuration text, merging it over the defaults and validating it
pub fn parse_config(text: &str) -> Result<Config> {
    let persisted: Value = serde_json::from_str(text)?;
    let merged = merge_with_defaults(persisted)?;
    validate_value(&merged)?;

    let config: Config = serde_json::from_value(merged)
        .map_err(|e| LifecycleError::configuration(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Location of the persisted configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    /// Store at the standard file name inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        ConfigStore::new(dir.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads and validates the persisted configuration.
    ///
    /// # Returns
    /// * `Ok(Config)` - Persisted values merged over the defaults
    /// * `Err(Configuration)` - If the file is missing or invalid
    pub fn load(&self) -> Result<Config> {
        if !self.exists() {
            return Err(LifecycleError::configuration(format!(
                "no configuration found at {} (run `git-lifecycle init`)",
                self.path.display()
            )));
        }

        let text = fs::read_to_string(&self.path)?;
        tracing::debug!(path = %self.path.display(), "loading configuration");
        parse_config(&text)
    }

    /// Validates and writes the configuration as pretty-printed JSON
    pub fn persist(&self, config: &Config) -> Result<()> {
        validate(config)?;
        let mut text = serde_json::to_string_pretty(config)?;
        text.push('\n');
        fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), "configuration written");
        Ok(())
    }
}
