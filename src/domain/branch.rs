use std::fmt;

use crate::config::Config;

/// Kind of short-lived working branch managed by the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Feature,
    Release,
    Bugfix,
    Hotfix,
}

/// One of the configured long-lived branches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseBranch {
    Main,
    Develop,
    Staging,
}

impl BaseBranch {
    /// Resolve to the configured branch name
    pub fn resolve<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            BaseBranch::Main => &config.main_branch,
            BaseBranch::Develop => &config.develop_branch,
            BaseBranch::Staging => config
                .staging_branch
                .as_deref()
                .unwrap_or(&config.develop_branch),
        }
    }
}

/// Everything that differs between the branch kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Branch new working branches are created from
    pub based_on: BaseBranch,
    /// Finish merges into these, in this exact order
    pub merge_targets: Vec<BaseBranch>,
    /// Create an annotated `v<version>` tag after merging into main
    pub tag_on_main: bool,
}

impl BranchKind {
    pub const ALL: [BranchKind; 4] = [
        BranchKind::Feature,
        BranchKind::Release,
        BranchKind::Bugfix,
        BranchKind::Hotfix,
    ];

    /// Get the kind name as used in the CLI and config file
    pub fn name(&self) -> &'static str {
        match self {
            BranchKind::Feature => "feature",
            BranchKind::Release => "release",
            BranchKind::Bugfix => "bugfix",
            BranchKind::Hotfix => "hotfix",
        }
    }

    /// Describe the lifecycle of this kind for the given config.
    ///
    /// Staging is appended as the last merge target only when the config
    /// enables it.
    pub fn descriptor(&self, config: &Config) -> KindDescriptor {
        let (based_on, mut merge_targets, tag_on_main) = match self {
            BranchKind::Feature | BranchKind::Bugfix => {
                (BaseBranch::Develop, vec![BaseBranch::Develop], false)
            }
            BranchKind::Release => (
                BaseBranch::Develop,
                vec![BaseBranch::Main, BaseBranch::Develop],
                true,
            ),
            BranchKind::Hotfix => (
                BaseBranch::Main,
                vec![BaseBranch::Main, BaseBranch::Develop],
                false,
            ),
        };

        if config.use_staging {
            merge_targets.push(BaseBranch::Staging);
        }

        KindDescriptor {
            based_on,
            merge_targets,
            tag_on_main,
        }
    }

    /// Full branch name: configured prefix followed by the short name
    pub fn full_name(&self, config: &Config, short_name: &str) -> String {
        format!("{}{}", config.prefixes.get(*self), short_name)
    }

    /// Recognize which kind a full branch name belongs to.
    ///
    /// When prefixes overlap the longest one wins.
    pub fn from_branch_name(config: &Config, branch: &str) -> Option<(BranchKind, String)> {
        BranchKind::ALL
            .iter()
            .map(|kind| (*kind, config.prefixes.get(*kind)))
            .filter(|(_, prefix)| !prefix.is_empty() && branch.starts_with(prefix))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(kind, prefix)| (kind, branch[prefix.len()..].to_string()))
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
