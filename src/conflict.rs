use crate::error::Result;
use crate::git::Repository;

/// Point-in-time check of the working tree for unresolved merge paths
///
/// Independent of the command queue: a merge that is still queued has not
/// touched the working tree yet, so checking right after enqueueing it only
/// sees the state before the merge.
pub struct ConflictDetector<'a> {
    repo: &'a dyn Repository,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        ConflictDetector { repo }
    }

    /// Unresolved paths, empty when there are none
    pub fn unresolved_paths(&self) -> Result<Vec<String>> {
        let paths = self.repo.unmerged_paths()?;
        if !paths.is_empty() {
            tracing::debug!(?paths, "unmerged paths in working tree");
        }
        Ok(paths)
    }

    pub fn has_conflicts(&self) -> Result<bool> {
        Ok(!self.unresolved_paths()?.is_empty())
    }
}
