use crate::error::{LifecycleError, Result};
use crate::git::AheadBehind;
use git2::{BranchType, Cred, CredentialType, Direction, Oid, Repository as Git2Repo};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One way of authenticating against a remote
#[derive(Debug, Clone, PartialEq)]
enum Credential {
    KeyFile(PathBuf),
    Agent,
    Default,
}

impl Credential {
    fn allowed(&self, allowed: CredentialType) -> bool {
        match self {
            Credential::KeyFile(_) | Credential::Agent => allowed.contains(CredentialType::SSH_KEY),
            Credential::Default => allowed.contains(CredentialType::DEFAULT),
        }
    }

    fn to_cred(&self, username: &str) -> std::result::Result<Cred, git2::Error> {
        match self {
            Credential::KeyFile(path) => Cred::ssh_key(username, None, path, None),
            Credential::Agent => Cred::ssh_key_from_agent(username),
            Credential::Default => Cred::default(),
        }
    }
}

/// Hands out each credential once.
///
/// libgit2 calls the credentials callback again after every rejection, so
/// the picker running dry is what ends the authentication attempt.
struct CredentialPicker {
    remaining: std::vec::IntoIter<Credential>,
}

impl CredentialPicker {
    fn new(candidates: Vec<Credential>) -> Self {
        CredentialPicker {
            remaining: candidates.into_iter(),
        }
    }

    fn from_home() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let mut candidates: Vec<Credential> = ["id_ed25519", "id_rsa", "id_ecdsa"]
            .iter()
            .map(|key| Path::new(&home).join(".ssh").join(key))
            .filter(|path| path.exists())
            .map(Credential::KeyFile)
            .collect();
        candidates.push(Credential::Agent);
        candidates.push(Credential::Default);
        CredentialPicker::new(candidates)
    }

    fn next_allowed(&mut self, allowed: CredentialType) -> Option<Credential> {
        self.remaining.by_ref().find(|candidate| candidate.allowed(allowed))
    }
}

/// Branch queries backed by libgit2
///
/// The repository is reopened for every query so answers always reflect the
/// state left behind by the git binary executing queued commands.
pub struct Git2Repository {
    path: PathBuf,
}

impl Git2Repository {
    /// Discover the git repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref())
            .map_err(|e| LifecycleError::state(format!("Not in a git repository: {}", e.message())))?;

        let path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();

        Ok(Git2Repository { path })
    }

    /// Working directory of the repository
    pub fn workdir(&self) -> &Path {
        &self.path
    }

    fn repo(&self, operation: &str) -> Result<Git2Repo> {
        Git2Repo::open(&self.path).map_err(|e| LifecycleError::query(operation, e))
    }

    /// Credentials for talking to the remote: SSH keys from ~/.ssh, then the agent
    fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
        let mut picker = CredentialPicker::from_home();
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            let username = username_from_url.unwrap_or("git");
            while let Some(candidate) = picker.next_allowed(allowed_types) {
                if let Ok(cred) = candidate.to_cred(username) {
                    return Ok(cred);
                }
            }
            Err(git2::Error::from_str("no more credentials to try"))
        });
        callbacks
    }

    /// Ask the remote for its branch heads (the equivalent of `ls-remote --heads`)
    fn remote_heads(repo: &Git2Repo, remote_name: &str) -> std::result::Result<Vec<String>, git2::Error> {
        let mut remote = repo.find_remote(remote_name)?;
        let connection =
            remote.connect_auth(Direction::Fetch, Some(Self::remote_callbacks()), None)?;

        let heads = connection
            .list()?
            .iter()
            .filter_map(|head| head.name().strip_prefix("refs/heads/").map(String::from))
            .collect();

        Ok(heads)
    }
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let repo = self.repo("rev-parse --abbrev-ref HEAD")?;
        let head = repo
            .find_reference("HEAD")
            .map_err(|e| LifecycleError::query("rev-parse --abbrev-ref HEAD", e))?;

        head.symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(String::from)
            .ok_or_else(|| {
                LifecycleError::command("rev-parse --abbrev-ref HEAD", "HEAD is detached")
            })
    }

    fn branch_exists_local(&self, name: &str) -> bool {
        match Git2Repo::open(&self.path) {
            Ok(repo) => repo.find_branch(name, BranchType::Local).is_ok(),
            Err(_) => false,
        }
    }

    fn branch_exists_remote(&self, remote: &str, name: &str) -> bool {
        let repo = match Git2Repo::open(&self.path) {
            Ok(repo) => repo,
            Err(_) => return false,
        };

        match Self::remote_heads(&repo, remote) {
            Ok(heads) => heads.iter().any(|head| head == name),
            Err(e) => {
                // Offline or unauthenticated: fall back to the remote-tracking ref
                tracing::debug!(remote, error = %e.message(), "ls-remote failed, using tracking refs");
                repo.find_reference(&format!("refs/remotes/{}/{}", remote, name))
                    .is_ok()
            }
        }
    }

    fn branch_head(&self, name: &str) -> Result<Oid> {
        let operation = format!("rev-parse {}", name);
        let repo = self.repo(&operation)?;
        let branch = repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| LifecycleError::query(&operation, e))?;

        branch.get().target().ok_or_else(|| {
            LifecycleError::command(operation, format!("Branch '{}' has no target", name))
        })
    }

    fn ahead_behind(&self, branch: &str, other: &str) -> Result<AheadBehind> {
        let operation = format!("rev-list --left-right --count {}...{}", branch, other);
        let local = self.branch_head(branch)?;
        let upstream = self.branch_head(other)?;

        let repo = self.repo(&operation)?;
        let (ahead, behind) = repo
            .graph_ahead_behind(local, upstream)
            .map_err(|e| LifecycleError::query(&operation, e))?;

        Ok(AheadBehind { ahead, behind })
    }

    fn is_working_tree_clean(&self) -> bool {
        let repo = match Git2Repo::open(&self.path) {
            Ok(repo) => repo,
            Err(_) => return false,
        };

        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let clean = match repo.statuses(Some(&mut opts)) {
            Ok(statuses) => statuses.iter().all(|entry| {
                let status = entry.status();
                status.is_empty() || status.is_ignored() || status.is_wt_new()
            }),
            Err(_) => false,
        };
        clean
    }

    fn unmerged_paths(&self) -> Result<Vec<String>> {
        let operation = "diff --name-only --diff-filter=U";
        let repo = self.repo(operation)?;
        let index = repo
            .index()
            .map_err(|e| LifecycleError::query(operation, e))?;

        if !index.has_conflicts() {
            return Ok(Vec::new());
        }

        let mut paths = BTreeSet::new();
        for conflict in index
            .conflicts()
            .map_err(|e| LifecycleError::query(operation, e))?
        {
            let conflict = conflict.map_err(|e| LifecycleError::query(operation, e))?;
            if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                paths.insert(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }

        Ok(paths.into_iter().collect())
    }
}
