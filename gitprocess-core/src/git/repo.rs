//! Git repository cloning and opening

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository};
use tracing::{debug, info};

use crate::{Error, Result};

/// A git repository wrapper providing gitprocess-specific operations
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Path to the repository root
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// This will search upward from the given path to find the repository root.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Git(format!("Not a git repository: {}", path.display()))
            } else {
                Error::Git(e.message().to_string())
            }
        })?;

        Self::from_repository(repo)
    }

    /// Clone `url` into `dest`
    ///
    /// Authentication is delegated to the user's git setup: the SSH agent for
    /// SSH remotes and the configured credential helper for HTTPS remotes.
    pub fn clone_from_url(url: &str, dest: impl AsRef<Path>) -> Result<Self> {
        let dest = dest.as_ref();
        debug!(url, dest = %dest.display(), "Cloning repository");

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(credential_callbacks());

        let repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, dest)
            .map_err(|e| Error::Git(format!("Failed to clone {}: {}", url, e.message())))?;

        info!(url, dest = %dest.display(), "Cloned repository");
        Self::from_repository(repo)
    }

    fn from_repository(repo: Repository) -> Result<Self> {
        let root = repo
            .workdir()
            .ok_or_else(|| Error::Git("Bare repositories are not supported".to_string()))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the current branch name, `None` on a detached or unborn HEAD
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(Error::Git(format!("Failed to get HEAD: {}", e.message()))),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            Ok(None)
        }
    }

    /// Get access to the underlying git2 repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }
}

fn credential_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempted = false;

    callbacks.credentials(move |url, username, allowed| {
        credentials(&mut attempted, url, username, allowed)
    });

    callbacks
}

/// Pick the credential to offer for one libgit2 request
///
/// libgit2 keeps calling back while credentials are rejected, so only one
/// real credential is offered. Username requests, sent for SSH URLs without
/// a user before the key is asked for, do not count as that attempt.
fn credentials(
    attempted: &mut bool,
    url: &str,
    username: Option<&str>,
    allowed: CredentialType,
) -> std::result::Result<Cred, git2::Error> {
    if allowed.contains(CredentialType::USERNAME) {
        return Cred::username(username.unwrap_or("git"));
    }

    if *attempted {
        return Err(git2::Error::from_str("authentication failed"));
    }
    *attempted = true;

    if allowed.contains(CredentialType::SSH_KEY) {
        return Cred::ssh_key_from_agent(username.unwrap_or("git"));
    }

    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        let config = git2::Config::open_default()?;
        return Cred::credential_helper(&config, url, username);
    }

    Cred::default()
}
