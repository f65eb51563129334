//! Branch checkout, creation and merge-status scanning

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, Oid};
use tracing::{debug, info, warn};

use super::repo::GitRepo;
use crate::{Error, Result};

/// Branch names never reported as unmerged
const LONG_LIVED_BRANCHES: [&str; 2] = ["main", "master"];

/// A branch the unmerged scan could not evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBranch {
    /// Short branch name
    pub name: String,
    /// Why the branch could not be checked
    pub reason: String,
}

/// Result of scanning local branches against the baseline
#[derive(Debug, Clone, Default)]
pub struct BranchScan {
    /// Branches with commits not reachable from the baseline
    pub unmerged: Vec<String>,
    /// Branches whose commit or ancestry could not be resolved
    pub skipped: Vec<SkippedBranch>,
}

/// Whether a branch is left out of the unmerged scan
pub fn is_excluded(name: &str, baseline: &str) -> bool {
    name == baseline || LONG_LIVED_BRANCHES.contains(&name)
}

/// A branch is unmerged when its commit is neither the baseline commit nor
/// one of its ancestors
pub fn is_unmerged(commit: Oid, baseline: Oid, is_ancestor: bool) -> bool {
    !is_ancestor && commit != baseline
}

impl GitRepo {
    /// Check out `branch` as a local branch tracking `remote/branch`
    ///
    /// The local branch is created at the remote commit when missing. If it
    /// cannot be created (typically because it already exists) the existing
    /// local branch is checked out instead.
    pub fn checkout_tracking(&self, remote: &str, branch: &str) -> Result<()> {
        let repo = self.inner();
        let remote_ref = format!("refs/remotes/{}/{}", remote, branch);

        let commit = repo
            .find_reference(&remote_ref)
            .and_then(|r| r.peel_to_commit())
            .map_err(|_| {
                Error::Git(format!(
                    "Branch '{}' not found on remote '{}'",
                    branch, remote
                ))
            })?;

        match repo.branch(branch, &commit, false) {
            Ok(mut local) => {
                let upstream = format!("{}/{}", remote, branch);
                if let Err(e) = local.set_upstream(Some(&upstream)) {
                    warn!(branch, upstream = %upstream, "Failed to set upstream: {}", e.message());
                }
                info!(branch, commit = %commit.id(), "Created local branch from {}", upstream);
            }
            Err(e) => {
                debug!(branch, "Local branch not created ({}), checking out existing", e.message());
            }
        }

        self.checkout_local(branch)
    }

    /// Check out an existing local branch
    pub fn checkout_local(&self, branch: &str) -> Result<()> {
        let repo = self.inner();

        let local = repo.find_branch(branch, BranchType::Local).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::Git(format!("Branch '{}' not found", branch))
            } else {
                Error::Git(format!("Failed to find branch '{}': {}", branch, e.message()))
            }
        })?;

        let ref_name = local
            .get()
            .name()
            .ok_or_else(|| Error::Git(format!("Branch '{}' has a non UTF-8 name", branch)))?
            .to_string();

        let target = local
            .get()
            .peel_to_commit()
            .map_err(|e| Error::Git(format!("Failed to resolve {}: {}", branch, e.message())))?;

        repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| Error::Git(format!("Failed to check out {}: {}", branch, e.message())))?;

        repo.set_head(&ref_name)
            .map_err(|e| Error::Git(format!("Failed to update HEAD: {}", e.message())))?;

        debug!(branch, "Checked out branch");
        Ok(())
    }

    /// Create `branch` at the current HEAD commit and check it out
    ///
    /// Returns the commit the new branch points at.
    pub fn create_branch(&self, branch: &str) -> Result<Oid> {
        let repo = self.inner();

        let head = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| Error::Git(format!("Failed to resolve HEAD: {}", e.message())))?;

        repo.branch(branch, &head, false).map_err(|e| {
            if e.code() == ErrorCode::Exists {
                Error::Git(format!("Branch '{}' already exists", branch))
            } else {
                Error::Git(format!("Failed to create branch '{}': {}", branch, e.message()))
            }
        })?;

        self.checkout_local(branch)?;

        info!(branch, commit = %head.id(), "Created branch");
        Ok(head.id())
    }

    /// List all local branches
    pub fn list_local_branches(&self) -> Result<Vec<String>> {
        let mut branches = Vec::new();

        for branch in self
            .inner()
            .branches(Some(BranchType::Local))
            .map_err(|e| Error::Git(format!("Failed to list branches: {}", e.message())))?
        {
            let (branch, _) =
                branch.map_err(|e| Error::Git(format!("Failed to read branch: {}", e.message())))?;
            if let Some(name) = branch.name().ok().flatten() {
                branches.push(name.to_string());
            }
        }

        Ok(branches)
    }

    /// Resolve a local branch to the commit it points at
    pub fn resolve_commit(&self, branch: &str) -> Result<Oid> {
        let commit = self
            .inner()
            .find_branch(branch, BranchType::Local)
            .and_then(|b| b.get().peel_to_commit())
            .map_err(|e| Error::Git(format!("Failed to resolve {}: {}", branch, e.message())))?;

        Ok(commit.id())
    }

    /// Whether `ancestor` is reachable from `descendant`
    ///
    /// A commit is not its own ancestor.
    pub fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        self.inner()
            .graph_descendant_of(descendant, ancestor)
            .map_err(|e| Error::Git(format!("Ancestry check failed: {}", e.message())))
    }

    /// Find local branches with work not merged into `baseline`
    ///
    /// The baseline itself, `main` and `master` are never reported. A branch
    /// whose commit or ancestry cannot be resolved is recorded as skipped and
    /// does not fail the scan.
    pub fn scan_unmerged(&self, baseline: &str) -> Result<BranchScan> {
        let baseline_commit = self.resolve_commit(baseline)?;
        let mut scan = BranchScan::default();

        for name in self.list_local_branches()? {
            if is_excluded(&name, baseline) {
                continue;
            }

            let checked = self.resolve_commit(&name).and_then(|commit| {
                let ancestor = self.is_ancestor(commit, baseline_commit)?;
                Ok((commit, ancestor))
            });

            match checked {
                Ok((commit, ancestor)) => {
                    if is_unmerged(commit, baseline_commit, ancestor) {
                        debug!(branch = %name, commit = %commit, "Branch is not merged into {}", baseline);
                        scan.unmerged.push(name);
                    }
                }
                Err(e) => {
                    warn!(branch = %name, "Skipping branch in merge check: {}", e);
                    scan.skipped.push(SkippedBranch {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        scan.unmerged.sort();
        Ok(scan)
    }
}
