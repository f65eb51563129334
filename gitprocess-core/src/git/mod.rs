//! Git operations for gitprocess
//!
//! This module wraps the handful of `git2` operations the workflow needs:
//! cloning, checking out the baseline, scanning for unmerged branches and
//! cutting a new branch.

mod branch;
mod repo;

#[cfg(test)]
pub(crate) mod fixtures;

pub use branch::{is_excluded, is_unmerged, BranchScan, SkippedBranch};
pub use repo::GitRepo;
