//! gitprocess Core - Core library for gitprocess branch management
//!
//! This crate provides the git operations, configuration loading and the
//! interactive workflow that clones a repository, checks the baseline branch
//! for unmerged work and cuts a new branch from it.

pub mod config;
pub mod console;
pub mod error;
pub mod git;
pub mod secrets;
pub mod workflow;

pub use config::{AzureConfig, Config, WorkflowConfig};
pub use console::{is_affirmative, resolve_value, Console, LineConsole};
pub use error::{Error, Result};
pub use git::{BranchScan, GitRepo, SkippedBranch};
pub use secrets::{AzureSecrets, Secrets};
pub use workflow::{
    Coordinator, CopySummary, Outcome, PolicyCopier, PolicyCopy, WorkflowStep,
};
