//! gitprocess Azure - Azure DevOps integration for gitprocess
//!
//! This crate talks to the Azure DevOps REST API to look up repositories and
//! copy branch policies from one branch to another.

mod client;
mod copier;
mod error;
mod policy;
mod replicate;
mod settings;

pub use client::AzureDevOpsClient;
pub use copier::AzurePolicyCopier;
pub use error::{Error, Result};
pub use policy::{branch_ref, Policy, PolicyScope, PolicyType};
pub use replicate::{CopyOutcome, PolicyReplication, ReplicationReport, SourcePolicies};
pub use settings::AzureSettings;
