//! Branch policy copy seam

use async_trait::async_trait;

use crate::console::Console;
use crate::Result;

/// Copies branch policies from one branch to another on the hosting service
#[async_trait]
pub trait PolicyCopier: Send + Sync {
    /// Copy every policy scoped to `source_branch` onto `target_branch`
    ///
    /// The console is available for asking for missing connection settings.
    /// Individual policy failures are reported in the summary; an `Err`
    /// means nothing could be copied at all.
    async fn copy_policies(
        &self,
        console: &mut dyn Console,
        repository: &str,
        source_branch: &str,
        target_branch: &str,
    ) -> Result<CopySummary>;
}

/// Outcome of copying a single policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyCopy {
    /// Policy type display name
    pub policy: String,
    /// Failure message, `None` when the copy was created
    pub error: Option<String>,
}

/// Per-policy outcomes of a copy run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub copies: Vec<PolicyCopy>,
}

impl CopySummary {
    /// Number of policies found on the source branch
    pub fn found(&self) -> usize {
        self.copies.len()
    }

    /// Number of policies created on the target branch
    pub fn copied(&self) -> usize {
        self.copies.iter().filter(|c| c.error.is_none()).count()
    }

    /// Number of policies that failed to copy
    pub fn failed(&self) -> usize {
        self.found() - self.copied()
    }
}
