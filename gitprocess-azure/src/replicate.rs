//! Branch policy replication

use gitprocess_core::{CopySummary, PolicyCopy};
use tracing::{info, warn};

use crate::policy::{branch_ref, Policy};
use crate::{AzureDevOpsClient, Result};

/// What happened to one policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The copy was created, with the id the service assigned
    Created { id: Option<u64> },
    /// The creation request failed
    Failed { error: String },
}

/// One source policy and the outcome of copying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyReplication {
    /// Policy type display name
    pub policy: String,
    /// Id of the source policy
    pub source_id: Option<u64>,
    pub outcome: CopyOutcome,
}

/// Result of replicating the policies of one branch onto another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationReport {
    pub repository_id: String,
    pub source_ref: String,
    pub target_ref: String,
    /// One entry per source policy, in the order they were fetched
    pub results: Vec<PolicyReplication>,
}

impl ReplicationReport {
    /// Number of policies created on the target branch
    pub fn created(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CopyOutcome::Created { .. }))
            .count()
    }

    /// Number of policies that could not be created
    pub fn failed(&self) -> usize {
        self.results.len() - self.created()
    }
}

impl From<ReplicationReport> for CopySummary {
    fn from(report: ReplicationReport) -> Self {
        CopySummary {
            copies: report
                .results
                .into_iter()
                .map(|r| PolicyCopy {
                    policy: r.policy,
                    error: match r.outcome {
                        CopyOutcome::Created { .. } => None,
                        CopyOutcome::Failed { error } => Some(error),
                    },
                })
                .collect(),
        }
    }
}

/// Policies read from the source branch, ready to be copied
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePolicies {
    pub repository_id: String,
    pub source_ref: String,
    pub policies: Vec<Policy>,
}

impl AzureDevOpsClient {
    /// Copy every policy on `source_branch` of `repository` to `target_branch`
    ///
    /// Fails only if the repository or the source policies cannot be read.
    /// Each copy is attempted independently; a failed creation is recorded in
    /// the report and the remaining policies are still copied. Nothing is
    /// rolled back, and running this twice creates duplicate policies.
    pub async fn replicate_policies(
        &self,
        repository: &str,
        source_branch: &str,
        target_branch: &str,
    ) -> Result<ReplicationReport> {
        let source = self.source_policies(repository, source_branch).await?;
        Ok(self.copy_source_policies(&source, target_branch).await)
    }

    /// Resolve `repository` and read the policies scoped to `source_branch`
    pub async fn source_policies(
        &self,
        repository: &str,
        source_branch: &str,
    ) -> Result<SourcePolicies> {
        let repository_id = self.repository_id(repository).await?;
        let policies = self.branch_policies(&repository_id, source_branch).await?;

        Ok(SourcePolicies {
            repository_id,
            source_ref: branch_ref(source_branch),
            policies,
        })
    }

    /// Create a copy of each source policy scoped to `target_branch`
    pub async fn copy_source_policies(
        &self,
        source: &SourcePolicies,
        target_branch: &str,
    ) -> ReplicationReport {
        let mut report = ReplicationReport {
            repository_id: source.repository_id.clone(),
            source_ref: source.source_ref.clone(),
            target_ref: branch_ref(target_branch),
            results: Vec::with_capacity(source.policies.len()),
        };

        if source.policies.is_empty() {
            info!(source = %report.source_ref, "No policies found on source branch");
            return report;
        }

        info!(
            count = source.policies.len(),
            source = %report.source_ref,
            target = %report.target_ref,
            "Copying branch policies"
        );

        for policy in &source.policies {
            let copy = policy.retarget(&report.target_ref, &report.repository_id);

            let outcome = match self.create_policy(&copy).await {
                Ok(created) => {
                    info!(policy = %policy.display_name(), id = ?created.id, "Copied policy");
                    CopyOutcome::Created { id: created.id }
                }
                Err(e) => {
                    warn!(policy = %policy.display_name(), "Failed to copy policy: {}", e);
                    CopyOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            report.results.push(PolicyReplication {
                policy: policy.display_name().to_string(),
                source_id: policy.id,
                outcome,
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replication(policy: &str, outcome: CopyOutcome) -> PolicyReplication {
        PolicyReplication {
            policy: policy.to_string(),
            source_id: Some(1),
            outcome,
        }
    }

    #[test]
    fn test_report_into_summary() {
        let report = ReplicationReport {
            repository_id: "repo-1".to_string(),
            source_ref: "refs/heads/develop".to_string(),
            target_ref: "refs/heads/feature/x".to_string(),
            results: vec![
                replication("Build", CopyOutcome::Created { id: Some(9) }),
                replication(
                    "Comment requirements",
                    CopyOutcome::Failed {
                        error: "500 Internal Server Error".to_string(),
                    },
                ),
            ],
        };

        assert_eq!(report.created(), 1);
        assert_eq!(report.failed(), 1);

        let summary: CopySummary = report.into();
        assert_eq!(summary.found(), 2);
        assert_eq!(summary.copies[0].error, None);
        assert_eq!(
            summary.copies[1].error.as_deref(),
            Some("500 Internal Server Error")
        );
    }
}
