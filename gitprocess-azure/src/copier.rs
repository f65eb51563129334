//! Azure DevOps implementation of the policy copy step

use async_trait::async_trait;
use gitprocess_core::{AzureConfig, Config, Console, CopySummary, PolicyCopier, Secrets};
use tracing::info;

use crate::{AzureDevOpsClient, AzureSettings};

/// Copies branch policies through the Azure DevOps REST API
///
/// Connection settings are resolved on each copy, prompting for anything the
/// configuration and environment left unset.
pub struct AzurePolicyCopier {
    config: AzureConfig,
    token: Option<String>,
}

impl AzurePolicyCopier {
    /// Create a copier from explicit settings
    pub fn new(config: AzureConfig, token: Option<String>) -> Self {
        Self { config, token }
    }

    /// Create a copier from loaded configuration and secrets
    ///
    /// The token comes from ACCESS_TOKEN or the secrets file.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Self {
        Self::new(config.azure.clone(), secrets.access_token())
    }
}

impl std::fmt::Debug for AzurePolicyCopier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzurePolicyCopier")
            .field("config", &self.config)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl PolicyCopier for AzurePolicyCopier {
    async fn copy_policies(
        &self,
        console: &mut dyn Console,
        repository: &str,
        source_branch: &str,
        target_branch: &str,
    ) -> gitprocess_core::Result<CopySummary> {
        let settings = AzureSettings::resolve(&self.config, self.token.clone(), console)?;
        let client = AzureDevOpsClient::new(settings)?;

        let source = client.source_policies(repository, source_branch).await?;
        if !source.policies.is_empty() {
            console.say(&format!(
                "Found {} policies on branch '{}'",
                source.policies.len(),
                source_branch
            ))?;
        }

        let report = client.copy_source_policies(&source, target_branch).await;

        info!(
            created = report.created(),
            failed = report.failed(),
            "Policy replication finished"
        );

        Ok(report.into())
    }
}
