//! Azure DevOps REST API client using reqwest

use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::policy::{branch_ref, Policy};
use crate::{AzureSettings, Error, Result};

/// Repository lookup response
#[derive(Debug, Deserialize)]
struct RepositoryRef {
    id: String,
}

/// List response envelope
#[derive(Debug, Deserialize)]
struct ValueList<T> {
    value: Vec<T>,
}

/// Azure DevOps API client for one organization and project
pub struct AzureDevOpsClient {
    http: reqwest::Client,
    settings: AzureSettings,
}

impl AzureDevOpsClient {
    /// Create a new client
    pub fn new(settings: AzureSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gitprocess/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            organization = %settings.organization,
            project = %settings.project,
            "Created Azure DevOps client"
        );

        Ok(Self { http, settings })
    }

    /// Look up a repository by name (or id) and return its id
    pub async fn repository_id(&self, repository: &str) -> Result<String> {
        debug!(repository, "Looking up repository");

        let url = self.endpoint(&["git", "repositories", repository])?;
        let repo: RepositoryRef = self.send(self.http.get(url), "get repository").await?;

        Ok(repo.id)
    }

    /// List the policy configurations scoped to `branch` of a repository
    pub async fn branch_policies(&self, repository_id: &str, branch: &str) -> Result<Vec<Policy>> {
        let ref_name = branch_ref(branch);
        debug!(repository_id, ref_name = %ref_name, "Fetching branch policies");

        let mut url = self.endpoint(&["policy", "configurations"])?;
        url.query_pairs_mut()
            .append_pair("repositoryId", repository_id)
            .append_pair("refName", &ref_name);

        let list: ValueList<Policy> = self.send(self.http.get(url), "get branch policies").await?;

        Ok(list.value)
    }

    /// Create a policy configuration, returning the created policy
    pub async fn create_policy(&self, policy: &Policy) -> Result<Policy> {
        debug!(policy = %policy.display_name(), "Creating policy");

        let url = self.endpoint(&["policy", "configurations"])?;
        self.send(self.http.post(url).json(policy), "create branch policy")
            .await
    }

    /// Build `{base}/{organization}/{project}/_apis/{segments}?api-version=...`
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.settings.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "Invalid Azure DevOps URL: {}",
                    self.settings.base_url
                ))
            })?
            .pop_if_empty()
            .push(&self.settings.organization)
            .push(&self.settings.project)
            .push("_apis")
            .extend(segments);

        url.query_pairs_mut()
            .append_pair("api-version", &self.settings.api_version);

        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T> {
        let response = request
            .basic_auth("", Some(self.settings.token()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| Error::Http { operation, source })?;

        let status = response.status();

        // A rejected token gets a sign-in page with 203 instead of a 401
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(Error::Auth(format!(
                "{} was redirected to sign-in; check the access token",
                operation
            )));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Api {
                operation,
                status,
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse {} response: {}", operation, e)))
    }
}

impl std::fmt::Debug for AzureDevOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
