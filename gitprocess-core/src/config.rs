//! Configuration management for gitprocess
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (ORG, PROJECT, GITPROCESS_*)
//! 2. Config file (~/.config/gitprocess/config.toml)
//! 3. Default values
//!
//! Anything still missing after that is asked for interactively when it is
//! actually needed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default Azure DevOps service root
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// REST API version sent with every Azure DevOps request
pub const DEFAULT_API_VERSION: &str = "7.1-preview.1";

/// Azure DevOps connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Organization name
    pub organization: Option<String>,

    /// Project name
    pub project: Option<String>,

    /// Service root, without organization or project
    pub base_url: String,

    /// Value of the `api-version` query parameter
    pub api_version: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// Branching workflow settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Branch new branches and policies are copied from
    pub baseline_branch: String,

    /// Remote whose tracking branch seeds the baseline
    pub remote: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            baseline_branch: "develop".to_string(),
            remote: "origin".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Azure DevOps configuration
    pub azure: AzureConfig,

    /// Workflow configuration
    pub workflow: WorkflowConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitprocess/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitprocess").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - ORG: Azure DevOps organization
    /// - PROJECT: Azure DevOps project
    /// - GITPROCESS_API_URL: service root
    /// - GITPROCESS_BASELINE: baseline branch
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// mask the config file.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(org) = get("ORG") {
            self.azure.organization = Some(org);
        }

        if let Some(project) = get("PROJECT") {
            self.azure.project = Some(project);
        }

        if let Some(url) = get("GITPROCESS_API_URL") {
            self.azure.base_url = url;
        }

        if let Some(baseline) = get("GITPROCESS_BASELINE") {
            self.workflow.baseline_branch = baseline;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: env > config file > defaults
    pub fn load_with_overrides() -> Result<Self> {
        Ok(Self::load()?.with_env_overrides())
    }
}
