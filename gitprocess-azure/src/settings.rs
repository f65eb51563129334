//! Connection settings for Azure DevOps

use gitprocess_core::{resolve_value, AzureConfig, Console};
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Everything needed to call the Azure DevOps REST API
///
/// Built once per replication and handed to the client.
#[derive(Clone)]
pub struct AzureSettings {
    /// Organization name
    pub organization: String,
    /// Project name
    pub project: String,
    /// Service root
    pub base_url: Url,
    /// Value of the `api-version` query parameter
    pub api_version: String,
    token: String,
}

impl std::fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSettings")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AzureSettings {
    /// Settings for the public service with the default API version
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let defaults = AzureConfig::default();
        Ok(Self {
            organization: organization.into(),
            project: project.into(),
            base_url: parse_base_url(&defaults.base_url)?,
            api_version: defaults.api_version,
            token: token.into(),
        })
    }

    /// Point at a different service root
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Use a different API version
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Personal access token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Resolve settings from configuration, prompting for anything unset
    ///
    /// Organization, project and token are each asked for when missing. If
    /// any of them is still empty afterwards the result is a configuration
    /// error.
    pub fn resolve(
        config: &AzureConfig,
        token: Option<String>,
        console: &mut dyn Console,
    ) -> Result<Self> {
        let organization = resolve_value(
            console,
            config.organization.clone(),
            "Enter Azure DevOps Organization: ",
        )?;
        let project = resolve_value(
            console,
            config.project.clone(),
            "Enter Azure DevOps Project: ",
        )?;
        let token = resolve_value(console, token, "Enter Personal Access Token (PAT): ")?;

        let (organization, project, token) = match (organization, project, token) {
            (Some(o), Some(p), Some(t)) => (o, p, t),
            (o, p, t) => {
                let missing: Vec<&str> = [
                    (o.is_none(), "organization"),
                    (p.is_none(), "project"),
                    (t.is_none(), "access token"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();

                return Err(Error::Config(format!(
                    "missing required Azure DevOps configuration: {}",
                    missing.join(", ")
                )));
            }
        };

        debug!(organization = %organization, project = %project, "Resolved Azure DevOps settings");

        Ok(Self::new(organization, project, token)?
            .with_base_url(&config.base_url)?
            .with_api_version(config.api_version.clone()))
    }
}

fn parse_base_url(input: &str) -> Result<Url> {
    let url = Url::parse(input)
        .map_err(|e| Error::Config(format!("Invalid Azure DevOps URL '{}': {}", input, e)))?;

    if url.cannot_be_a_base() {
        return Err(Error::Config(format!(
            "Invalid Azure DevOps URL '{}': not a base URL",
            input
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitprocess_core::LineConsole;
    use std::io::Cursor;

    fn scripted(input: &str) -> LineConsole<Cursor<Vec<u8>>, Vec<u8>> {
        LineConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_resolve_from_config_without_prompting() {
        let config = AzureConfig {
            organization: Some("contoso".to_string()),
            project: Some("Fabrikam".to_string()),
            ..AzureConfig::default()
        };
        let mut console = scripted("");

        let settings =
            AzureSettings::resolve(&config, Some("pat".to_string()), &mut console).unwrap();

        assert_eq!(settings.organization, "contoso");
        assert_eq!(settings.project, "Fabrikam");
        assert_eq!(settings.token(), "pat");
        assert_eq!(settings.base_url.as_str(), "https://dev.azure.com/");
        assert_eq!(settings.api_version, "7.1-preview.1");
        assert!(console.output().is_empty());
    }

    #[test]
    fn test_resolve_prompts_for_missing_values() {
        let mut console = scripted("contoso\nFabrikam\npat\n");

        let settings =
            AzureSettings::resolve(&AzureConfig::default(), None, &mut console).unwrap();

        assert_eq!(settings.organization, "contoso");
        assert_eq!(settings.project, "Fabrikam");
        assert_eq!(settings.token(), "pat");

        let prompts = String::from_utf8_lossy(console.output()).to_string();
        assert!(prompts.contains("Organization"));
        assert!(prompts.contains("Personal Access Token"));
    }

    #[test]
    fn test_resolve_missing_token_is_config_error() {
        let config = AzureConfig {
            organization: Some("contoso".to_string()),
            project: Some("Fabrikam".to_string()),
            ..AzureConfig::default()
        };
        let mut console = scripted("\n");

        let err = AzureSettings::resolve(&config, None, &mut console).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("access token"));
        assert!(!err.to_string().contains("organization"));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = AzureConfig {
            base_url: "not a url".to_string(),
            ..AzureConfig::default()
        };
        let mut console = scripted("o\np\nt\n");

        let err = AzureSettings::resolve(&config, None, &mut console).unwrap_err();
        assert!(err.to_string().contains("Invalid Azure DevOps URL"));
    }

    #[test]
    fn test_debug_hides_token() {
        let settings = AzureSettings::new("o", "p", "very-secret").unwrap();
        assert!(!format!("{:?}", settings).contains("very-secret"));
    }
}
