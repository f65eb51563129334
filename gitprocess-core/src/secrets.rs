//! Secrets management for gitprocess
//!
//! The Azure DevOps personal access token is kept out of the main config
//! file. The secrets file lives at `~/.config/gitprocess/secrets.toml` and
//! must have restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variable (ACCESS_TOKEN)
//! 2. Secrets file (~/.config/gitprocess/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable holding the access token
pub const ACCESS_TOKEN_VAR: &str = "ACCESS_TOKEN";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Azure DevOps secrets
    pub azure: AzureSecrets,
}

/// Azure DevOps secrets
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AzureSecrets {
    /// Personal Access Token
    pub token: Option<String>,
}

impl std::fmt::Debug for AzureSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSecrets")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_secrets_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut token) = secrets.azure.token {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/gitprocess/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitprocess").join("secrets.toml"))
    }

    /// Get the access token with environment variable override
    ///
    /// Priority: ACCESS_TOKEN env var > secrets file
    pub fn access_token(&self) -> Option<String> {
        self.access_token_with(|name| std::env::var(name).ok())
    }

    /// Get the access token using an arbitrary variable lookup
    pub fn access_token_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(token) = lookup(ACCESS_TOKEN_VAR) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!("Using access token from {} environment variable", ACCESS_TOKEN_VAR);
                return Some(token);
            }
        }

        match self.azure.token {
            Some(ref token) if !token.is_empty() => {
                debug!("Using access token from secrets file");
                Some(token.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_secrets() {
        let toml = r#"
[azure]
token = "pat-xxxxxxxx"
"#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.azure.token.as_deref(), Some("pat-xxxxxxxx"));
    }

    #[test]
    fn test_env_token_wins() {
        let secrets = Secrets {
            azure: AzureSecrets {
                token: Some("from_file".to_string()),
            },
        };

        let token = secrets.access_token_with(|_| Some(" from_env ".to_string()));
        assert_eq!(token.as_deref(), Some("from_env"));

        let token = secrets.access_token_with(|_| Some(String::new()));
        assert_eq!(token.as_deref(), Some("from_file"));

        assert!(Secrets::default().access_token_with(|_| None).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let secrets = AzureSecrets {
            token: Some("super-secret".to_string()),
        };
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[azure]\ntoken = \"test\"").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let result = Secrets::load_from_file(file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_permissions_trims_token() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[azure]\ntoken = \"  pat-test  \"").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.azure.token.as_deref(), Some("pat-test"));
    }
}
