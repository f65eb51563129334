//! Error types for Azure DevOps operations

use thiserror::Error;

/// Result type for Azure DevOps operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during Azure DevOps operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure
    #[error("Request to {operation} failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP response
    #[error("Failed to {operation}: {status} - {body}")]
    Api {
        operation: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Credentials were not accepted
    #[error("Azure DevOps authentication error: {0}")]
    Auth(String),

    /// Missing or invalid connection settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error surfaced from the core library (console IO)
    #[error(transparent)]
    Core(#[from] gitprocess_core::Error),
}

impl Error {
    /// HTTP status of a failed API call, if any
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<Error> for gitprocess_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(inner) => inner,
            Error::Config(msg) => gitprocess_core::Error::Config(msg),
            other => gitprocess_core::Error::Policy(other.to_string()),
        }
    }
}
