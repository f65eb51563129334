//! Error types for gitprocess

use thiserror::Error;

/// Result type alias for gitprocess operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitprocess operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required value was left empty at a prompt
    #[error("{0}")]
    Input(String),

    /// Git operation error
    #[error("Git error: {0}")]
    Git(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Branch policy replication error
    #[error("Policy error: {0}")]
    Policy(String),
}
