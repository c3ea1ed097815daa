//! Error types for nocloud core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for nocloud operations.
pub type Result<T> = std::result::Result<T, NoCloudError>;

/// Core error type for nocloud operations.
#[derive(Debug, Error)]
pub enum NoCloudError {
    /// Malformed digest specification (length, alphabet, service, username)
    #[error("Invalid password specification: {0}")]
    InvalidSpec(String),

    /// Wrong passphrase or corrupted/tampered token.
    ///
    /// Both causes share one variant and one message.
    #[error("invalid decryption password")]
    Authentication,

    /// Encryption failure unrelated to authentication
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Configuration document could not be loaded or understood
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote storage backend error
    #[error("Remote storage error: {0}")]
    Remote(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl From<serde_yml::Error> for NoCloudError {
    fn from(err: serde_yml::Error) -> Self {
        NoCloudError::Config(err.to_string())
    }
}

impl From<opendal::Error> for NoCloudError {
    fn from(err: opendal::Error) -> Self {
        NoCloudError::Remote(err.to_string())
    }
}
