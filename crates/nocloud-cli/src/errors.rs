//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use nocloud_core::NoCloudError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (remote configuration, password file)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong passphrase, tampered file)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }
}

/// Map a core error onto a CLI error when it has a dedicated exit code.
pub fn classify(err: &NoCloudError) -> Option<CliError> {
    match err {
        NoCloudError::Authentication => Some(CliError::auth_failed_with_hint(
            err.to_string(),
            format!(
                "Hint: Check the passphrase, or unset {} to be prompted.",
                crate::constants::PASSPHRASE_ENV
            ),
        )),
        NoCloudError::InvalidSpec(_) | NoCloudError::InvalidInput(_) => {
            Some(CliError::invalid_input(err.to_string()))
        }
        _ => None,
    }
}

/// Convert a core error, attaching a hint and exit code when one applies.
pub fn from_core(err: NoCloudError) -> anyhow::Error {
    match classify(&err) {
        Some(cli_error) => cli_error.into(),
        None => err.into(),
    }
}

/// Exit code for an error reaching `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_error) = err.downcast_ref::<CliError>() {
        return cli_error.exit_code();
    }
    if let Some(core_error) = err.downcast_ref::<NoCloudError>() {
        if let Some(cli_error) = classify(core_error) {
            return cli_error.exit_code();
        }
    }
    1
}
