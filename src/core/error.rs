//! Error types for commit-gate.
//!
//! This module defines all errors that can occur during operation. Lint
//! failures reported by external checkers are *not* errors — they are normal
//! domain data carried in run results.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in commit-gate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path where config was expected.
        path: PathBuf,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Description of the parse error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Field name that is invalid.
        field: String,
        /// Description of why it's invalid.
        message: String,
    },

    // =========================================================================
    // Git errors
    // =========================================================================
    /// Not in a Git repository.
    #[error("Not in a Git repository")]
    NotGitRepo,

    /// Git operation failed.
    #[error("Git operation failed: {operation} - {message}")]
    GitOperation {
        /// Name of the operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    // =========================================================================
    // Classification errors
    // =========================================================================
    /// Unknown category name.
    #[error("Unknown category: {name}")]
    UnknownCategory {
        /// The category name that wasn't recognized.
        name: String,
    },

    // =========================================================================
    // Hook errors
    // =========================================================================
    /// Hook already exists and wasn't created by us.
    #[error("Git hook already exists at {path}. Use --force to overwrite.")]
    HookExists {
        /// Path to existing hook.
        path: PathBuf,
    },

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration parse error.
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new Git operation error.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
