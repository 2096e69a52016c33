//! Error handling for printstream
//!
//! The pipeline itself is deliberately infallible: malformed numeric
//! parameters are treated as absent and lines the engine does not understand
//! pass through untouched. Errors therefore come from the edges —
//! configuration files and I/O. All error types use `thiserror`.

use thiserror::Error;

/// Configuration error type
///
/// Represents errors loading, saving, or validating printer settings.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Settings file could not be read or written
    #[error("Failed to access settings file {path}: {reason}")]
    FileAccess {
        /// Path of the settings file.
        path: String,
        /// The underlying I/O failure.
        reason: String,
    },

    /// Settings file is not a supported format
    #[error("Unsupported settings format: {path} (expected .json or .toml)")]
    UnsupportedFormat {
        /// Path of the settings file.
        path: String,
    },

    /// Settings file could not be parsed
    #[error("Invalid settings in {path}: {reason}")]
    ParseError {
        /// Path of the settings file.
        path: String,
        /// The parser's message.
        reason: String,
    },

    /// A settings value failed validation
    #[error("Invalid value for {setting}: {reason}")]
    InvalidValue {
        /// The setting that failed validation.
        setting: String,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Main error type for printstream
///
/// Unified error type used in public APIs across the workspace.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
