//! Error types for the validator.
//!
//! These cover operational failures that prevent a validation run from
//! starting or its result from being delivered. Defects in the package
//! itself are never errors of this type; they are recorded in the
//! [`crate::report::ValidationReport`].

use thiserror::Error;

/// Errors that can occur outside the validation report.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// Path of the configuration file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid config file: {reason}")]
    ConfigParse {
        /// Description of the parse error.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`ValidatorError`].
pub type Result<T> = std::result::Result<T, ValidatorError>;
