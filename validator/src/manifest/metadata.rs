//! Optional secondary metadata shipped as `wcp.json`.
//!
//! The host never requires this file. When present it is parsed for display
//! only, and a parse failure is advisory.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors arising from reading `wcp.json`.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The file could not be read.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid metadata JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Fields of interest in `wcp.json`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WcpMetadata {
    /// Human-readable package name.
    pub name: Option<String>,
    /// Package version string.
    pub version: Option<String>,
}

/// Parse metadata from a JSON string.
///
/// # Errors
///
/// Returns [`MetadataError::Json`] when the text is not a JSON object with
/// string-valued `name` and `version` fields.
///
/// # Examples
///
/// ```
/// use wcp_validator::manifest::metadata::parse_metadata;
///
/// let meta = parse_metadata(r#"{"name":"proton-ge","version":"8.0"}"#).expect("valid");
/// assert_eq!(meta.name.as_deref(), Some("proton-ge"));
/// ```
pub fn parse_metadata(json: &str) -> Result<WcpMetadata, MetadataError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse the metadata file at `path`.
///
/// # Errors
///
/// Returns [`MetadataError`] when the file cannot be read or parsed.
pub fn read_metadata(path: &Path) -> Result<WcpMetadata, MetadataError> {
    let text = std::fs::read_to_string(path)?;
    parse_metadata(&text)
}
