//! Package manifest model and schema validation.
//!
//! # Sub-modules
//!
//! - [`profile`] - Typed `profile.json` model (`ContentProfile`, `ContentType`).
//! - [`schema`] - Schema checks producing `SchemaViolation`s.
//! - [`metadata`] - Optional `wcp.json` secondary metadata.

pub mod metadata;
pub mod profile;
pub mod schema;

/// File name of the manifest at the package root.
pub const PROFILE_FILE: &str = "profile.json";
