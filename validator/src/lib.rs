//! WCP content package validator library.
//!
//! This crate decides, without running the host application, whether a WCP
//! package bundling a Wine or Proton runtime will be accepted by the host's
//! container startup logic. It is used by the `wcp-validate` CLI binary and
//! can be consumed programmatically, for example from a packaging pipeline.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Acceptance settings from defaults, TOML and flags
//! - [`digest`] - SHA-256 digest of the package file
//! - [`error`] - Operational error types
//! - [`extraction`] - Package extraction with codec fallback and timeouts
//! - [`identifier`] - Runtime identifier grammar
//! - [`logging`] - Stderr backend for the `log` facade
//! - [`manifest`] - `profile.json` model and schema validation
//! - [`pipeline`] - End-to-end validation of one package
//! - [`prefix_pack`] - Nested prefix archive content checks
//! - [`report`] - Validation report and rendering
//! - [`runner`] - Subprocess execution with a bounded wait
//! - [`structure`] - Package-root structure checks and heuristics
//! - [`tree`] - Declared file-tree checks

pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod extraction;
pub mod identifier;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod prefix_pack;
pub mod report;
pub mod runner;
pub mod structure;
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;
pub mod tree;
