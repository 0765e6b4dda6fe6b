//! Validator configuration.
//!
//! Settings are resolved from built-in defaults, then an optional TOML file,
//! then explicit command-line overrides. The defaults encode the acceptance
//! contract of the host application; the file exists so that packagers can
//! track a host build whose contract has drifted without rebuilding the
//! validator.

use crate::error::{Result, ValidatorError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings governing one validation run.
///
/// # Examples
///
/// ```
/// use wcp_validator::config::ValidatorConfig;
///
/// let config = ValidatorConfig::from_toml_str("extraction_timeout_secs = 30")
///     .expect("valid config");
/// assert_eq!(config.extraction_timeout().as_secs(), 30);
/// assert_eq!(config.prefix_marker, ".wine/");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Upper bound on each extraction attempt, in seconds.
    pub extraction_timeout_secs: u64,
    /// Directory prefix every prefix-archive member must live under.
    pub prefix_marker: String,
    /// Member name that denotes the archive root itself.
    pub root_marker: String,
    /// Maximum number of offending prefix-archive paths quoted in an error.
    pub sample_limit: usize,
    /// Files that must exist at the package root.
    pub required_root_files: Vec<String>,
    /// Directories expected at the package root; absence is advisory.
    pub expected_dirs: Vec<String>,
    /// Executables of which at least one should exist in the binary directory.
    pub known_binaries: Vec<String>,
    /// Library sub-directories checked in priority order.
    pub library_subdirs: Vec<String>,
    /// Optional secondary metadata file at the package root.
    pub metadata_file: String,
    /// Parent of the per-run scratch directory. Unset means the system
    /// temporary directory.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: 60,
            prefix_marker: ".wine/".to_owned(),
            root_marker: ".".to_owned(),
            sample_limit: 5,
            required_root_files: vec!["profile.json".to_owned()],
            expected_dirs: vec!["bin".to_owned(), "lib".to_owned(), "share".to_owned()],
            known_binaries: vec![
                "wine".to_owned(),
                "wine64".to_owned(),
                "wineserver".to_owned(),
            ],
            library_subdirs: vec!["wine".to_owned(), "wine64".to_owned()],
            metadata_file: "wcp.json".to_owned(),
            scratch_dir: None,
        }
    }
}

impl ValidatorConfig {
    /// Parse and check a configuration from TOML text.
    ///
    /// Omitted keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ConfigParse`] for malformed TOML or unknown
    /// keys, and [`ValidatorError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|source| ValidatorError::ConfigParse {
            reason: source.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ConfigRead`] when the file cannot be read,
    /// or any error from [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ValidatorError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load configuration from `path` when given, or use the defaults.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Apply a command-line timeout override.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::InvalidConfig`] when `secs` is zero.
    pub fn with_timeout_override(mut self, secs: Option<u64>) -> Result<Self> {
        if let Some(secs) = secs {
            self.extraction_timeout_secs = secs;
            self.check()?;
        }
        Ok(self)
    }

    /// Return the extraction timeout as a [`Duration`].
    #[must_use]
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    fn check(&self) -> Result<()> {
        if self.extraction_timeout_secs == 0 {
            return Err(ValidatorError::InvalidConfig {
                reason: "extraction_timeout_secs must be greater than zero".to_owned(),
            });
        }
        if self.sample_limit == 0 {
            return Err(ValidatorError::InvalidConfig {
                reason: "sample_limit must be greater than zero".to_owned(),
            });
        }
        if self.prefix_marker.is_empty() {
            return Err(ValidatorError::InvalidConfig {
                reason: "prefix_marker must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_host_contract() {
        let config = ValidatorConfig::default();
        assert_eq!(config.extraction_timeout(), Duration::from_secs(60));
        assert_eq!(config.sample_limit, 5);
        assert_eq!(config.expected_dirs, vec!["bin", "lib", "share"]);
        assert_eq!(config.library_subdirs, vec!["wine", "wine64"]);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = ValidatorConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, ValidatorConfig::default());
    }

    #[test]
    fn overrides_selected_keys() {
        let config = ValidatorConfig::from_toml_str(concat!(
            "prefix_marker = \".proton/\"\n",
            "known_binaries = [\"proton\"]\n",
        ))
        .expect("valid config");
        assert_eq!(config.prefix_marker, ".proton/");
        assert_eq!(config.known_binaries, vec!["proton"]);
        assert_eq!(config.metadata_file, "wcp.json");
        assert_eq!(config.scratch_dir, None);
    }

    #[test]
    fn scratch_dir_is_read_as_a_path() {
        let config =
            ValidatorConfig::from_toml_str("scratch_dir = \"/var/tmp/wcp\"").expect("valid config");
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/var/tmp/wcp")));
    }

    #[rstest]
    #[case::unknown_key("colour = true")]
    #[case::wrong_type("sample_limit = \"five\"")]
    #[case::syntax("extraction_timeout_secs =")]
    fn rejects_malformed_files(#[case] text: &str) {
        assert!(matches!(
            ValidatorConfig::from_toml_str(text),
            Err(ValidatorError::ConfigParse { .. })
        ));
    }

    #[rstest]
    #[case::zero_timeout("extraction_timeout_secs = 0")]
    #[case::zero_sample("sample_limit = 0")]
    #[case::empty_marker("prefix_marker = \"\"")]
    fn rejects_out_of_range_values(#[case] text: &str) {
        assert!(matches!(
            ValidatorConfig::from_toml_str(text),
            Err(ValidatorError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn timeout_override_replaces_file_value() {
        let config = ValidatorConfig::default()
            .with_timeout_override(Some(5))
            .expect("valid override");
        assert_eq!(config.extraction_timeout_secs, 5);
        assert!(
            ValidatorConfig::default()
                .with_timeout_override(Some(0))
                .is_err()
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = ValidatorConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ValidatorError::ConfigRead { .. })));
    }

    #[test]
    fn load_or_default_without_path_uses_defaults() {
        let config = ValidatorConfig::load_or_default(None).expect("defaults");
        assert_eq!(config, ValidatorConfig::default());
    }
}
