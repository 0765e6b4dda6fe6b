//! Validation report accumulation and rendering.
//!
//! Every pipeline stage appends to a single [`ValidationReport`]. Errors
//! block acceptance; warnings never do. Rendering preserves insertion order
//! within each list and always lists warnings before errors.

use crate::manifest::metadata::WcpMetadata;
use serde::Serialize;

/// Verdict line printed when the report has no errors.
pub const PASSED_VERDICT: &str = "VALIDATION PASSED";

/// Verdict line printed when the report has at least one error.
pub const FAILED_VERDICT: &str = "VALIDATION FAILED";

/// Fatal errors and advisory warnings gathered during one validation run.
///
/// # Examples
///
/// ```
/// use wcp_validator::report::ValidationReport;
///
/// let mut report = ValidationReport::new();
/// report.add_warning("Expected directory not found: share/");
/// assert!(report.is_passing());
///
/// report.add_error("profile.json not found at archive root");
/// assert!(!report.is_passing());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ValidationReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fatal error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("error recorded: {message}");
        self.errors.push(message);
    }

    /// Record an advisory warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("warning recorded: {message}");
        self.warnings.push(message);
    }

    /// Return the recorded errors in insertion order.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Return the recorded warnings in insertion order.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Return true when no fatal error was recorded.
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.errors.is_empty()
    }

    /// Render warnings, then errors, then the verdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use wcp_validator::report::ValidationReport;
    ///
    /// let mut report = ValidationReport::new();
    /// report.add_error("wine.binPath 'bin' is not a directory");
    /// let text = report.render();
    /// assert!(text.contains("ERRORS (1):"));
    /// assert!(text.ends_with("VALIDATION FAILED\n"));
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::new();

        if !self.warnings.is_empty() {
            output.push_str(&format!("WARNINGS ({}):\n", self.warnings.len()));
            for warning in &self.warnings {
                output.push_str(&format!("  - {warning}\n"));
            }
            output.push('\n');
        }

        if !self.errors.is_empty() {
            output.push_str(&format!("ERRORS ({}):\n", self.errors.len()));
            for error in &self.errors {
                output.push_str(&format!("  - {error}\n"));
            }
            output.push('\n');
        }

        output.push_str(if self.is_passing() {
            PASSED_VERDICT
        } else {
            FAILED_VERDICT
        });
        output.push('\n');
        output
    }
}

/// Informational facts about a schema-valid profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Declared content type.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Declared version name.
    pub version_name: String,
    /// Version code after integer coercion.
    pub version_code: i64,
    /// Identifier the host resolves, for Wine and Proton packages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Everything a validation run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageValidation {
    /// Path of the validated package.
    pub package: String,
    /// SHA-256 digest of the package file, when it could be computed.
    pub sha256: Option<String>,
    /// Summary of the profile, when it passed schema validation.
    pub profile: Option<ProfileSummary>,
    /// Parsed `wcp.json`, when present and well-formed.
    pub metadata: Option<WcpMetadata>,
    /// Accumulated errors and warnings.
    #[serde(flatten)]
    pub report: ValidationReport,
}

impl PackageValidation {
    /// Return true when the package passed validation.
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.report.is_passing()
    }
}

/// Format a validation run for human-readable output.
///
/// # Examples
///
/// ```
/// use wcp_validator::report::{PackageValidation, ValidationReport, format_human};
///
/// let run = PackageValidation {
///     package: "proton.wcp".to_owned(),
///     sha256: None,
///     profile: None,
///     metadata: None,
///     report: ValidationReport::new(),
/// };
/// let text = format_human(&run);
/// assert!(text.starts_with("Package: proton.wcp"));
/// assert!(text.ends_with("VALIDATION PASSED\n"));
/// ```
#[must_use]
pub fn format_human(run: &PackageValidation) -> String {
    let mut output = format!("Package: {}\n", run.package);

    if let Some(digest) = &run.sha256 {
        output.push_str(&format!("SHA-256: {digest}\n"));
    }

    if let Some(profile) = &run.profile {
        output.push_str(&format!("Type: {}\n", profile.content_type));
        output.push_str(&format!("Version name: {}\n", profile.version_name));
        output.push_str(&format!("Version code: {}\n", profile.version_code));
        if let Some(identifier) = &profile.identifier {
            output.push_str(&format!("Resolved identifier: {identifier}\n"));
        }
    }

    if let Some(metadata) = &run.metadata {
        output.push_str(&format!(
            "Metadata: name={} version={}\n",
            metadata.name.as_deref().unwrap_or("-"),
            metadata.version.as_deref().unwrap_or("-")
        ));
    }

    output.push('\n');
    output.push_str(&run.report.render());
    output
}

/// Format a validation run as pretty-printed JSON.
#[must_use]
pub fn format_json(run: &PackageValidation) -> String {
    let document = JsonReport {
        run,
        passed: run.is_passing(),
    };
    serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_owned())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    run: &'a PackageValidation,
    passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn mixed_report() -> ValidationReport {
        let mut report = ValidationReport::new();
        report.add_warning("first warning");
        report.add_error("first error");
        report.add_warning("second warning");
        report.add_error("second error");
        report
    }

    #[test]
    fn empty_report_passes() {
        let report = ValidationReport::new();
        assert!(report.is_passing());
        assert_eq!(report.render(), "VALIDATION PASSED\n");
    }

    #[test]
    fn warnings_alone_do_not_fail() {
        let mut report = ValidationReport::new();
        report.add_warning("WCP uses xz compression, should use zstd");
        assert!(report.is_passing());
        assert!(report.render().ends_with("VALIDATION PASSED\n"));
    }

    #[rstest]
    fn render_lists_warnings_then_errors_in_order(mixed_report: ValidationReport) {
        let text = mixed_report.render();
        let positions: Vec<usize> = [
            "WARNINGS (2):",
            "first warning",
            "second warning",
            "ERRORS (2):",
            "first error",
            "second error",
            FAILED_VERDICT,
        ]
        .iter()
        .map(|needle| text.find(needle).expect("rendered text contains entry"))
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[rstest]
    fn entries_keep_insertion_order(mixed_report: ValidationReport) {
        assert_eq!(mixed_report.errors(), &["first error", "second error"]);
        assert_eq!(mixed_report.warnings(), &["first warning", "second warning"]);
    }

    #[rstest]
    fn json_output_flattens_report(mixed_report: ValidationReport) {
        let run = PackageValidation {
            package: "pkg.wcp".to_owned(),
            sha256: Some("ab".repeat(32)),
            profile: Some(ProfileSummary {
                content_type: "Proton".to_owned(),
                version_name: "8.0-x86_64".to_owned(),
                version_code: 3,
                identifier: Some("proton-8.0-x86_64".to_owned()),
            }),
            metadata: None,
            report: mixed_report,
        };
        let value: serde_json::Value =
            serde_json::from_str(&format_json(&run)).expect("valid JSON");
        assert_eq!(value["passed"], serde_json::json!(false));
        assert_eq!(value["errors"][1], serde_json::json!("second error"));
        assert_eq!(value["profile"]["type"], serde_json::json!("Proton"));
        assert_eq!(value["profile"]["versionCode"], serde_json::json!(3));
    }

    #[test]
    fn human_output_includes_identifier() {
        let run = PackageValidation {
            package: "pkg.wcp".to_owned(),
            sha256: None,
            profile: Some(ProfileSummary {
                content_type: "Wine".to_owned(),
                version_name: "9.0-x86_64".to_owned(),
                version_code: 1,
                identifier: Some("wine-9.0-x86_64".to_owned()),
            }),
            metadata: Some(WcpMetadata {
                name: Some("wine".to_owned()),
                version: None,
            }),
            report: ValidationReport::new(),
        };
        let text = format_human(&run);
        assert!(text.contains("Resolved identifier: wine-9.0-x86_64"));
        assert!(text.contains("Metadata: name=wine version=-"));
    }
}
