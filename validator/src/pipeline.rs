//! End-to-end validation of one package.
//!
//! Stage order mirrors the host's startup path: extract, locate and parse
//! `profile.json`, then check the declared tree, the prefix archive and the
//! overall layout. Extraction failure, a missing or unreadable profile, and
//! schema violations end the run; once the profile is valid every remaining
//! stage runs so the report lists every defect.
//!
//! The scratch directory is a [`tempfile::TempDir`] owned by the run and
//! removed when it goes out of scope, on every exit path.

use crate::config::ValidatorConfig;
use crate::digest::compute_sha256;
use crate::extraction::{
    ExtractStrategy, ExtractionBackend, InProcessStrategy, SystemTarStrategy,
    extract_into_report,
};
use crate::manifest::PROFILE_FILE;
use crate::manifest::profile::ContentProfile;
use crate::manifest::schema::validate_profile;
use crate::prefix_pack::validate_prefix_pack;
use crate::report::{PackageValidation, ProfileSummary, ValidationReport};
use crate::runner::SystemCommandRunner;
use crate::structure::validate_structure;
use crate::tree::validate_tree;
use std::fs;
use std::path::Path;

/// Prefix of scratch directory names.
pub const SCRATCH_PREFIX: &str = "wcp_check_";

/// Settings for a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Resolved configuration.
    pub config: ValidatorConfig,
    /// Extraction machinery.
    pub backend: ExtractionBackend,
}

/// Validate the package at `package` with the configured backend.
///
/// Package defects never surface as `Err`; every fault is recorded in the
/// returned report.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use wcp_validator::pipeline::{ValidationOptions, validate_package};
///
/// let run = validate_package(Path::new("proton-9.0-x86_64.wcp"), &ValidationOptions::default());
/// println!("{}", wcp_validator::report::format_human(&run));
/// ```
#[must_use]
pub fn validate_package(package: &Path, options: &ValidationOptions) -> PackageValidation {
    match options.backend {
        ExtractionBackend::InProcess => {
            validate_package_with(package, &options.config, &InProcessStrategy)
        }
        ExtractionBackend::SystemTar => validate_package_with(
            package,
            &options.config,
            &SystemTarStrategy::new(SystemCommandRunner),
        ),
    }
}

/// Validate the package at `package`, extracting with `strategy`.
#[must_use]
pub fn validate_package_with(
    package: &Path,
    config: &ValidatorConfig,
    strategy: &dyn ExtractStrategy,
) -> PackageValidation {
    let mut run = PackageValidation {
        package: package.display().to_string(),
        sha256: None,
        profile: None,
        metadata: None,
        report: ValidationReport::new(),
    };

    if !check_package_file(package, &mut run.report) {
        return run;
    }

    match compute_sha256(package) {
        Ok(digest) => run.sha256 = Some(digest),
        Err(err) => run
            .report
            .add_warning(format!("Could not compute SHA-256 of package: {err}")),
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let created = match &config.scratch_dir {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    };
    let scratch = match created {
        Ok(dir) => dir,
        Err(err) => {
            run.report
                .add_error(format!("Could not create scratch directory: {err}"));
            return run;
        }
    };
    log::debug!("scratch directory {}", scratch.path().display());

    validate_in_scratch(package, scratch.path(), config, strategy, &mut run);

    let scratch_path = scratch.path().to_path_buf();
    if let Err(err) = scratch.close() {
        log::warn!(
            "failed to remove scratch directory {}: {err}",
            scratch_path.display()
        );
    }
    run
}

fn validate_in_scratch(
    package: &Path,
    scratch: &Path,
    config: &ValidatorConfig,
    strategy: &dyn ExtractStrategy,
    run: &mut PackageValidation,
) {
    log::info!("extracting {}", package.display());
    let Some(root) = extract_into_report(
        strategy,
        package,
        scratch,
        config.extraction_timeout(),
        &mut run.report,
    ) else {
        return;
    };

    log::info!("validating {PROFILE_FILE}");
    let Some(profile) = load_profile(&root, &mut run.report) else {
        return;
    };
    run.profile = Some(summarise(&profile));

    log::info!("validating declared file tree");
    let tree = validate_tree(&root, &profile, &mut run.report);

    if let (Some(path), Some((_, layout))) = (&tree.prefix_pack, profile.runtime_layout()) {
        log::info!("validating prefix archive");
        validate_prefix_pack(path, &layout.prefix_pack, config, &mut run.report);
    }

    log::info!("validating package structure");
    run.metadata = validate_structure(&root, &profile, config, &mut run.report);
}

fn check_package_file(package: &Path, report: &mut ValidationReport) -> bool {
    if !package.exists() {
        report.add_error(format!("package file not found: {}", package.display()));
        return false;
    }
    if !package.is_file() {
        report.add_error(format!(
            "package path is not a regular file: {}",
            package.display()
        ));
        return false;
    }
    true
}

fn load_profile(root: &Path, report: &mut ValidationReport) -> Option<ContentProfile> {
    let path = root.join(PROFILE_FILE);
    if !path.exists() {
        report.add_error(format!("{PROFILE_FILE} not found at archive root"));
        return None;
    }

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            report.add_error(format!("Error reading {PROFILE_FILE}: {err}"));
            return None;
        }
    };
    let document: serde_json::Value = match serde_json::from_str(&text) {
        Ok(document) => document,
        Err(err) => {
            report.add_error(format!("Invalid JSON in {PROFILE_FILE}: {err}"));
            return None;
        }
    };

    match validate_profile(&document) {
        Ok(profile) => Some(profile),
        Err(violations) => {
            for violation in violations {
                report.add_error(violation.to_string());
            }
            None
        }
    }
}

fn summarise(profile: &ContentProfile) -> ProfileSummary {
    let summary = ProfileSummary {
        content_type: profile.content_type().to_string(),
        version_name: profile.version_name().to_owned(),
        version_code: profile.version_code(),
        identifier: profile.identifier(),
    };
    log::info!(
        "type={} versionName={} versionCode={}",
        summary.content_type,
        summary.version_name,
        summary.version_code
    );
    if let Some(identifier) = &summary.identifier {
        log::info!("resolved identifier {identifier}");
    }
    summary
}
