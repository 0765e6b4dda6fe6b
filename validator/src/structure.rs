//! Package-root structure checks and best-effort runtime heuristics.
//!
//! Apart from missing required root files, everything here is advisory.

use crate::config::ValidatorConfig;
use crate::manifest::metadata::{WcpMetadata, read_metadata};
use crate::manifest::profile::ContentProfile;
use crate::report::ValidationReport;
use crate::tree::resolve_within;
use std::fs;
use std::path::Path;

const DEFAULT_BIN_DIR: &str = "bin";
const DEFAULT_LIB_DIR: &str = "lib";

/// Run every structure check against the package tree at `root`.
///
/// Returns the parsed secondary metadata when the file is present and
/// readable.
pub fn validate_structure(
    root: &Path,
    profile: &ContentProfile,
    config: &ValidatorConfig,
    report: &mut ValidationReport,
) -> Option<WcpMetadata> {
    check_required_files(root, config, report);
    check_expected_dirs(root, config, report);
    let metadata = load_metadata(root, config, report);

    let (bin_dir, lib_dir) = profile.runtime_layout().map_or(
        (DEFAULT_BIN_DIR, DEFAULT_LIB_DIR),
        |(_, layout)| (layout.bin_path.as_str(), layout.lib_path.as_str()),
    );
    check_known_binaries(root, bin_dir, config, report);
    check_library_subdirs(root, lib_dir, config, report);

    metadata
}

fn check_required_files(root: &Path, config: &ValidatorConfig, report: &mut ValidationReport) {
    for name in &config.required_root_files {
        if !root.join(name).exists() {
            report.add_error(format!("Missing required file at root: {name}"));
        }
    }
}

fn check_expected_dirs(root: &Path, config: &ValidatorConfig, report: &mut ValidationReport) {
    for name in &config.expected_dirs {
        if root.join(name).exists() {
            log::info!("{name}/ exists");
        } else {
            report.add_warning(format!("Expected directory not found: {name}/"));
        }
    }
}

fn load_metadata(
    root: &Path,
    config: &ValidatorConfig,
    report: &mut ValidationReport,
) -> Option<WcpMetadata> {
    let path = root.join(&config.metadata_file);
    if !path.exists() {
        log::debug!("no {} in package", config.metadata_file);
        return None;
    }

    match read_metadata(&path) {
        Ok(metadata) => {
            log::info!(
                "{}: name={} version={}",
                config.metadata_file,
                metadata.name.as_deref().unwrap_or("-"),
                metadata.version.as_deref().unwrap_or("-"),
            );
            Some(metadata)
        }
        Err(err) => {
            report.add_warning(format!("Could not parse {}: {err}", config.metadata_file));
            None
        }
    }
}

fn check_known_binaries(
    root: &Path,
    bin_dir: &str,
    config: &ValidatorConfig,
    report: &mut ValidationReport,
) {
    let Some(dir) = resolve_within(root, bin_dir).filter(|dir| dir.is_dir()) else {
        return;
    };

    let found: Vec<&str> = config
        .known_binaries
        .iter()
        .map(String::as_str)
        .filter(|binary| dir.join(binary).exists())
        .collect();

    if found.is_empty() {
        report.add_warning(format!(
            "No critical Wine binaries found in {bin_dir}/ (expected at least one of: {})",
            config.known_binaries.join(", ")
        ));
    } else {
        log::info!("found runtime binaries: {}", found.join(", "));
    }
}

fn check_library_subdirs(
    root: &Path,
    lib_dir: &str,
    config: &ValidatorConfig,
    report: &mut ValidationReport,
) {
    let Some(dir) = resolve_within(root, lib_dir).filter(|dir| dir.is_dir()) else {
        return;
    };

    let found = config
        .library_subdirs
        .iter()
        .find(|subdir| has_entries(&dir.join(subdir)));

    if let Some(subdir) = found {
        log::info!("found runtime libraries in {lib_dir}/{subdir}/");
    } else {
        let expected: Vec<String> = config
            .library_subdirs
            .iter()
            .map(|subdir| format!("{lib_dir}/{subdir}/"))
            .collect();
        report.add_warning(format!(
            "No Wine library directories found in {lib_dir}/ (expected {})",
            expected.join(" or ")
        ));
    }
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::schema::validate_profile;
    use crate::test_support::runtime_profile_json;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Tree {
        dir: TempDir,
    }

    impl Tree {
        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn dir(&self, rel: &str) -> &Self {
            fs::create_dir_all(self.path().join(rel)).expect("create dir");
            self
        }

        fn file(&self, rel: &str, contents: &str) -> &Self {
            fs::write(self.path().join(rel), contents).expect("write file");
            self
        }

        fn remove(&self, rel: &str) {
            let path = self.path().join(rel);
            if path.is_dir() {
                fs::remove_dir_all(path).expect("remove dir");
            } else {
                fs::remove_file(path).expect("remove file");
            }
        }
    }

    fn profile(content_type: &str, version_name: &str) -> ContentProfile {
        let json: serde_json::Value =
            serde_json::from_str(&runtime_profile_json(content_type, version_name))
                .expect("fixture json");
        validate_profile(&json).expect("valid profile")
    }

    #[fixture]
    fn tree() -> Tree {
        let tree = Tree {
            dir: tempfile::tempdir().expect("temp dir"),
        };
        tree.file("profile.json", "{}")
            .file("wcp.json", r#"{"name":"Wine","version":"9.0"}"#)
            .dir("bin")
            .file("bin/wine64", "")
            .dir("lib/wine")
            .file("lib/wine/ntdll.so", "")
            .dir("share");
        tree
    }

    #[rstest]
    fn complete_tree_is_silent(tree: Tree) {
        let mut report = ValidationReport::new();
        let metadata = validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert!(report.errors().is_empty());
        assert!(report.warnings().is_empty());
        assert_eq!(
            metadata,
            Some(WcpMetadata {
                name: Some("Wine".to_owned()),
                version: Some("9.0".to_owned()),
            })
        );
    }

    #[rstest]
    fn missing_profile_is_fatal(tree: Tree) {
        tree.remove("profile.json");
        let mut report = ValidationReport::new();

        validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert_eq!(
            report.errors(),
            &["Missing required file at root: profile.json".to_owned()]
        );
    }

    #[rstest]
    fn absent_share_is_advisory(tree: Tree) {
        tree.remove("share");
        let mut report = ValidationReport::new();

        validate_structure(
            tree.path(),
            &profile("Proton", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert!(report.is_passing());
        assert_eq!(
            report.warnings(),
            &["Expected directory not found: share/".to_owned()]
        );
    }

    #[rstest]
    fn unparsable_metadata_is_advisory(tree: Tree) {
        tree.file("wcp.json", "{ not json");
        let mut report = ValidationReport::new();

        let metadata = validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert!(metadata.is_none());
        assert!(report.is_passing());
        assert_eq!(report.warnings().len(), 1);
        assert!(report.warnings()[0].starts_with("Could not parse wcp.json: "));
    }

    #[rstest]
    fn missing_binaries_name_candidates(tree: Tree) {
        tree.remove("bin/wine64");
        let mut report = ValidationReport::new();

        validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert_eq!(
            report.warnings(),
            &["No critical Wine binaries found in bin/ (expected at least one of: wine, wine64, wineserver)"
                .to_owned()]
        );
    }

    #[rstest]
    #[case::empty_subdir(true)]
    #[case::no_subdir(false)]
    fn missing_libraries_warn(tree: Tree, #[case] keep_empty_dir: bool) {
        tree.remove("lib/wine");
        if keep_empty_dir {
            tree.dir("lib/wine");
        }
        let mut report = ValidationReport::new();

        validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert_eq!(
            report.warnings(),
            &["No Wine library directories found in lib/ (expected lib/wine/ or lib/wine64/)"
                .to_owned()]
        );
    }

    #[rstest]
    fn second_library_candidate_is_accepted(tree: Tree) {
        tree.remove("lib/wine");
        tree.dir("lib/wine64").file("lib/wine64/ntdll.so", "");
        let mut report = ValidationReport::new();

        validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert!(report.warnings().is_empty());
    }

    #[rstest]
    fn heuristics_skip_absent_directories(tree: Tree) {
        tree.remove("bin");
        tree.remove("lib");
        let mut report = ValidationReport::new();

        validate_structure(
            tree.path(),
            &profile("Wine", "9.0-x86_64"),
            &ValidatorConfig::default(),
            &mut report,
        );

        assert_eq!(
            report.warnings(),
            &[
                "Expected directory not found: bin/".to_owned(),
                "Expected directory not found: lib/".to_owned(),
            ]
        );
    }
}
