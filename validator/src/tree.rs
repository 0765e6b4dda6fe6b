//! File-tree checks for the paths a Wine or Proton section declares.
//!
//! All three declared paths are checked on every run so a single pass
//! reports every missing piece.

use crate::manifest::profile::{ContentProfile, RuntimeLayout};
use crate::report::ValidationReport;
use std::path::{Component, Path, PathBuf};

/// Declared paths that resolved to the expected kind of filesystem entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeCheck {
    /// Resolved `binPath`, when it is a directory.
    pub bin_dir: Option<PathBuf>,
    /// Resolved `libPath`, when it is a directory.
    pub lib_dir: Option<PathBuf>,
    /// Resolved `prefixPack`, when it is a regular file.
    pub prefix_pack: Option<PathBuf>,
}

#[derive(Clone, Copy)]
enum Expected {
    Directory,
    File,
}

impl Expected {
    fn matches(self, path: &Path) -> bool {
        match self {
            Self::Directory => path.is_dir(),
            Self::File => path.is_file(),
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            Self::Directory => "a directory",
            Self::File => "a file",
        }
    }
}

/// Check the declared layout of a Wine or Proton profile against `root`.
///
/// Profiles without a runtime section are not checked and yield an empty
/// [`TreeCheck`].
pub fn validate_tree(
    root: &Path,
    profile: &ContentProfile,
    report: &mut ValidationReport,
) -> TreeCheck {
    let Some((section, layout)) = profile.runtime_layout() else {
        log::info!(
            "skipping file-tree checks for {} content",
            profile.content_type()
        );
        return TreeCheck::default();
    };
    validate_layout(root, section, layout, report)
}

/// Check each path in `layout` independently.
pub fn validate_layout(
    root: &Path,
    section: &str,
    layout: &RuntimeLayout,
    report: &mut ValidationReport,
) -> TreeCheck {
    TreeCheck {
        bin_dir: check_entry(
            root,
            section,
            "binPath",
            &layout.bin_path,
            Expected::Directory,
            report,
        ),
        lib_dir: check_entry(
            root,
            section,
            "libPath",
            &layout.lib_path,
            Expected::Directory,
            report,
        ),
        prefix_pack: check_entry(
            root,
            section,
            "prefixPack",
            &layout.prefix_pack,
            Expected::File,
            report,
        ),
    }
}

fn check_entry(
    root: &Path,
    section: &str,
    key: &str,
    declared: &str,
    expected: Expected,
    report: &mut ValidationReport,
) -> Option<PathBuf> {
    let Some(resolved) = resolve_within(root, declared) else {
        report.add_error(format!(
            "{section}.{key} '{declared}' must be a relative path inside the package"
        ));
        return None;
    };
    log::debug!("{section}.{key} resolves to {}", resolved.display());

    if expected.matches(&resolved) {
        log::info!("{section}.{key} '{declared}' exists");
        Some(resolved)
    } else {
        report.add_error(format!(
            "{section}.{key} '{declared}' is not {}",
            expected.noun()
        ));
        None
    }
}

/// Join `declared` onto `root`, refusing paths that could leave it.
#[must_use]
pub(crate) fn resolve_within(root: &Path, declared: &str) -> Option<PathBuf> {
    let relative = Path::new(declared);
    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    (!escapes).then(|| root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    fn layout() -> RuntimeLayout {
        RuntimeLayout {
            bin_path: "bin".to_owned(),
            lib_path: "lib".to_owned(),
            prefix_pack: "prefixPack.txz".to_owned(),
        }
    }

    #[fixture]
    fn complete_root() -> TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir(dir.path().join("bin")).expect("bin");
        fs::create_dir(dir.path().join("lib")).expect("lib");
        fs::write(dir.path().join("prefixPack.txz"), b"").expect("prefix");
        dir
    }

    #[rstest]
    fn complete_layout_has_no_errors(complete_root: TempDir) {
        let mut report = ValidationReport::new();
        let check = validate_layout(complete_root.path(), "wine", &layout(), &mut report);

        assert!(report.is_passing());
        assert!(check.bin_dir.is_some());
        assert!(check.lib_dir.is_some());
        assert_eq!(
            check.prefix_pack,
            Some(complete_root.path().join("prefixPack.txz"))
        );
    }

    #[rstest]
    fn missing_bin_names_field_and_path(complete_root: TempDir) {
        fs::remove_dir(complete_root.path().join("bin")).expect("remove bin");
        let mut report = ValidationReport::new();
        validate_layout(complete_root.path(), "proton", &layout(), &mut report);

        assert_eq!(
            report.errors(),
            &["proton.binPath 'bin' is not a directory".to_owned()]
        );
    }

    #[test]
    fn every_failure_is_reported() {
        let empty = tempfile::tempdir().expect("temp dir");
        let mut report = ValidationReport::new();
        let check = validate_layout(empty.path(), "wine", &layout(), &mut report);

        assert_eq!(check, TreeCheck::default());
        assert_eq!(
            report.errors(),
            &[
                "wine.binPath 'bin' is not a directory".to_owned(),
                "wine.libPath 'lib' is not a directory".to_owned(),
                "wine.prefixPack 'prefixPack.txz' is not a file".to_owned(),
            ]
        );
    }

    #[rstest]
    fn kinds_are_enforced(complete_root: TempDir) {
        fs::remove_dir(complete_root.path().join("lib")).expect("remove lib");
        fs::write(complete_root.path().join("lib"), b"not a dir").expect("lib file");
        fs::remove_file(complete_root.path().join("prefixPack.txz")).expect("remove prefix");
        fs::create_dir(complete_root.path().join("prefixPack.txz")).expect("prefix dir");
        let mut report = ValidationReport::new();

        validate_layout(complete_root.path(), "wine", &layout(), &mut report);

        assert_eq!(report.errors().len(), 2);
        assert!(report.errors()[0].starts_with("wine.libPath 'lib'"));
        assert!(report.errors()[1].starts_with("wine.prefixPack 'prefixPack.txz'"));
    }

    #[rstest]
    #[case::parent("../bin")]
    #[case::absolute("/usr/bin")]
    fn escaping_paths_are_errors(complete_root: TempDir, #[case] declared: &str) {
        let mut report = ValidationReport::new();
        let escaping = RuntimeLayout {
            bin_path: declared.to_owned(),
            ..layout()
        };

        let check = validate_layout(complete_root.path(), "wine", &escaping, &mut report);

        assert!(check.bin_dir.is_none());
        assert_eq!(report.errors().len(), 1);
        assert!(report.errors()[0].contains("must be a relative path"));
    }

    #[rstest]
    #[case::plain("bin", true)]
    #[case::nested("opt/wine/bin", true)]
    #[case::dotted("./bin", true)]
    #[case::parent("bin/../../etc", false)]
    fn resolves_only_contained_paths(#[case] declared: &str, #[case] contained: bool) {
        assert_eq!(
            resolve_within(Path::new("/scratch"), declared).is_some(),
            contained
        );
    }
}
