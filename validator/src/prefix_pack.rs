//! Content checks for the nested prefix archive.
//!
//! The host unpacks `prefixPack` into a container's home directory and
//! expects it to produce the `.wine/` prefix. Member names are read straight
//! from the xz-compressed tar stream; nothing is written to disk.

use crate::config::ValidatorConfig;
use crate::report::ValidationReport;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors raised while listing the prefix archive.
#[derive(Debug, Error)]
pub enum PrefixPackError {
    /// The archive could not be opened, decompressed, or parsed.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Summary of a scan over the member names of a prefix archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixVerdict {
    /// Number of members scanned.
    pub member_count: usize,
    /// Whether any member lives under the prefix marker.
    pub has_rooted_member: bool,
    /// The first non-conforming member names, up to the sample limit.
    pub offenders: Vec<String>,
}

impl PrefixVerdict {
    /// Return true when the archive has no members.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.member_count == 0
    }

    /// Return true when the archive would unpack into the prefix.
    ///
    /// An archive fails only when nothing is rooted under the marker and at
    /// least one member lies outside it.
    #[must_use]
    pub fn is_conforming(&self) -> bool {
        self.has_rooted_member || self.offenders.is_empty()
    }
}

/// Classify `members` against the configured markers.
///
/// A member conforms when it equals the root marker, starts with `./`, or
/// starts with the prefix marker. The marker directory itself (without its
/// trailing slash) counts as rooted.
#[must_use]
pub fn check_members<I, S>(members: I, config: &ValidatorConfig) -> PrefixVerdict
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let marker_dir = config.prefix_marker.trim_end_matches('/');
    let mut verdict = PrefixVerdict::default();

    for member in members {
        let name = member.as_ref();
        verdict.member_count += 1;
        log::trace!("prefix member {name}");

        if name.starts_with(&config.prefix_marker) || name == marker_dir {
            verdict.has_rooted_member = true;
        } else if name != config.root_marker
            && !name.starts_with("./")
            && verdict.offenders.len() < config.sample_limit
        {
            verdict.offenders.push(name.to_owned());
        }
    }

    verdict
}

/// List member names of the xz-compressed tar at `path`.
///
/// Directory names lose their trailing slash.
///
/// # Errors
///
/// Returns [`PrefixPackError::Io`] when the file cannot be opened or the
/// stream is not a valid xz-compressed tar archive.
pub fn read_members(path: &Path) -> Result<Vec<String>, PrefixPackError> {
    let file = File::open(path)?;
    let decoder = xz2::read::XzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);
    let mut members = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let name = if entry.header().entry_type().is_dir() {
            raw.trim_end_matches('/').to_owned()
        } else {
            raw
        };
        members.push(name);
    }

    Ok(members)
}

/// Scan the prefix archive at `path` and record the outcome in `report`.
///
/// `declared` is the path as written in the profile and is used in
/// messages.
pub fn validate_prefix_pack(
    path: &Path,
    declared: &str,
    config: &ValidatorConfig,
    report: &mut ValidationReport,
) {
    let members = match read_members(path) {
        Ok(members) => members,
        Err(err) => {
            report.add_error(format!("Error reading prefixPack '{declared}': {err}"));
            return;
        }
    };

    let verdict = check_members(&members, config);
    if verdict.is_empty() {
        report.add_warning(format!("prefixPack '{declared}' is empty"));
        return;
    }

    if verdict.is_conforming() {
        log::info!(
            "prefixPack contains {} entries rooted under {}",
            verdict.member_count,
            config.prefix_marker
        );
    } else {
        report.add_error(format!(
            "prefixPack must extract to {marker} subdirectory. \
             Found paths without {marker} prefix: {sample:?}",
            marker = config.prefix_marker,
            sample = verdict.offenders,
        ));
    }
}
