//! Runtime identifier grammar.
//!
//! The host application resolves every Wine or Proton package to a canonical
//! identifier such as `proton-8.0-x86_64` or `wine-9.0-1-arm64ec` and rejects
//! packages whose identifier does not match a fixed pattern. This module
//! reproduces both halves of that contract: building the identifier from a
//! manifest's `type` and `versionName`, and parsing it against the pattern.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// The identifier pattern the host application accepts.
///
/// The family literal accepts `wine`, `proton` and `Proton`. The optional
/// second numeric group lets `proton-8.0-x86_64` and `proton-8.0-21-x86_64`
/// both match.
pub const IDENTIFIER_PATTERN: &str =
    r"^(wine|proton|Proton)-([0-9.]+)-?([0-9.]+)?-(x86|x86_64|arm64ec)$";

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(IDENTIFIER_PATTERN)
        .unwrap_or_else(|error| panic!("identifier pattern must compile: {error}"))
});

/// Errors arising from identifier parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier does not match [`IDENTIFIER_PATTERN`].
    #[error("identifier \"{value}\" does not match pattern {pattern}")]
    PatternMismatch {
        /// The rejected identifier.
        value: String,
        /// The pattern it was checked against.
        pattern: &'static str,
    },
}

/// Runtime family named by the first identifier component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFamily {
    /// Upstream Wine builds.
    Wine,
    /// Proton builds.
    Proton,
}

impl RuntimeFamily {
    /// Return the normalised lower-case family name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wine => "wine",
            Self::Proton => "proton",
        }
    }
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture named by the final identifier component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    X86_64,
    /// ARM64 emulation-compatible.
    Arm64ec,
}

impl Architecture {
    /// Return the architecture token as it appears in identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Arm64ec => "arm64ec",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "x86" => Some(Self::X86),
            "x86_64" => Some(Self::X86_64),
            "arm64ec" => Some(Self::Arm64ec),
            _ => None,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed runtime identifier.
///
/// Only identifiers that match [`IDENTIFIER_PATTERN`] can be constructed, so
/// a value of this type always carries every parsed component.
///
/// # Examples
///
/// ```
/// use wcp_validator::identifier::{Architecture, RuntimeFamily, RuntimeIdentifier};
///
/// let id = RuntimeIdentifier::try_from("Proton-8.0-21-x86_64").expect("valid identifier");
/// assert_eq!(id.family(), RuntimeFamily::Proton);
/// assert_eq!(id.version(), "8.0");
/// assert_eq!(id.subversion(), Some("21"));
/// assert_eq!(id.arch(), Architecture::X86_64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeIdentifier {
    family: RuntimeFamily,
    version: String,
    subversion: Option<String>,
    arch: Architecture,
}

impl RuntimeIdentifier {
    /// Return the runtime family, normalised to lower case.
    #[must_use]
    pub const fn family(&self) -> RuntimeFamily {
        self.family
    }

    /// Return the primary version token.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the optional subversion token.
    #[must_use]
    pub fn subversion(&self) -> Option<&str> {
        self.subversion.as_deref()
    }

    /// Return the architecture.
    #[must_use]
    pub const fn arch(&self) -> Architecture {
        self.arch
    }
}

impl TryFrom<&str> for RuntimeIdentifier {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_identifier(value)
    }
}

impl fmt::Display for RuntimeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.family, self.version)?;
        if let Some(subversion) = &self.subversion {
            write!(f, "-{subversion}")?;
        }
        write!(f, "-{}", self.arch)
    }
}

/// Parse `identifier` against [`IDENTIFIER_PATTERN`].
///
/// # Errors
///
/// Returns [`IdentifierError::PatternMismatch`] when the whole string does
/// not match the pattern.
pub fn validate_identifier(identifier: &str) -> Result<RuntimeIdentifier, IdentifierError> {
    let mismatch = || IdentifierError::PatternMismatch {
        value: identifier.to_owned(),
        pattern: IDENTIFIER_PATTERN,
    };

    let captures = IDENTIFIER_RE.captures(identifier).ok_or_else(mismatch)?;

    let family = match captures.get(1).map(|m| m.as_str()) {
        Some("wine") => RuntimeFamily::Wine,
        Some("proton" | "Proton") => RuntimeFamily::Proton,
        _ => return Err(mismatch()),
    };
    let version = captures.get(2).ok_or_else(mismatch)?.as_str().to_owned();
    let subversion = captures.get(3).map(|m| m.as_str().to_owned());
    let arch = captures
        .get(4)
        .and_then(|m| Architecture::from_token(m.as_str()))
        .ok_or_else(mismatch)?;

    Ok(RuntimeIdentifier {
        family,
        version,
        subversion,
        arch,
    })
}

/// Build the identifier the host derives from a manifest's `type` and
/// `versionName`.
///
/// A `versionName` that already starts with the lower-cased type followed by
/// a hyphen is returned unchanged; otherwise the prefix is prepended.
///
/// # Examples
///
/// ```
/// use wcp_validator::identifier::construct_identifier;
///
/// assert_eq!(construct_identifier("Proton", "8.0-x86_64"), "proton-8.0-x86_64");
/// assert_eq!(construct_identifier("Proton", "proton-8.0-x86_64"), "proton-8.0-x86_64");
/// ```
#[must_use]
pub fn construct_identifier(type_name: &str, version_name: &str) -> String {
    let prefix = format!("{}-", type_name.to_lowercase());
    if version_name.starts_with(&prefix) {
        version_name.to_owned()
    } else {
        format!("{prefix}{version_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::proton("proton-8.0-x86_64", RuntimeFamily::Proton, "8.0", None, Architecture::X86_64)]
    #[case::capital_proton("Proton-9.0-x86", RuntimeFamily::Proton, "9.0", None, Architecture::X86)]
    #[case::wine_subversion(
        "wine-9.0-1-arm64ec",
        RuntimeFamily::Wine,
        "9.0",
        Some("1"),
        Architecture::Arm64ec
    )]
    #[case::dotted_subversion(
        "proton-8.0-21.3-x86_64",
        RuntimeFamily::Proton,
        "8.0",
        Some("21.3"),
        Architecture::X86_64
    )]
    #[case::single_number("wine-10-x86", RuntimeFamily::Wine, "10", None, Architecture::X86)]
    fn parses_matching_identifiers(
        #[case] input: &str,
        #[case] family: RuntimeFamily,
        #[case] version: &str,
        #[case] subversion: Option<&str>,
        #[case] arch: Architecture,
    ) {
        let id = validate_identifier(input).expect("identifier should match");
        assert_eq!(id.family(), family);
        assert_eq!(id.version(), version);
        assert_eq!(id.subversion(), subversion);
        assert_eq!(id.arch(), arch);
    }

    #[rstest]
    #[case::wrong_arch("proton-8.0-arm64")]
    #[case::missing_arch("proton-8.0")]
    #[case::trailing_text("proton-8.0-x86_64-extra")]
    #[case::leading_text("my-proton-8.0-x86_64")]
    #[case::capital_wine("Wine-8.0-x86")]
    #[case::unknown_family("dxvk-2.3-x86_64")]
    #[case::letters_in_version("wine-9.0rc1-x86")]
    #[case::empty("")]
    fn rejects_non_matching_identifiers(#[case] input: &str) {
        let err = validate_identifier(input).expect_err("identifier should not match");
        assert_eq!(
            err,
            IdentifierError::PatternMismatch {
                value: input.to_owned(),
                pattern: IDENTIFIER_PATTERN,
            }
        );
    }

    #[test]
    fn normalises_family_in_display() {
        let id = RuntimeIdentifier::try_from("Proton-8.0-21-x86_64").expect("valid");
        assert_eq!(id.to_string(), "proton-8.0-21-x86_64");
    }

    #[rstest]
    #[case::bare_version("Wine", "9.0-x86_64", "wine-9.0-x86_64")]
    #[case::already_prefixed("Wine", "wine-9.0-x86_64", "wine-9.0-x86_64")]
    #[case::proton_bare("Proton", "8.0-21-arm64ec", "proton-8.0-21-arm64ec")]
    #[case::capitalised_prefix_not_recognised("Proton", "Proton-8.0-x86", "proton-Proton-8.0-x86")]
    fn constructs_identifiers(#[case] type_name: &str, #[case] version: &str, #[case] want: &str) {
        assert_eq!(construct_identifier(type_name, version), want);
    }

    #[rstest]
    #[case("Wine", "9.0-x86_64")]
    #[case("Proton", "proton-8.0-x86")]
    #[case("Proton", "")]
    #[case("DXVK", "2.3")]
    fn construction_is_idempotent(#[case] type_name: &str, #[case] version: &str) {
        let once = construct_identifier(type_name, version);
        let twice = construct_identifier(type_name, &once);
        assert_eq!(once, twice);
    }
}
