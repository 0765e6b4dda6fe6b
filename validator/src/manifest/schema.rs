//! Schema validation for `profile.json`.
//!
//! Mirrors the checks the host performs when it reads a content profile.
//! Violations accumulate so that a single run reports every schema defect,
//! except that a missing required field stops validation early: later checks
//! would only restate the same absence.

use super::profile::{ContentProfile, ContentType, ProfileSection, RuntimeLayout};
use crate::identifier::{IDENTIFIER_PATTERN, construct_identifier, validate_identifier};
use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level fields every profile must declare, in reporting order.
pub const REQUIRED_FIELDS: &[&str] = &["type", "versionName", "versionCode", "description", "files"];

/// Keys every `wine`/`proton` section must declare, in reporting order.
pub const SECTION_KEYS: &[&str] = &["binPath", "libPath", "prefixPack"];

/// A single schema defect in `profile.json`.
///
/// The `Display` output is the text recorded in the validation report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// The document root is not a JSON object.
    #[error("profile.json root must be an object, got: {found}")]
    NotAnObject {
        /// JSON type of the root value.
        found: &'static str,
    },

    /// A required top-level field is absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The absent field name.
        field: &'static str,
    },

    /// `type` is not one of the accepted content types.
    #[error("Invalid type '{value}'. Must be one of: {allowed}")]
    InvalidType {
        /// The declared type, rendered as text.
        value: String,
        /// Comma-separated accepted types.
        allowed: String,
    },

    /// `versionCode` cannot be coerced to an integer.
    #[error("versionCode must be an integer, got: {raw}")]
    InvalidVersionCode {
        /// The declared value as JSON text.
        raw: String,
    },

    /// `versionName` is not a string.
    #[error("versionName must be a string, got: {found}")]
    InvalidVersionName {
        /// JSON type of the declared value.
        found: &'static str,
    },

    /// `files` is not an array.
    #[error("files must be an array, got: {found}")]
    FilesNotArray {
        /// JSON type of the declared value.
        found: &'static str,
    },

    /// The `wine`/`proton` section required by `type` is absent.
    #[error("Missing required section: {section}")]
    MissingSection {
        /// The section name.
        section: &'static str,
    },

    /// The `wine`/`proton` section is present but not an object.
    #[error("{section} must be an object, got: {found}")]
    SectionNotObject {
        /// The section name.
        section: &'static str,
        /// JSON type of the declared value.
        found: &'static str,
    },

    /// A key required inside the `wine`/`proton` section is absent.
    #[error("Missing {section}.{key}")]
    MissingSectionKey {
        /// The section name.
        section: &'static str,
        /// The absent key.
        key: &'static str,
    },

    /// A section path is present but not a string.
    #[error("{section}.{key} must be a string path, got: {found}")]
    SectionKeyNotString {
        /// The section name.
        section: &'static str,
        /// The offending key.
        key: &'static str,
        /// JSON type of the declared value.
        found: &'static str,
    },

    /// The identifier built from `type` and `versionName` is rejected by the
    /// host's identifier pattern.
    #[error(
        "versionName '{version_name}' (identifier: '{identifier}') does not match identifier pattern: {pattern}"
    )]
    IdentifierMismatch {
        /// The declared version name.
        version_name: String,
        /// The identifier the host would compute.
        identifier: String,
        /// The pattern the identifier failed.
        pattern: &'static str,
    },
}

/// Validate a parsed `profile.json` document.
///
/// Returns the typed profile when the document is schema-valid, or every
/// violation found otherwise.
///
/// # Errors
///
/// Returns the list of [`SchemaViolation`]s when the document is invalid.
///
/// # Examples
///
/// ```
/// use wcp_validator::manifest::schema::validate_profile;
///
/// let doc = serde_json::json!({
///     "type": "DXVK",
///     "versionName": "2.3",
///     "versionCode": 1,
///     "description": "DXVK 2.3",
///     "files": []
/// });
/// let profile = validate_profile(&doc).expect("valid profile");
/// assert_eq!(profile.version_code(), 1);
/// ```
pub fn validate_profile(document: &Value) -> Result<ContentProfile, Vec<SchemaViolation>> {
    let Some(fields) = document.as_object() else {
        return Err(vec![SchemaViolation::NotAnObject {
            found: json_type_name(document),
        }]);
    };

    let missing: Vec<_> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !fields.contains_key(*field))
        .map(|field| SchemaViolation::MissingField { field })
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let mut violations = Vec::new();
    let content_type = check_type(fields, &mut violations);
    let version_code = check_version_code(fields, &mut violations);
    let files = check_files(fields, &mut violations);
    let version_name = check_version_name(fields, &mut violations);

    let layout = content_type
        .and_then(ContentType::section_key)
        .and_then(|section| check_section(fields, section, &mut violations));

    if let (Some(kind), Some(name)) = (content_type, version_name.as_deref()) {
        check_identifier(kind, name, &mut violations);
    }

    match (content_type, version_code, version_name, files) {
        (Some(content_type), Some(version_code), Some(version_name), Some(files))
            if violations.is_empty() =>
        {
            let section = match (content_type.section_key(), layout) {
                (Some(key), Some(layout)) => ProfileSection::WineLike { key, layout },
                _ => ProfileSection::Other,
            };
            Ok(ContentProfile {
                content_type,
                version_name,
                version_code,
                description: fields.get("description").cloned().unwrap_or(Value::Null),
                files,
                section,
            })
        }
        _ => Err(violations),
    }
}

fn check_type(
    fields: &Map<String, Value>,
    violations: &mut Vec<SchemaViolation>,
) -> Option<ContentType> {
    let raw = fields.get("type")?;
    let parsed = raw.as_str().and_then(ContentType::from_name);
    if parsed.is_none() {
        violations.push(SchemaViolation::InvalidType {
            value: display_value(raw),
            allowed: ContentType::allowed_names(),
        });
    }
    parsed
}

fn check_version_code(
    fields: &Map<String, Value>,
    violations: &mut Vec<SchemaViolation>,
) -> Option<i64> {
    let raw = fields.get("versionCode")?;
    let parsed = coerce_integer(raw);
    if parsed.is_none() {
        violations.push(SchemaViolation::InvalidVersionCode {
            raw: display_value(raw),
        });
    }
    parsed
}

fn check_version_name(
    fields: &Map<String, Value>,
    violations: &mut Vec<SchemaViolation>,
) -> Option<String> {
    let raw = fields.get("versionName")?;
    if let Some(name) = raw.as_str() {
        return Some(name.to_owned());
    }
    violations.push(SchemaViolation::InvalidVersionName {
        found: json_type_name(raw),
    });
    None
}

fn check_files(
    fields: &Map<String, Value>,
    violations: &mut Vec<SchemaViolation>,
) -> Option<Vec<Value>> {
    let raw = fields.get("files")?;
    if let Some(entries) = raw.as_array() {
        return Some(entries.clone());
    }
    violations.push(SchemaViolation::FilesNotArray {
        found: json_type_name(raw),
    });
    None
}

fn check_section(
    fields: &Map<String, Value>,
    section: &'static str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<RuntimeLayout> {
    let Some(raw) = fields.get(section) else {
        violations.push(SchemaViolation::MissingSection { section });
        return None;
    };
    let Some(entries) = raw.as_object() else {
        violations.push(SchemaViolation::SectionNotObject {
            section,
            found: json_type_name(raw),
        });
        return None;
    };

    let mut paths = Vec::with_capacity(SECTION_KEYS.len());
    for &key in SECTION_KEYS {
        match entries.get(key) {
            None => violations.push(SchemaViolation::MissingSectionKey { section, key }),
            Some(Value::String(path)) => paths.push(path.clone()),
            Some(other) => violations.push(SchemaViolation::SectionKeyNotString {
                section,
                key,
                found: json_type_name(other),
            }),
        }
    }

    let [bin_path, lib_path, prefix_pack]: [String; 3] = paths.try_into().ok()?;
    Some(RuntimeLayout {
        bin_path,
        lib_path,
        prefix_pack,
    })
}

fn check_identifier(
    content_type: ContentType,
    version_name: &str,
    violations: &mut Vec<SchemaViolation>,
) {
    if content_type.section_key().is_none() {
        return;
    }
    let identifier = construct_identifier(content_type.as_str(), version_name);
    if validate_identifier(&identifier).is_err() {
        violations.push(SchemaViolation::IdentifierMismatch {
            version_name: version_name.to_owned(),
            identifier,
            pattern: IDENTIFIER_PATTERN,
        });
    }
}

/// Coerce a JSON value to an integer the way the host's JSON reader does.
///
/// Integers are taken as-is, finite floats are truncated towards zero, and
/// strings are accepted when their trimmed content parses as a signed
/// integer. Booleans, nulls, arrays and objects are rejected.
pub(crate) fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Return the JSON type name used in violation messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a value for a message: strings unquoted, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
