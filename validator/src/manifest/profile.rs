//! Typed model of a validated `profile.json`.
//!
//! Instances are only produced by [`super::schema::validate_profile`], so
//! every value here already satisfies the schema. The type-conditional
//! `wine`/`proton` section is carried as a [`ProfileSection`] variant rather
//! than looked up from raw JSON at each use site.

use crate::identifier::construct_identifier;
use serde::Serialize;
use std::fmt;

/// Runtime component kinds the host application understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentType {
    /// Wine runtime.
    Wine,
    /// Proton runtime.
    Proton,
    /// DXVK translation layer.
    #[serde(rename = "DXVK")]
    Dxvk,
    /// VKD3D translation layer.
    #[serde(rename = "VKD3D")]
    Vkd3d,
    /// Box64 emulator.
    Box64,
    /// Box64 built for WoW64.
    #[serde(rename = "WOWBox64")]
    WowBox64,
    /// FEX-Emu core.
    #[serde(rename = "FEXCore")]
    FexCore,
}

impl ContentType {
    /// Every accepted content type, in the order they are reported.
    pub const ALL: &'static [Self] = &[
        Self::Wine,
        Self::Proton,
        Self::Dxvk,
        Self::Vkd3d,
        Self::Box64,
        Self::WowBox64,
        Self::FexCore,
    ];

    /// Return the name as written in `profile.json`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wine => "Wine",
            Self::Proton => "Proton",
            Self::Dxvk => "DXVK",
            Self::Vkd3d => "VKD3D",
            Self::Box64 => "Box64",
            Self::WowBox64 => "WOWBox64",
            Self::FexCore => "FEXCore",
        }
    }

    /// Look up a content type by its exact manifest spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// Return the name of the type-conditional section, if this type has one.
    #[must_use]
    pub const fn section_key(self) -> Option<&'static str> {
        match self {
            Self::Wine => Some("wine"),
            Self::Proton => Some("proton"),
            _ => None,
        }
    }

    /// Return a comma-separated list of every accepted type name.
    #[must_use]
    pub fn allowed_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths declared by a Wine or Proton section, relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeLayout {
    /// Directory holding the runtime executables.
    pub bin_path: String,
    /// Directory holding the runtime libraries.
    pub lib_path: String,
    /// Nested archive holding the pre-built prefix.
    pub prefix_pack: String,
}

/// The type-conditional part of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSection {
    /// A `wine` or `proton` section with its declared layout.
    WineLike {
        /// The section key (`wine` or `proton`).
        key: &'static str,
        /// The declared paths.
        layout: RuntimeLayout,
    },
    /// Content types with no type-specific section.
    Other,
}

/// A schema-valid `profile.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentProfile {
    pub(crate) content_type: ContentType,
    pub(crate) version_name: String,
    pub(crate) version_code: i64,
    pub(crate) description: serde_json::Value,
    pub(crate) files: Vec<serde_json::Value>,
    pub(crate) section: ProfileSection,
}

impl ContentProfile {
    /// Return the content type.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Return the declared version name.
    #[must_use]
    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    /// Return the version code after integer coercion.
    #[must_use]
    pub const fn version_code(&self) -> i64 {
        self.version_code
    }

    /// Return the raw description value.
    #[must_use]
    pub const fn description(&self) -> &serde_json::Value {
        &self.description
    }

    /// Return the declared file entries.
    #[must_use]
    pub fn files(&self) -> &[serde_json::Value] {
        &self.files
    }

    /// Return the type-conditional section.
    #[must_use]
    pub const fn section(&self) -> &ProfileSection {
        &self.section
    }

    /// Return the section key and declared layout for Wine and Proton
    /// profiles.
    #[must_use]
    pub const fn runtime_layout(&self) -> Option<(&'static str, &RuntimeLayout)> {
        match &self.section {
            ProfileSection::WineLike { key, layout } => Some((*key, layout)),
            ProfileSection::Other => None,
        }
    }

    /// Return the identifier the host derives for Wine and Proton profiles.
    #[must_use]
    pub fn identifier(&self) -> Option<String> {
        self.content_type
            .section_key()
            .map(|_| construct_identifier(self.content_type.as_str(), &self.version_name))
    }
}
