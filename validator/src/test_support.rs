//! Fixture builders for package and prefix-archive tests.
//!
//! Archives are written entry by entry with raw header names so tests control
//! member paths exactly, including `./`-rooted and directory paths with a
//! trailing slash.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Compression applied to a fixture archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureCodec {
    /// Zstandard, the host's preferred package codec.
    Zstd,
    /// XZ, the legacy codec.
    Xz,
    /// No compression.
    Plain,
}

#[derive(Debug, Clone)]
enum FixtureEntry {
    Dir(String),
    File { path: String, contents: Vec<u8>, mode: u32 },
}

impl FixtureEntry {
    fn path(&self) -> &str {
        match self {
            Self::Dir(path) | Self::File { path, .. } => path,
        }
    }
}

/// An ordered list of tar entries.
#[derive(Debug, Clone, Default)]
pub struct TarFixture {
    entries: Vec<FixtureEntry>,
}

impl TarFixture {
    /// Create an empty fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory entry. The name is written verbatim.
    #[must_use]
    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push(FixtureEntry::Dir(path.to_owned()));
        self
    }

    /// Append a regular file entry with mode `0644`.
    #[must_use]
    pub fn file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.entries.push(FixtureEntry::File {
            path: path.to_owned(),
            contents: contents.into(),
            mode: 0o644,
        });
        self
    }

    /// Append an executable file entry with mode `0755`.
    #[must_use]
    pub fn executable(mut self, path: &str) -> Self {
        self.entries.push(FixtureEntry::File {
            path: path.to_owned(),
            contents: b"#!/bin/sh\n".to_vec(),
            mode: 0o755,
        });
        self
    }

    /// Remove `path` and everything beneath it.
    #[must_use]
    pub fn without(mut self, path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let nested = format!("{trimmed}/");
        self.entries.retain(|entry| {
            let name = entry.path();
            name != trimmed && !name.starts_with(&nested)
        });
        self
    }

    /// Replace the contents of the file at `path`, appending it if absent.
    #[must_use]
    pub fn replace_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.without(path).file(path, contents)
    }

    /// Serialise the entries as an uncompressed tar stream.
    ///
    /// # Errors
    ///
    /// Returns an error when a member name exceeds the 100-byte header field
    /// or the stream cannot be written.
    pub fn to_tar_bytes(&self) -> io::Result<Vec<u8>> {
        let mut builder = tar::Builder::new(Vec::new());
        for entry in &self.entries {
            let (kind, data, mode): (tar::EntryType, &[u8], u32) = match entry {
                FixtureEntry::Dir(_) => (tar::EntryType::Directory, &[], 0o755),
                FixtureEntry::File { contents, mode, .. } => {
                    (tar::EntryType::Regular, contents.as_slice(), *mode)
                }
            };
            let header = raw_header(entry.path(), kind, data.len(), mode)?;
            builder.append(&header, data)?;
        }
        builder.into_inner()
    }

    /// Serialise the entries with `codec` compression.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::to_tar_bytes`] or the encoder.
    pub fn to_bytes(&self, codec: FixtureCodec) -> io::Result<Vec<u8>> {
        let tar = self.to_tar_bytes()?;
        match codec {
            FixtureCodec::Plain => Ok(tar),
            FixtureCodec::Zstd => zstd::encode_all(tar.as_slice(), 0),
            FixtureCodec::Xz => {
                let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
                encoder.write_all(&tar)?;
                encoder.finish()
            }
        }
    }

    /// Write the compressed archive to `dest`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::to_bytes`] or from writing the file.
    pub fn write_to(&self, codec: FixtureCodec, dest: &Path) -> io::Result<()> {
        let bytes = self.to_bytes(codec)?;
        let mut file = File::create(dest)?;
        file.write_all(&bytes)?;
        file.sync_all()
    }
}

/// Build a GNU header whose name field holds `name` byte for byte.
fn raw_header(
    name: &str,
    kind: tar::EntryType,
    size: usize,
    mode: u32,
) -> io::Result<tar::Header> {
    let mut header = tar::Header::new_gnu();
    let slot = &mut header.as_old_mut().name;
    let bytes = name.as_bytes();
    if bytes.len() >= slot.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("fixture member name too long: {name}"),
        ));
    }
    for (dst, src) in slot.iter_mut().zip(bytes) {
        *dst = *src;
    }
    header.set_entry_type(kind);
    header.set_size(size as u64);
    header.set_mode(mode);
    header.set_mtime(0);
    header.set_cksum();
    Ok(header)
}

/// Render a Wine or Proton `profile.json` declaring the standard layout.
#[must_use]
pub fn runtime_profile_json(content_type: &str, version_name: &str) -> String {
    let section = content_type.to_lowercase();
    serde_json::json!({
        "type": content_type,
        "versionName": version_name,
        "versionCode": 1,
        "description": format!("{content_type} {version_name}"),
        "files": [],
        section: {
            "binPath": "bin",
            "libPath": "lib",
            "prefixPack": "prefixPack.txz"
        }
    })
    .to_string()
}

/// A prefix archive whose members all live under `.wine/`.
#[must_use]
pub fn rooted_prefix_pack() -> TarFixture {
    TarFixture::new()
        .dir(".wine/")
        .dir(".wine/drive_c/")
        .file(".wine/system.reg", "WINE REGISTRY Version 2\n")
        .file(".wine/user.reg", "WINE REGISTRY Version 2\n")
}

/// A package tree that satisfies every check without warnings.
///
/// # Errors
///
/// Returns an error when the nested prefix archive cannot be encoded.
pub fn well_formed_package(content_type: &str, version_name: &str) -> io::Result<TarFixture> {
    let prefix = rooted_prefix_pack().to_bytes(FixtureCodec::Xz)?;
    Ok(TarFixture::new()
        .file("profile.json", runtime_profile_json(content_type, version_name))
        .file(
            "wcp.json",
            format!(r#"{{"name":"{content_type}","version":"{version_name}"}}"#),
        )
        .dir("bin/")
        .executable("bin/wine")
        .executable("bin/wineserver")
        .dir("lib/")
        .dir("lib/wine/")
        .file("lib/wine/ntdll.so", "ELF")
        .dir("share/")
        .dir("share/wine/")
        .file("prefixPack.txz", prefix))
}
