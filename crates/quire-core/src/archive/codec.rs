//! The codec seam between raw archive bytes and [`Archive`] handles.
//!
//! Two containers are supported: zip ([`ZipCodec`]), which is what `.docx` files are,
//! and a deterministic tar.gz ([`TarGzCodec`]). [`ArchiveFormat`] picks one, either from
//! configuration or from the file name. Every codec applies the same [`ArchiveLimits`]
//! and part path rules.

use super::limits::ArchiveLimits;
use super::tar_gz::TarGzCodec;
use super::zip_codec::ZipCodec;
use super::{Archive, ArchiveError};
use serde::Deserialize;

/// Compression applied when serializing an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    Store,
    #[default]
    Deflate,
}

/// Builds archive handles from raw bytes and serializes them back.
pub trait ArchiveCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Archive, ArchiveError>;

    fn encode(&self, archive: &Archive, compression: Compression) -> Result<Vec<u8>, ArchiveError>;
}

/// Container format of an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    #[default]
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Format implied by a file name: `.tar.gz` and `.tgz` are tar.gz, everything else
    /// (`.docx`, `.pptx`, `.zip`, ...) is zip.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else {
            ArchiveFormat::Zip
        }
    }

    pub fn codec(self, limits: ArchiveLimits) -> FormatCodec {
        match self {
            ArchiveFormat::Zip => FormatCodec::Zip(ZipCodec::with_limits(limits)),
            ArchiveFormat::TarGz => FormatCodec::TarGz(TarGzCodec::with_limits(limits)),
        }
    }
}

/// A codec chosen at runtime from an [`ArchiveFormat`].
#[derive(Debug, Clone, Copy)]
pub enum FormatCodec {
    Zip(ZipCodec),
    TarGz(TarGzCodec),
}

impl FormatCodec {
    pub fn format(&self) -> ArchiveFormat {
        match self {
            FormatCodec::Zip(_) => ArchiveFormat::Zip,
            FormatCodec::TarGz(_) => ArchiveFormat::TarGz,
        }
    }
}

impl Default for FormatCodec {
    fn default() -> Self {
        ArchiveFormat::default().codec(ArchiveLimits::default())
    }
}

impl ArchiveCodec for FormatCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Archive, ArchiveError> {
        match self {
            FormatCodec::Zip(codec) => codec.decode(bytes),
            FormatCodec::TarGz(codec) => codec.decode(bytes),
        }
    }

    fn encode(&self, archive: &Archive, compression: Compression) -> Result<Vec<u8>, ArchiveError> {
        match self {
            FormatCodec::Zip(codec) => codec.encode(archive, compression),
            FormatCodec::TarGz(codec) => codec.encode(archive, compression),
        }
    }
}

/// Rejects empty, absolute, backslashed or `..` part paths and paths over the limit.
/// A trailing `/` (directory marker) is ignored.
pub(crate) fn check_part_path(path: &str, limits: &ArchiveLimits) -> Result<(), ArchiveError> {
    let path = path.trim_end_matches('/');
    if path.len() > limits.max_path_len {
        return Err(ArchiveError::PathTooLong {
            path: path.to_string(),
            limit: limits.max_path_len,
        });
    }
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|c| c == "..");
    if invalid {
        return Err(ArchiveError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Fails once more than `max_archive_bytes` of raw input is offered.
pub(crate) fn check_archive_size(bytes: &[u8], limits: &ArchiveLimits) -> Result<(), ArchiveError> {
    if bytes.len() as u64 > limits.max_archive_bytes {
        return Err(ArchiveError::ArchiveTooLarge {
            size: bytes.len() as u64,
            limit: limits.max_archive_bytes,
        });
    }
    Ok(())
}
