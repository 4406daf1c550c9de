//! In-memory archive model and codecs.
//!
//! An [`Archive`] is an insertion-ordered collection of uniquely named [`Part`]s.
//! Codecs turn raw bytes into archives and back:
//!
//! - [`codec`]: the [`ArchiveCodec`] seam and [`ArchiveFormat`] selection
//! - [`zip_codec`]: zip containers (`.docx`)
//! - [`tar_gz`]: deterministic tar.gz
//! - [`limits`]: resource limits applied while decoding

pub mod codec;
pub mod limits;
pub mod tar_gz;
pub mod zip_codec;

pub use codec::{ArchiveCodec, ArchiveFormat, Compression, FormatCodec};
pub use limits::{ArchiveLimits, ArchiveLimitsOverrides};
pub use tar_gz::TarGzCodec;
pub use zip_codec::ZipCodec;

use bytes::Bytes;
use std::borrow::Cow;
use std::collections::HashMap;
use thiserror::Error;

/// Path of the main document part inside a generated archive.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Errors raised while decoding or encoding archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid part path: {path}")]
    InvalidPath { path: String },

    #[error("part path exceeds {limit} bytes: {path}")]
    PathTooLong { path: String, limit: usize },

    #[error("archive of {size} bytes exceeds limit of {limit} bytes")]
    ArchiveTooLarge { size: u64, limit: u64 },

    #[error("part {path} exceeds limit of {limit} bytes")]
    PartTooLarge { path: String, limit: u64 },

    #[error("duplicate part in archive: {path}")]
    DuplicatePart { path: String },

    #[error("unsupported entry type for {path}")]
    UnsupportedEntry { path: String },
}

/// A single named entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    is_dir: bool,
    content: Bytes,
}

impl Part {
    pub fn file(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            content: content.into(),
        }
    }

    /// Directory part. The name is canonicalized to end with `/`.
    pub fn dir(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self {
            name,
            is_dir: true,
            content: Bytes::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content decoded as UTF-8, replacing invalid sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Insertion-ordered collection of parts with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    parts: Vec<Part>,
    index: HashMap<String, usize>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an archive from parts. A later part replaces an earlier one with the same name.
    pub fn from_parts(parts: impl IntoIterator<Item = Part>) -> Self {
        let mut archive = Self::new();
        for part in parts {
            archive.insert(part);
        }
        archive
    }

    /// Insert a part, replacing any existing part with the same name in place.
    /// Returns the replaced part.
    pub fn insert(&mut self, part: Part) -> Option<Part> {
        match self.index.get(&part.name) {
            Some(&i) => Some(std::mem::replace(&mut self.parts[i], part)),
            None => {
                self.index.insert(part.name.clone(), self.parts.len());
                self.parts.push(part);
                None
            }
        }
    }

    /// Convenience for `insert(Part::file(..))`.
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<Bytes>) -> &mut Self {
        self.insert(Part::file(name, content));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.index.get(name).map(|&i| &self.parts[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Parts in insertion order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Single-part archive holding `xml` as the main document.
    pub fn with_document(xml: impl Into<Bytes>) -> Self {
        Self::from_parts([Part::file(DOCUMENT_PART, xml)])
    }
}
