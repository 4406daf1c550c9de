//! Name-keyed store of loaded fixtures.

use crate::archive::Archive;
use crate::errors::{OracleError, OracleResult};
use bytes::Bytes;
use std::collections::BTreeMap;

/// A loaded fixture: raw bytes plus, for documents, the decoded archive handle.
#[derive(Debug, Clone)]
pub struct FixtureEntry {
    pub name: String,
    pub raw: Bytes,
    pub archive: Option<Archive>,
}

/// In-memory fixture registry. Registering an existing name replaces the entry.
#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    entries: BTreeMap<String, FixtureEntry>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under `name`.
    pub fn register(&mut self, name: impl Into<String>, raw: impl Into<Bytes>) {
        let name = name.into();
        self.entries.insert(
            name.clone(),
            FixtureEntry {
                name,
                raw: raw.into(),
                archive: None,
            },
        );
    }

    /// Store a decoded archive together with the bytes it was built from.
    pub fn register_archive(
        &mut self,
        name: impl Into<String>,
        archive: Archive,
        raw: impl Into<Bytes>,
    ) {
        let name = name.into();
        self.entries.insert(
            name.clone(),
            FixtureEntry {
                name,
                raw: raw.into(),
                archive: Some(archive),
            },
        );
    }

    pub fn get(&self, name: &str) -> OracleResult<&FixtureEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| OracleError::fixture_not_found(name, "no fixture registered under this name"))
    }

    /// The archive handle registered under `name`.
    pub fn archive(&self, name: &str) -> OracleResult<&Archive> {
        self.get(name)?.archive.as_ref().ok_or_else(|| {
            OracleError::fixture_not_found(name, "fixture was loaded as raw bytes, not as an archive")
        })
    }

    pub fn raw(&self, name: &str) -> OracleResult<&Bytes> {
        Ok(&self.get(name)?.raw)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
