//! Where fixture bytes come from.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Asynchronous byte source for fixtures, addressed by logical name.
#[async_trait]
pub trait FixtureSource: Send + Sync + 'static {
    async fn read_bytes(&self, name: &str) -> io::Result<Bytes>;
}

/// Reads fixtures from a directory on disk (`<root>/<name>`).
#[derive(Debug, Clone)]
pub struct DirFixtureSource {
    root: PathBuf,
}

impl DirFixtureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FixtureSource for DirFixtureSource {
    async fn read_bytes(&self, name: &str) -> io::Result<Bytes> {
        let path = self.root.join(name);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
        Ok(Bytes::from(data))
    }
}

/// Fixtures held in memory. Unknown names fail with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MemoryFixtureSource {
    files: HashMap<String, Bytes>,
}

impl MemoryFixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.files.insert(name.into(), data.into());
        self
    }
}

#[async_trait]
impl FixtureSource for MemoryFixtureSource {
    async fn read_bytes(&self, name: &str) -> io::Result<Bytes> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no in-memory fixture named {name}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dir_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("image.png"), [1u8, 2, 3]).unwrap();

        let source = DirFixtureSource::new(dir.path());
        assert_eq!(source.read_bytes("image.png").await.unwrap().as_ref(), &[1, 2, 3]);

        let err = source.read_bytes("missing.docx").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("missing.docx"));
    }

    #[tokio::test]
    async fn memory_source_reports_not_found() {
        let source = MemoryFixtureSource::new().with_file("a", "x");
        assert_eq!(source.read_bytes("a").await.unwrap().as_ref(), b"x");
        assert_eq!(
            source.read_bytes("b").await.unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
