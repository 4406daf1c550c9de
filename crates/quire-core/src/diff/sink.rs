//! Side-channel for produced archives.
//!
//! Every comparison hands the serialized actual archive to an [`ArtifactSink`] under the
//! expected fixture's name, so a failing run leaves the produced document behind for
//! inspection. Sink failures never change a verdict.

use std::io;
use std::path::{Path, PathBuf};

pub trait ArtifactSink: Send + Sync {
    fn persist(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes artifacts to `<dir>/<name>`, creating parent directories.
#[derive(Debug, Clone)]
pub struct DirArtifactSink {
    dir: PathBuf,
}

impl DirArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirArtifactSink {
    fn persist(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        if Path::new(name).is_absolute() || name.split(['/', '\\']).any(|c| c == "..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write artifact outside {}: {}", self.dir.display(), name),
            ));
        }
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
    }
}
