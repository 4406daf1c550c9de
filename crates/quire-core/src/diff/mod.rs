pub mod engine;
pub mod sink;

pub use engine::{compare_archives, ArchiveComparator};
pub use sink::{ArtifactSink, DirArtifactSink};

use serde::Serialize;
use std::path::Path;

/// Parts compared by byte length only. Matching is on the file extension, case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPolicy {
    extensions: Vec<String>,
}

impl Default for BinaryPolicy {
    fn default() -> Self {
        Self::new(["png"])
    }
}

impl BinaryPolicy {
    pub fn new<S: AsRef<str>>(extensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_binary(&self, part_name: &str) -> bool {
        Path::new(part_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

/// Which check accepted a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCheck {
    /// Both sides are directories.
    Directory,
    /// Binary part with equal byte length.
    Binary,
    /// Equal after stripping newlines and tabs.
    TextExact,
    /// Equal only after markup normalization.
    TextNormalized,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartOutcome {
    pub path: String,
    pub check: PartCheck,
}

/// Result of a passing archive comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub expected: String,
    pub parts: Vec<PartOutcome>,
}

impl ComparisonReport {
    pub fn count(&self, check: PartCheck) -> usize {
        self.parts.iter().filter(|p| p.check == check).count()
    }

    pub fn check_for(&self, path: &str) -> Option<PartCheck> {
        self.parts.iter().find(|p| p.path == path).map(|p| p.check)
    }
}
