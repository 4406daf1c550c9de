//! Error taxonomy for the oracle.
//!
//! Three classes reach the test runner:
//! - [`OracleError::FixtureNotFound`]: the expected fixture was never registered (setup problem).
//! - [`OracleError::Mismatch`]: actual and expected differ at a named location.
//! - [`OracleError::Malformed`]: the engine under test raised something that is not a
//!   structured error.
//!
//! Archive decoding, fatal fixture reads and config parsing have their own variants so
//! callers can tell a broken test setup from a failing comparison.

use crate::archive::ArchiveError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors raised by the oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The expected fixture is missing from the registry.
    #[error("fixture not found: \"{name}\" ({detail})")]
    FixtureNotFound { name: String, detail: String },

    /// Actual and expected differ.
    #[error("{0}")]
    Mismatch(Box<Mismatch>),

    /// The thrown value does not satisfy the structured error contract.
    #[error(transparent)]
    Malformed(#[from] MalformedError),

    /// An archive could not be decoded or encoded.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A fixture read failed. Loads are never retried.
    #[error("failed to load fixture \"{name}\": {source}")]
    Load {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid or unreadable configuration.
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl OracleError {
    pub fn fixture_not_found(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::FixtureNotFound {
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }

    pub fn is_fixture_not_found(&self) -> bool {
        matches!(self, Self::FixtureNotFound { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Returns the mismatch record, if this is a comparison failure.
    pub fn as_mismatch(&self) -> Option<&Mismatch> {
        match self {
            Self::Mismatch(m) => Some(m),
            _ => None,
        }
    }

    /// Suggested exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Mismatch(_) => 1,
            Self::Malformed(_) => 3,
            _ => 2,
        }
    }
}

impl From<Mismatch> for OracleError {
    fn from(m: Mismatch) -> Self {
        Self::Mismatch(Box::new(m))
    }
}

/// A comparison failure at a named location.
///
/// `location` is a part path for archive comparisons and a dotted property path
/// (`properties.errors[1].properties.offset`) for error comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub location: String,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl Mismatch {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{} for \"{}\"", self.message, self.location)?;
        }
        if let Some(expected) = &self.expected {
            write!(f, "\nexpected:\n{}", expected)?;
        }
        if let Some(actual) = &self.actual {
            write!(f, "\nactual:\n{}", actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for Mismatch {}

/// The engine under test raised something outside the structured error contract.
#[derive(Debug, Clone, Error)]
#[error("malformed error: {reason}{}", rendered.as_deref().map(|r| format!("\n{r}")).unwrap_or_default())]
pub struct MalformedError {
    pub reason: String,
    /// Rendering of the offending value (stack or JSON) when one is available.
    pub rendered: Option<String>,
}

impl MalformedError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            rendered: None,
        }
    }

    pub fn with_rendered(mut self, rendered: impl Into<String>) -> Self {
        self.rendered = Some(rendered.into());
        self
    }
}
