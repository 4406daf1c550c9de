//! Resource limits and bounded readers for archive decoding.

use serde::Deserialize;
use std::io::{self, Read};

/// Resource limits applied while decoding an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_archive_bytes: u64,
    pub max_decode_bytes: u64,
    pub max_part_bytes: u64,
    pub max_path_len: usize,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 100 * 1024 * 1024, // 100 MB compressed
            max_decode_bytes: 512 * 1024 * 1024,  // 512 MB uncompressed
            max_part_bytes: 64 * 1024 * 1024,     // 64 MB
            max_path_len: 512,
        }
    }
}

/// Partial overrides for `ArchiveLimits`. Used for config parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveLimitsOverrides {
    pub max_archive_bytes: Option<u64>,
    pub max_decode_bytes: Option<u64>,
    pub max_part_bytes: Option<u64>,
    pub max_path_len: Option<usize>,
}

impl ArchiveLimits {
    /// Apply overrides onto these limits. Only `Some` values override.
    pub fn apply(self, overrides: &ArchiveLimitsOverrides) -> Self {
        Self {
            max_archive_bytes: overrides
                .max_archive_bytes
                .unwrap_or(self.max_archive_bytes),
            max_decode_bytes: overrides.max_decode_bytes.unwrap_or(self.max_decode_bytes),
            max_part_bytes: overrides.max_part_bytes.unwrap_or(self.max_part_bytes),
            max_path_len: overrides.max_path_len.unwrap_or(self.max_path_len),
        }
    }
}

/// Read adapter that caps how much decompressed content may come out of an archive.
///
/// Running out of budget is only an error if the inner reader still has data; a stream
/// that ends exactly at the cap is accepted.
pub(crate) struct CappedReader<R> {
    inner: R,
    remaining: u64,
    cap: u64,
    what: String,
}

impl<R: Read> CappedReader<R> {
    pub(crate) fn new(inner: R, cap: u64, what: impl Into<String>) -> Self {
        Self {
            inner,
            remaining: cap,
            cap,
            what: what.into(),
        }
    }

    fn overflow(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is larger than {} bytes", self.what, self.cap),
        )
    }
}

impl<R: Read> Read for CappedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            let mut next = [0u8; 1];
            return match self.inner.read(&mut next)? {
                0 => Ok(0),
                _ => Err(self.overflow()),
            };
        }

        let window = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..window])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
