//! Zip container, the format of `.docx` and the other OOXML documents.
//!
//! Encoding is deterministic: parts keep insertion order and every entry carries the
//! zip epoch (1980-01-01) as its timestamp. Decoding charges each part's decompressed
//! bytes against both `max_part_bytes` and the archive-wide `max_decode_bytes`.

use super::codec::{check_archive_size, check_part_path, ArchiveCodec, Compression};
use super::limits::{ArchiveLimits, CappedReader};
use super::{Archive, ArchiveError, Part};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec {
    limits: ArchiveLimits,
}

impl ZipCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ArchiveLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ArchiveLimits {
        self.limits
    }
}

impl ArchiveCodec for ZipCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Archive, ArchiveError> {
        check_archive_size(bytes, &self.limits)?;

        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut archive = Archive::new();
        let mut decoded = 0u64;

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            let path = entry.name().to_string();
            check_part_path(&path, &self.limits)?;

            let part = if entry.is_dir() {
                Part::dir(path)
            } else {
                if entry.size() > self.limits.max_part_bytes {
                    return Err(ArchiveError::PartTooLarge {
                        path,
                        limit: self.limits.max_part_bytes,
                    });
                }
                let budget = self
                    .limits
                    .max_part_bytes
                    .min(self.limits.max_decode_bytes.saturating_sub(decoded));
                let mut content = Vec::with_capacity(entry.size() as usize);
                CappedReader::new(&mut entry, budget, format!("part {path}"))
                    .read_to_end(&mut content)?;
                decoded += content.len() as u64;
                Part::file(path, content)
            };

            if archive.contains(part.name()) {
                return Err(ArchiveError::DuplicatePart {
                    path: part.name().to_string(),
                });
            }
            archive.insert(part);
        }

        Ok(archive)
    }

    fn encode(&self, archive: &Archive, compression: Compression) -> Result<Vec<u8>, ArchiveError> {
        let method = match compression {
            Compression::Store => CompressionMethod::Stored,
            Compression::Deflate => CompressionMethod::Deflated,
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for part in archive.parts() {
            check_part_path(part.name(), &self.limits)?;
            if part.is_dir() {
                writer.add_directory(part.name(), options.unix_permissions(0o755))?;
            } else {
                writer.start_file(part.name(), options.unix_permissions(0o644))?;
                writer.write_all(part.content())?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}
