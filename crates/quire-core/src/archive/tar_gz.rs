//! Deterministic tar + gzip container.
//!
//! Parts are written in insertion order with mtime 0, fixed modes and uid/gid 0, so
//! encoding the same archive twice yields the same bytes.

use super::codec::{check_archive_size, check_part_path, ArchiveCodec, Compression};
use super::limits::{ArchiveLimits, CappedReader};
use super::{Archive, ArchiveError, Part};
use flate2::read::GzDecoder;
use flate2::GzBuilder;
use std::io::Read;
use tar::{Builder, EntryType, Header, HeaderMode};

fn gzip_level(compression: Compression) -> flate2::Compression {
    match compression {
        Compression::Store => flate2::Compression::none(),
        Compression::Deflate => flate2::Compression::default(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzCodec {
    limits: ArchiveLimits,
}

impl TarGzCodec {
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

impl ArchiveCodec for TarGzCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Archive, ArchiveError> {
        check_archive_size(bytes, &self.limits)?;

        let decoder = CappedReader::new(
            GzDecoder::new(bytes),
            self.limits.max_decode_bytes,
            "decompressed tar stream",
        );
        let mut tar = tar::Archive::new(decoder);
        let mut archive = Archive::new();

        for entry in tar.entries()? {
            let mut entry = entry?;
            let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            check_part_path(&path, &self.limits)?;

            let entry_type = entry.header().entry_type();
            let part = if entry_type.is_dir() {
                Part::dir(path)
            } else if entry_type.is_file() {
                let size = entry.header().size()?;
                if size > self.limits.max_part_bytes {
                    return Err(ArchiveError::PartTooLarge {
                        path,
                        limit: self.limits.max_part_bytes,
                    });
                }
                let mut content = Vec::with_capacity(size as usize);
                entry.read_to_end(&mut content)?;
                Part::file(path, content)
            } else {
                return Err(ArchiveError::UnsupportedEntry { path });
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
        let mut out = Vec::new();
        {
            let gz = GzBuilder::new()
                .mtime(0)
                .write(&mut out, gzip_level(compression));
            let mut builder = Builder::new(gz);
            builder.mode(HeaderMode::Deterministic);

            for part in archive.parts() {
                check_part_path(part.name(), &self.limits)?;

                let mut header = Header::new_gnu();
                if part.is_dir() {
                    header.set_entry_type(EntryType::Directory);
                    header.set_mode(0o755);
                } else {
                    header.set_entry_type(EntryType::Regular);
                    header.set_mode(0o644);
                }
                header.set_size(part.len() as u64);
                header.set_uid(0);
                header.set_gid(0);
                header.set_mtime(0);
                builder.append_data(&mut header, part.name(), part.content().as_ref())?;
            }

            let gz = builder.into_inner()?;
            gz.finish()?;
        }
        Ok(out)
    }
}
