pub mod archive;
pub mod config;
pub mod diff;
pub mod errors;
pub mod fixtures;
pub mod markup;
pub mod structured;

// Convenience re-exports
pub use archive::{
    Archive, ArchiveCodec, ArchiveError, ArchiveFormat, ArchiveLimits, ArchiveLimitsOverrides,
    Compression, FormatCodec, Part, TarGzCodec, ZipCodec, DOCUMENT_PART,
};
pub use config::{load_config, OracleConfig};
pub use diff::{
    compare_archives, ArchiveComparator, ArtifactSink, BinaryPolicy, ComparisonReport,
    DirArtifactSink, PartCheck, PartOutcome,
};
pub use errors::{MalformedError, Mismatch, OracleError, OracleResult};
pub use fixtures::{
    DirFixtureSource, FixtureEntry, FixtureRegistry, FixtureSession, FixtureSource, LoadBarrier,
    LoadToken, MemoryFixtureSource,
};
pub use markup::{remove_spaces, strip_formatting, MarkupNormalizer, NormalizeOptions, XmlPrettifier};
pub use structured::{
    check_thrown, expect_failure, wrap_multi_error, ErrorKind, ErrorProperties,
    IntoStructuredError, RootError, StructuredError,
};

// Re-export bytes for CLI convenience
pub use bytes::Bytes;
