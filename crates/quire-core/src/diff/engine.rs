use super::sink::ArtifactSink;
use super::{BinaryPolicy, ComparisonReport, PartCheck, PartOutcome};
use crate::archive::{Archive, ArchiveCodec, Compression, Part, ZipCodec};
use crate::errors::{Mismatch, OracleResult};
use crate::fixtures::FixtureRegistry;
use crate::markup::{strip_formatting, MarkupNormalizer, NormalizeOptions, XmlPrettifier};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compare `actual` against the archive registered as `expected_name`, using the
/// default comparator (png as binary, XML prettifier, no side-channel).
pub fn compare_archives(
    actual: &Archive,
    expected_name: &str,
    registry: &FixtureRegistry,
) -> OracleResult<ComparisonReport> {
    ArchiveComparator::default().compare(actual, expected_name, registry)
}

/// Part-by-part archive comparison.
///
/// Every part of the actual archive must exist in the expected one with the same
/// directory flag. Binary parts are compared by length. Text parts are compared after
/// stripping newlines and tabs, then, only if they still differ, after markup
/// normalization. The first failing part ends the comparison.
///
/// Parts present only in the expected archive are not reported.
pub struct ArchiveComparator {
    binary: BinaryPolicy,
    normalizer: Arc<dyn MarkupNormalizer>,
    options: NormalizeOptions,
    codec: Arc<dyn ArchiveCodec>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl Default for ArchiveComparator {
    fn default() -> Self {
        Self {
            binary: BinaryPolicy::default(),
            normalizer: Arc::new(XmlPrettifier),
            options: NormalizeOptions::default(),
            codec: Arc::new(ZipCodec::new()),
            sink: None,
        }
    }
}

impl ArchiveComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary_policy(mut self, binary: BinaryPolicy) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl MarkupNormalizer + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Codec used to serialize the actual archive for the side-channel.
    pub fn with_codec(mut self, codec: impl ArchiveCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn with_sink(mut self, sink: impl ArtifactSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn compare(
        &self,
        actual: &Archive,
        expected_name: &str,
        registry: &FixtureRegistry,
    ) -> OracleResult<ComparisonReport> {
        self.persist_actual(actual, expected_name);

        let expected = registry.archive(expected_name)?;

        let mut parts = Vec::with_capacity(actual.len());
        for part in actual.parts() {
            let check = self.compare_part(part, expected)?;
            debug!(part = part.name(), ?check, "part matches");
            parts.push(PartOutcome {
                path: part.name().to_string(),
                check,
            });
        }

        let report = ComparisonReport {
            expected: expected_name.to_string(),
            parts,
        };
        info!(
            expected = expected_name,
            parts = report.parts.len(),
            normalized = report.count(PartCheck::TextNormalized),
            "archive matches fixture"
        );
        Ok(report)
    }

    fn compare_part(&self, part: &Part, expected: &Archive) -> Result<PartCheck, Mismatch> {
        let path = part.name();
        let Some(other) = expected.get(path) else {
            return Err(Mismatch::new(path, "Part missing from expected archive"));
        };

        if part.is_dir() != other.is_dir() {
            return Err(Mismatch::new(path, "IsDir differs")
                .with_values(other.is_dir().to_string(), part.is_dir().to_string()));
        }
        if part.is_dir() {
            return Ok(PartCheck::Directory);
        }

        if self.binary.is_binary(path) {
            if part.len() != other.len() {
                return Err(Mismatch::new(
                    path,
                    format!("Content differs, lengths: \"{}\", \"{}\"", part.len(), other.len()),
                ));
            }
            return Ok(PartCheck::Binary);
        }

        let actual_text = strip_formatting(&part.as_text());
        let expected_text = strip_formatting(&other.as_text());
        if actual_text == expected_text {
            return Ok(PartCheck::TextExact);
        }

        let actual_pretty = self.normalizer.normalize(&actual_text, &self.options);
        let expected_pretty = self.normalizer.normalize(&expected_text, &self.options);
        if actual_pretty == expected_pretty {
            return Ok(PartCheck::TextNormalized);
        }

        Err(Mismatch::new(
            path,
            format!(
                "Content differs, lengths: \"{}\", \"{}\"",
                actual_text.len(),
                expected_text.len()
            ),
        )
        .with_values(expected_pretty, actual_pretty))
    }

    fn persist_actual(&self, actual: &Archive, name: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        let bytes = match self.codec.encode(actual, Compression::Deflate) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(artifact = name, error = %e, "could not serialize produced archive");
                return;
            }
        };
        match sink.persist(name, &bytes) {
            Ok(()) => debug!(artifact = name, bytes = bytes.len(), "produced archive persisted"),
            Err(e) => warn!(artifact = name, error = %e, "could not persist produced archive"),
        }
    }
}
