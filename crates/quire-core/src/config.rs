use crate::archive::{ArchiveFormat, ArchiveLimits, ArchiveLimitsOverrides, FormatCodec};
use crate::diff::{ArchiveComparator, BinaryPolicy, DirArtifactSink};
use crate::errors::{OracleError, OracleResult};
use crate::markup::NormalizeOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Oracle settings, usually read from `quire.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    pub version: u32,
    /// Directory expected fixtures are read from.
    pub fixtures_dir: PathBuf,
    /// Where produced archives are written for inspection. Unset disables the write.
    pub artifacts_dir: Option<PathBuf>,
    /// Container format of fixtures and produced archives. Unset picks it from the
    /// fixture name.
    pub archive_format: Option<ArchiveFormat>,
    /// Extensions of parts compared by byte length only.
    pub binary_extensions: Vec<String>,
    pub markup: NormalizeOptions,
    pub limits: ArchiveLimitsOverrides,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            fixtures_dir: PathBuf::from("fixtures"),
            artifacts_dir: None,
            archive_format: None,
            binary_extensions: vec!["png".to_string()],
            markup: NormalizeOptions::default(),
            limits: ArchiveLimitsOverrides::default(),
        }
    }
}

impl OracleConfig {
    pub fn archive_limits(&self) -> ArchiveLimits {
        ArchiveLimits::default().apply(&self.limits)
    }

    pub fn format_for(&self, fixture_name: &str) -> ArchiveFormat {
        self.archive_format
            .unwrap_or_else(|| ArchiveFormat::from_name(fixture_name))
    }

    pub fn codec_for(&self, fixture_name: &str) -> FormatCodec {
        self.format_for(fixture_name).codec(self.archive_limits())
    }

    /// Comparator for the fixture `fixture_name`, with a directory sink when
    /// `artifacts_dir` is set. The produced archive is persisted in the fixture's format.
    pub fn comparator_for(&self, fixture_name: &str) -> ArchiveComparator {
        let comparator = ArchiveComparator::new()
            .with_binary_policy(BinaryPolicy::new(&self.binary_extensions))
            .with_options(self.markup.clone())
            .with_codec(self.codec_for(fixture_name));
        match &self.artifacts_dir {
            Some(dir) => comparator.with_sink(DirArtifactSink::new(dir.clone())),
            None => comparator,
        }
    }
}

pub fn load_config(path: &Path) -> OracleResult<OracleConfig> {
    let config_error = |message: String| OracleError::Config {
        path: path.to_path_buf(),
        message,
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("failed to read config: {e}")))?;
    parse_config(&raw).map_err(config_error)
}

fn parse_config(raw: &str) -> Result<OracleConfig, String> {
    let cfg: OracleConfig =
        serde_yaml::from_str(raw).map_err(|e| format!("failed to parse YAML: {e}"))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        ));
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse_config("{}").unwrap();
        assert_eq!(cfg, OracleConfig::default());
        assert_eq!(cfg.archive_limits(), ArchiveLimits::default());
    }

    #[test]
    fn partial_limits_and_markup_override_defaults() {
        let cfg = parse_config(
            r#"
fixtures_dir: tests/fixtures
artifacts_dir: target/artifacts
binary_extensions: [png, jpeg]
markup:
  indent: 4
limits:
  max_part_bytes: 1024
"#,
        )
        .unwrap();
        assert_eq!(cfg.fixtures_dir, PathBuf::from("tests/fixtures"));
        assert_eq!(cfg.markup.indent, 4);
        assert!(cfg.markup.sort_attributes);
        assert_eq!(cfg.archive_limits().max_part_bytes, 1024);
        assert_eq!(
            cfg.archive_limits().max_path_len,
            ArchiveLimits::default().max_path_len
        );
    }

    #[test]
    fn archive_format_defaults_to_the_fixture_name() {
        let cfg = parse_config("{}").unwrap();
        assert_eq!(cfg.format_for("tag-example.docx"), ArchiveFormat::Zip);
        assert_eq!(cfg.format_for("bundle.tar.gz"), ArchiveFormat::TarGz);

        let cfg = parse_config("archive_format: tar_gz").unwrap();
        assert_eq!(cfg.format_for("tag-example.docx"), ArchiveFormat::TarGz);
        assert_eq!(cfg.codec_for("tag-example.docx").format(), ArchiveFormat::TarGz);

        let err = parse_config("archive_format: rar").unwrap_err();
        assert!(err.contains("unknown variant"), "{err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config("binary_extension: [png]").unwrap_err();
        assert!(err.contains("unknown field"), "{err}");

        let err = parse_config("limits:\n  max_bytes: 1").unwrap_err();
        assert!(err.contains("unknown field"), "{err}");
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = parse_config("version: 2").unwrap_err();
        assert!(err.contains("unsupported config version 2"));
    }

    #[test]
    fn load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.yaml");
        std::fs::write(&path, "version: [").unwrap();
        let err = load_config(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("quire.yaml"));
    }
}
