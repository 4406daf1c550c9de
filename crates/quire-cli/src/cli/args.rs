use clap::{Parser, Subcommand, ValueEnum};
use quire_core::{ArchiveFormat, ErrorKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quire",
    version,
    about = "Test oracle for document templates: compare generated archives and thrown errors against fixtures"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare a generated archive with a registered fixture
    Diff(DiffArgs),
    /// Compare a captured structured error (JSON) with an expected descriptor
    CheckError(CheckErrorArgs),
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Zip,
    TarGz,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Zip => ArchiveFormat::Zip,
            FormatArg::TarGz => ArchiveFormat::TarGz,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct DiffArgs {
    /// Generated archive (.docx or another zip container; .tar.gz)
    #[arg(value_name = "ACTUAL")]
    pub actual: PathBuf,

    /// Fixture name, resolved against the fixtures directory
    #[arg(long, value_name = "NAME")]
    pub expected: String,

    /// Oracle config (YAML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Overrides `fixtures_dir` from the config
    #[arg(long, env = "QUIRE_FIXTURES_DIR")]
    pub fixtures_dir: Option<PathBuf>,

    /// Write the actual archive to {dir}/{expected}; overrides `artifacts_dir`
    #[arg(long, env = "QUIRE_ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Container format of both archives; overrides `archive_format`. Without it the
    /// format follows each file name
    #[arg(long, value_enum)]
    pub archive_format: Option<FormatArg>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckErrorArgs {
    /// Captured error as JSON
    #[arg(value_name = "ACTUAL_JSON")]
    pub actual: PathBuf,

    /// Expected descriptor as JSON; an array is wrapped as a multi error
    #[arg(value_name = "EXPECTED_JSON")]
    pub expected: PathBuf,

    /// Required error kind
    #[arg(long, default_value = "TemplateError")]
    pub kind: ErrorKind,
}
