use anyhow::{Context, Result};
use quire_core::{
    load_config, ArchiveCodec, ComparisonReport, DirFixtureSource, FixtureSession, Mismatch,
    OracleConfig, OracleError, PartCheck,
};
use similar::TextDiff;
use std::io;
use tracing::debug;

use super::report_failure;
use crate::cli::args::{DiffArgs, OutputFormat};
use crate::exit_codes;

pub async fn run(args: DiffArgs) -> Result<i32> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => OracleConfig::default(),
    };
    if let Some(dir) = &args.fixtures_dir {
        config.fixtures_dir = dir.clone();
    }
    if let Some(dir) = &args.artifacts_dir {
        config.artifacts_dir = Some(dir.clone());
    }
    if let Some(format) = args.archive_format {
        config.archive_format = Some(format.into());
    }
    debug!(?config, "resolved oracle config");

    let mut session = FixtureSession::with_codec(
        DirFixtureSource::new(config.fixtures_dir.clone()),
        config.codec_for(&args.expected),
    );
    session.load_document(args.expected.clone());
    session.start();
    match session.wait().await {
        Ok(()) => {}
        // Still compare so the produced archive reaches the artifacts directory; the
        // comparator then reports the missing fixture.
        Err(OracleError::Load { name, source }) if source.kind() == io::ErrorKind::NotFound => {
            debug!(fixture = %name, "expected fixture is not on disk");
        }
        Err(e) => return Err(e.into()),
    }

    let raw = std::fs::read(&args.actual)
        .with_context(|| format!("failed to read actual archive {}", args.actual.display()))?;
    let actual = config
        .codec_for(&args.actual.to_string_lossy())
        .decode(&raw)
        .with_context(|| format!("failed to decode actual archive {}", args.actual.display()))?;

    let outcome = {
        let registry = session.registry();
        config
            .comparator_for(&args.expected)
            .compare(&actual, &args.expected, &registry)
    };

    match outcome {
        Ok(report) => {
            print_pass(&report, args.format)?;
            Ok(exit_codes::SUCCESS)
        }
        Err(OracleError::Mismatch(m)) if args.format == OutputFormat::Json => {
            print_mismatch_json(&args.expected, &m)?;
            Ok(exit_codes::MISMATCH)
        }
        Err(OracleError::Mismatch(m)) => {
            print_unified_diff(&m);
            report_failure(OracleError::Mismatch(m))
        }
        Err(e) => report_failure(e),
    }
}

fn print_pass(report: &ComparisonReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({ "status": "pass", "report": report });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Human => {
            eprintln!(
                "PASS: {} ({} parts: {} exact, {} normalized, {} binary, {} directories)",
                report.expected,
                report.parts.len(),
                report.count(PartCheck::TextExact),
                report.count(PartCheck::TextNormalized),
                report.count(PartCheck::Binary),
                report.count(PartCheck::Directory),
            );
        }
    }
    Ok(())
}

fn print_mismatch_json(expected_name: &str, m: &Mismatch) -> Result<()> {
    let doc = serde_json::json!({
        "status": "mismatch",
        "expected": expected_name,
        "location": m.location,
        "message": m.message,
        "expected_value": m.expected,
        "actual_value": m.actual,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn print_unified_diff(m: &Mismatch) {
    let (Some(expected), Some(actual)) = (&m.expected, &m.actual) else {
        return;
    };
    let diff = TextDiff::from_lines(expected.as_str(), actual.as_str());
    print!(
        "{}",
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("expected/{}", m.location), &format!("actual/{}", m.location))
    );
}
