use anyhow::{Context, Result};
use quire_core::{check_thrown, wrap_multi_error, StructuredError};
use serde_json::Value;
use std::path::Path;

use super::report_failure;
use crate::cli::args::CheckErrorArgs;
use crate::exit_codes;

pub fn run(args: CheckErrorArgs) -> Result<i32> {
    let actual = read_json(&args.actual)?;
    let expected = expected_descriptor(read_json(&args.expected)?)
        .with_context(|| format!("invalid expected descriptor {}", args.expected.display()))?;

    match check_thrown(actual, args.kind, &expected) {
        Ok(()) => {
            eprintln!("PASS: {} ({})", expected.id(), args.kind);
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => report_failure(e),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse JSON {}", path.display()))
}

/// A JSON array describes the components of a multi error.
fn expected_descriptor(value: Value) -> Result<StructuredError> {
    match value {
        Value::Array(items) => {
            let errors = items
                .into_iter()
                .map(StructuredError::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(wrap_multi_error(errors))
        }
        other => Ok(StructuredError::from_json(other)?),
    }
}
