use super::{clean, structural_diff, ErrorKind, IntoStructuredError, StructuredError};
use crate::errors::{MalformedError, Mismatch, OracleResult};
use tracing::debug;

/// Run `operation` and require it to fail with an error matching `expected`.
///
/// `expected` is not modified; cleaning runs on a copy.
///
/// # Errors
///
/// - [`OracleError::Mismatch`](crate::errors::OracleError::Mismatch) when nothing is
///   thrown or the cleaned error differs from `expected`.
/// - [`OracleError::Malformed`](crate::errors::OracleError::Malformed) when the thrown
///   value is not a structured error of `expected_kind`.
pub fn expect_failure<T, E, F>(
    operation: F,
    expected_kind: ErrorKind,
    expected: &StructuredError,
) -> OracleResult<()>
where
    E: IntoStructuredError,
    F: FnOnce() -> Result<T, E>,
{
    match operation() {
        Ok(_) => Err(Mismatch::new("", "No error has been thrown")
            .with_values(expected.render(), "<no error>")
            .into()),
        Err(thrown) => check_thrown(thrown, expected_kind, expected),
    }
}

/// Check an already-captured error against `expected`.
pub fn check_thrown(
    thrown: impl IntoStructuredError,
    expected_kind: ErrorKind,
    expected: &StructuredError,
) -> OracleResult<()> {
    let mut actual = thrown.into_structured()?;
    if actual.name != expected_kind {
        return Err(MalformedError::new(format!(
            "expected a {expected_kind}, got a {}",
            actual.name
        ))
        .with_rendered(actual.render())
        .into());
    }

    let mut expected = expected.clone();
    clean(&mut actual, &mut expected)?;

    if let Some(detail) = structural_diff(&actual, &expected) {
        let location = detail.location.clone();
        return Err(Mismatch::new(
            location,
            format!("Thrown error differs from expected: {}", describe(&detail)),
        )
        .with_values(expected.render(), actual.render())
        .into());
    }

    debug!(kind = %expected_kind, id = expected.id(), "thrown error matches");
    Ok(())
}

fn describe(detail: &Mismatch) -> String {
    match (&detail.expected, &detail.actual) {
        (Some(e), Some(a)) if !e.contains('\n') && !a.contains('\n') => {
            format!("{} ({e} != {a})", detail.message)
        }
        _ => detail.message.clone(),
    }
}
