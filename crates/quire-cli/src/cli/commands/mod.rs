pub mod check_error;
pub mod diff;
mod dispatch;

pub use dispatch::dispatch;

use crate::exit_codes;
use quire_core::OracleError;

/// Print an oracle failure and map it to an exit code. Setup failures are returned as
/// errors so `main` reports them uniformly.
pub(crate) fn report_failure(err: OracleError) -> anyhow::Result<i32> {
    match err {
        OracleError::Mismatch(m) => {
            eprintln!("FAIL: {m}");
            Ok(exit_codes::MISMATCH)
        }
        OracleError::Malformed(e) => {
            eprintln!("FAIL: {e}");
            Ok(exit_codes::MALFORMED)
        }
        other => Err(other.into()),
    }
}
