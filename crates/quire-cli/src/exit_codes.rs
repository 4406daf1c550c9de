//! Exit codes of the `quire` binary. Part of the public contract: test harnesses branch
//! on them.

pub const SUCCESS: i32 = 0;
pub const MISMATCH: i32 = 1; // Actual differs from expected
pub const SETUP_ERROR: i32 = 2; // Missing fixture, bad config, unreadable input
pub const MALFORMED: i32 = 3; // Thrown value is not a structured error
