//! Process exit codes.
//!
//! Every failure of a run maps to [`GENERAL_ERROR`]; the log file carries the
//! details.

/// Successful execution.
pub const SUCCESS: u8 = 0;

/// Any failure during a run (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Interrupted by the user (128 + SIGINT).
pub const INTERRUPTED: u8 = 130;
