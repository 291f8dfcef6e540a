//! Stable exit codes for executer CLI commands.

/// The replayed template produced a match.
pub const OK: i32 = 0;
/// Invalid script/config, a step failed, or another error occurred.
pub const INVALID: i32 = 1;
/// All steps ran but nothing matched.
pub const NO_MATCH: i32 = 2;
