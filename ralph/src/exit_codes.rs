//! Stable exit codes for the driver.

/// Every story passes.
pub const OK: i32 = 0;
/// The iteration budget ran out before completion, or the run failed.
pub const EXHAUSTED: i32 = 1;
/// A required executable (git or the agent) is not on PATH.
pub const MISSING_DEPENDENCY: i32 = 2;
/// A required input file (`prd.json` or `CLAUDE.md`) is missing.
pub const MISSING_INPUT: i32 = 3;
