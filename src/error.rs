// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed rejected-input errors for the estimation pipeline
// role: errors/core
// outputs: TimesheetError variants; the app layer wraps them in anyhow
// invariants: Only precondition violations are errors; degenerate input is handled by policy
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimesheetError {
  #[error("invalid range: end date {end} is before start date {start}")]
  InvalidRange { start: NaiveDate, end: NaiveDate },

  #[error("commit {sha} has a negative line or file count")]
  NegativeLineCount { sha: String },

  #[error("commit {sha} has an empty task id")]
  EmptyTaskId { sha: String },

  #[error("invalid estimator configuration: {0}")]
  InvalidConfig(String),
}
