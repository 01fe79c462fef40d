// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Estimation pipeline entry: validate input, then group → estimate → backfill → scale → assemble
// role: estimation/pipeline
// inputs: CommitRecord slice, inclusive start/end dates, EstimatorConfig
// outputs: Timesheet (only requested days exposed; lookback days used for context)
// invariants:
// - Every stage is a pure DayMap → DayMap function; no stage mutates a previous stage's values
// - Hours are multiples of 0.5 within [min_task_hours, max_task_hours] after every stage
// - Deterministic: ordered maps and stable sorts only
// errors: TimesheetError for inverted ranges, negative counts, empty task ids, bad config
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod assemble;
pub mod backfill;
pub mod classify;
pub mod daily;
pub mod group;
pub mod weekly;

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::config::EstimatorConfig;
use crate::error::TimesheetError;
use crate::model::{CommitRecord, Timesheet};
use classify::TaskType;

/// A per-day, per-task hour estimate flowing between pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEstimate {
  pub task_id: String,
  pub title: String,
  pub issue_id: Option<String>,
  pub tracked: bool,
  pub task_type: TaskType,
  pub hours: f64,
  pub start_time: NaiveDateTime,
  pub commit_count: usize,
  pub lines_added: i64,
  pub lines_deleted: i64,
  pub files_changed: i64,
  pub first_day: bool,
  /// Lines the task changed across its whole active history.
  pub lifecycle_lines: i64,
  /// Synthetic entry created by the backfiller.
  pub backfilled: bool,
}

impl TaskEstimate {
  pub fn with_hours(&self, hours: f64) -> Self {
    Self { hours, ..self.clone() }
  }
}

pub type DayMap = BTreeMap<NaiveDate, Vec<TaskEstimate>>;

/// Round to the nearest half hour (halves round up).
pub fn round_half(hours: f64) -> f64 {
  (hours * 2.0).round() / 2.0
}

/// Round down to a half hour.
pub fn floor_half(hours: f64) -> f64 {
  (hours * 2.0).floor() / 2.0
}

/// Round to a half hour, then clamp into the configured per-task bounds.
pub fn quantize(hours: f64, cfg: &EstimatorConfig) -> f64 {
  let h = if hours.is_finite() { round_half(hours) } else { cfg.min_task_hours };
  h.max(cfg.min_task_hours).min(cfg.max_task_hours)
}

pub fn tracked_hours(tasks: &[TaskEstimate]) -> f64 {
  tasks.iter().filter(|t| t.tracked).fold(0.0, |acc, t| acc + t.hours)
}

pub fn total_hours(tasks: &[TaskEstimate]) -> f64 {
  tasks.iter().fold(0.0, |acc, t| acc + t.hours)
}

/// First day of the lookback window before `start`.
pub fn lookback_start(start: NaiveDate, lookback_days: i64) -> Result<NaiveDate, TimesheetError> {
  u64::try_from(lookback_days)
    .ok()
    .and_then(|days| start.checked_sub_days(Days::new(days)))
    .ok_or_else(|| TimesheetError::InvalidConfig(format!("lookback of {lookback_days} days before {start} is out of range")))
}

fn validate_commits(commits: &[CommitRecord]) -> Result<(), TimesheetError> {
  for c in commits {
    if c.lines_added < 0 || c.lines_deleted < 0 || c.files_changed < 0 {
      return Err(TimesheetError::NegativeLineCount { sha: c.sha.clone() });
    }
    if c.task_id.trim().is_empty() {
      return Err(TimesheetError::EmptyTaskId { sha: c.sha.clone() });
    }
  }
  Ok(())
}

/// Run the whole estimation pipeline for `[start, end]`.
///
/// Commits dated up to `config.lookback_days` before `start` feed the task
/// lifecycle, backfill and weekly scaling but are not exposed as days.
pub fn build_timesheet(
  commits: &[CommitRecord],
  start: NaiveDate,
  end: NaiveDate,
  config: &EstimatorConfig,
) -> Result<Timesheet, TimesheetError> {
  // Phase 1: preconditions
  if end < start {
    return Err(TimesheetError::InvalidRange { start, end });
  }
  config.validate()?;
  validate_commits(commits)?;

  // Phase 2: active commits, chronological with sha as tie-breaker
  let mut active: Vec<&CommitRecord> = commits.iter().filter(|c| !c.is_duplicate && c.date() <= end).collect();
  active.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.sha.cmp(&b.sha)));

  let window_start = lookback_start(start, config.lookback_days)?;
  let lifecycle = group::TaskLifecycle::build(&active);
  let windowed: Vec<&CommitRecord> = active.iter().copied().filter(|c| c.date() >= window_start).collect();
  debug!(active = active.len(), windowed = windowed.len(), %window_start, "estimating timesheet");

  // Phase 3: stages
  let clusters = group::group_commits(&windowed, &lifecycle);
  let raw = daily::estimate_days(&clusters, &lifecycle, config);
  let backfilled = backfill::backfill(&raw, start, config);
  let scaled = weekly::scale_weeks(&backfilled, config);

  // Phase 4: assemble the requested range
  let in_range: Vec<&CommitRecord> = windowed.iter().copied().filter(|c| c.date() >= start).collect();
  Ok(assemble::assemble(&scaled, &in_range, start, end, config))
}
