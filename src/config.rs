// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Every tunable constant of the estimation pipeline in one explicit, serde-loadable struct
// role: configuration
// inputs: Optional JSON override file; CLI overrides applied by cli::normalize
// outputs: EstimatorConfig passed by reference into estimation::build_timesheet
// invariants:
// - Missing JSON keys keep their defaults
// - validate() rejects non-monotonic tier tables and inverted bounds
// errors: from_json_file attaches the file path; validate returns TimesheetError::InvalidConfig
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::TimesheetError;

/// Upper bound for `lookback_days`.
pub const MAX_LOOKBACK_DAYS: i64 = 366;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationStrategy {
  /// Hours from lines changed, task type and file count.
  SizeTiered,
  /// Hours from the wall-clock gap since the task's previous commit, cross-checked against size.
  TimeDelta,
}

/// One row of a size tier table. `max_lines = None` is the open-ended last row.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SizeTier {
  pub max_lines: Option<i64>,
  pub hours: f64,
}

impl SizeTier {
  const fn upto(max_lines: i64, hours: f64) -> Self {
    Self { max_lines: Some(max_lines), hours }
  }

  const fn rest(hours: f64) -> Self {
    Self { max_lines: None, hours }
  }
}

/// Look up the hours for `lines` in an ordered tier table.
pub fn tier_hours(tiers: &[SizeTier], lines: i64) -> f64 {
  for tier in tiers {
    match tier.max_lines {
      Some(max) if lines <= max => return tier.hours,
      None => return tier.hours,
      _ => {}
    }
  }
  tiers.last().map(|t| t.hours).unwrap_or(0.0)
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTypeMultipliers {
  pub feature: f64,
  pub fix: f64,
  pub clean: f64,
  pub build: f64,
  pub version: f64,
  pub refactor: f64,
  pub test: f64,
  pub infrastructure: f64,
  pub database: f64,
}

impl Default for TaskTypeMultipliers {
  fn default() -> Self {
    Self {
      feature: 1.0,
      fix: 0.7,
      clean: 0.25,
      build: 0.4,
      version: 0.2,
      refactor: 1.2,
      test: 1.1,
      infrastructure: 1.4,
      database: 1.3,
    }
  }
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BackfillShare {
  pub min_lines: i64,
  pub share: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
  pub enabled: bool,
  pub max_gap_days: i64,
  pub light_day_hours: f64,
  pub heavy_day_hours: f64,
  pub min_candidate_hours: f64,
  pub min_move_hours: f64,
  pub min_remaining_hours: f64,
  /// Checked in order; first row whose `min_lines` is reached wins.
  pub shares: Vec<BackfillShare>,
  pub default_share: f64,
  pub start_hour: u32,
}

impl Default for BackfillConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      max_gap_days: 2,
      light_day_hours: 4.0,
      heavy_day_hours: 7.0,
      min_candidate_hours: 2.5,
      min_move_hours: 1.5,
      min_remaining_hours: 1.0,
      shares: vec![
        BackfillShare { min_lines: 500, share: 0.40 },
        BackfillShare { min_lines: 300, share: 0.35 },
      ],
      default_share: 0.30,
      start_hour: 9,
    }
  }
}

impl BackfillConfig {
  pub fn share_for(&self, lifecycle_lines: i64) -> f64 {
    self
      .shares
      .iter()
      .find(|s| lifecycle_lines >= s.min_lines)
      .map(|s| s.share)
      .unwrap_or(self.default_share)
  }
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeDeltaConfig {
  /// Gaps longer than this get the sleep window subtracted.
  pub sleep_after_hours: f64,
  /// Hours subtracted per started 24h block.
  pub sleep_hours_per_day: f64,
  pub max_session_hours: f64,
  pub over_ratio: f64,
  pub under_ratio: f64,
  pub under_min_size_hours: f64,
}

impl Default for TimeDeltaConfig {
  fn default() -> Self {
    Self {
      sleep_after_hours: 4.0,
      sleep_hours_per_day: 4.0,
      max_session_hours: 12.0,
      over_ratio: 2.5,
      under_ratio: 0.4,
      under_min_size_hours: 2.0,
    }
  }
}

/// All knobs of the pipeline.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
  pub strategy: EstimationStrategy,
  pub min_task_hours: f64,
  pub max_task_hours: f64,
  pub max_hours_per_day: f64,
  pub weekly_target_hours: f64,
  pub work_days_per_week: u32,
  pub scale_min: f64,
  pub scale_max: f64,
  pub scale_dead_band: f64,
  pub scale_untracked: bool,
  pub lookback_days: i64,
  pub include_weekends: bool,
  pub tracked_tiers: Vec<SizeTier>,
  pub follow_up_tiers: Vec<SizeTier>,
  pub untracked_tiers: Vec<SizeTier>,
  pub files_bonus_thresholds: Vec<i64>,
  pub files_bonus_hours: f64,
  pub multipliers: TaskTypeMultipliers,
  pub backfill: BackfillConfig,
  pub time_delta: TimeDeltaConfig,
}

impl Default for EstimatorConfig {
  fn default() -> Self {
    Self {
      strategy: EstimationStrategy::SizeTiered,
      min_task_hours: 0.5,
      max_task_hours: 8.0,
      max_hours_per_day: 16.0,
      weekly_target_hours: 40.0,
      work_days_per_week: 5,
      scale_min: 0.7,
      scale_max: 1.5,
      scale_dead_band: 0.15,
      scale_untracked: true,
      lookback_days: 7,
      include_weekends: true,
      tracked_tiers: vec![
        SizeTier::upto(10, 0.5),
        SizeTier::upto(30, 1.0),
        SizeTier::upto(80, 1.5),
        SizeTier::upto(150, 2.5),
        SizeTier::upto(300, 3.5),
        SizeTier::upto(500, 4.5),
        SizeTier::upto(800, 6.0),
        SizeTier::upto(1500, 8.0),
        SizeTier::rest(10.0),
      ],
      follow_up_tiers: vec![
        SizeTier::upto(50, 0.5),
        SizeTier::upto(150, 1.0),
        SizeTier::upto(400, 1.5),
        SizeTier::rest(2.0),
      ],
      untracked_tiers: vec![
        SizeTier::upto(20, 0.5),
        SizeTier::upto(100, 1.0),
        SizeTier::upto(300, 2.0),
        SizeTier::upto(800, 3.0),
        SizeTier::rest(4.0),
      ],
      files_bonus_thresholds: vec![5, 15],
      files_bonus_hours: 0.5,
      multipliers: TaskTypeMultipliers::default(),
      backfill: BackfillConfig::default(),
      time_delta: TimeDeltaConfig::default(),
    }
  }
}

impl EstimatorConfig {
  /// Load overrides from a JSON file; keys not present keep their defaults.
  pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg: EstimatorConfig =
      serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
  }

  pub fn validate(&self) -> std::result::Result<(), TimesheetError> {
    let bad = |msg: String| Err(TimesheetError::InvalidConfig(msg));

    if !(self.min_task_hours > 0.0) || self.min_task_hours > self.max_task_hours {
      return bad(format!(
        "task hours bounds must satisfy 0 < min <= max (min={}, max={})",
        self.min_task_hours, self.max_task_hours
      ));
    }
    for (name, value) in [
      ("min_task_hours", self.min_task_hours),
      ("max_task_hours", self.max_task_hours),
      ("max_hours_per_day", self.max_hours_per_day),
      ("files_bonus_hours", self.files_bonus_hours),
      ("backfill.min_move_hours", self.backfill.min_move_hours),
      ("backfill.min_remaining_hours", self.backfill.min_remaining_hours),
    ] {
      if !is_half_hour(value) {
        return bad(format!("{name} must be a multiple of 0.5, got {value}"));
      }
    }
    if self.max_hours_per_day < self.max_task_hours {
      return bad(format!(
        "max_hours_per_day ({}) must be at least max_task_hours ({})",
        self.max_hours_per_day, self.max_task_hours
      ));
    }
    if self.work_days_per_week == 0 || self.work_days_per_week > 7 {
      return bad(format!("work_days_per_week must be 1..=7, got {}", self.work_days_per_week));
    }
    if !(self.scale_min > 0.0) || self.scale_min > self.scale_max {
      return bad(format!("scale bounds must satisfy 0 < min <= max (min={}, max={})", self.scale_min, self.scale_max));
    }
    if self.scale_dead_band < 0.0 || self.weekly_target_hours < 0.0 {
      return bad("scale_dead_band and weekly_target_hours must be non-negative".into());
    }
    if !(0..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
      return bad(format!("lookback_days must be 0..={MAX_LOOKBACK_DAYS}, got {}", self.lookback_days));
    }
    for (name, tiers) in [
      ("tracked_tiers", &self.tracked_tiers),
      ("follow_up_tiers", &self.follow_up_tiers),
      ("untracked_tiers", &self.untracked_tiers),
    ] {
      validate_tiers(name, tiers)?;
    }
    if self.files_bonus_thresholds.windows(2).any(|w| w[0] >= w[1]) {
      return bad("files_bonus_thresholds must be strictly increasing".into());
    }
    if self.backfill.max_gap_days < 1 {
      return bad("backfill.max_gap_days must be at least 1".into());
    }
    if self.backfill.min_move_hours < self.min_task_hours || self.backfill.min_remaining_hours < self.min_task_hours {
      return bad("backfill.min_move_hours and backfill.min_remaining_hours must be at least min_task_hours".into());
    }
    let shares = self.backfill.shares.iter().map(|s| s.share).chain(std::iter::once(self.backfill.default_share));
    for share in shares {
      if !(0.0..1.0).contains(&share) {
        return bad(format!("backfill share must be in [0, 1), got {share}"));
      }
    }
    if self.backfill.start_hour > 23 {
      return bad(format!("backfill.start_hour must be 0..=23, got {}", self.backfill.start_hour));
    }
    Ok(())
  }
}

fn is_half_hour(hours: f64) -> bool {
  hours.is_finite() && (hours * 2.0).fract() == 0.0
}

fn validate_tiers(name: &str, tiers: &[SizeTier]) -> std::result::Result<(), TimesheetError> {
  let Some(last) = tiers.last() else {
    return Err(TimesheetError::InvalidConfig(format!("{name} must not be empty")));
  };
  if last.max_lines.is_some() {
    return Err(TimesheetError::InvalidConfig(format!("{name}: last tier must be open-ended (max_lines = null)")));
  }
  for pair in tiers.windows(2) {
    let (a, b) = (pair[0], pair[1]);
    let thresholds_ok = match (a.max_lines, b.max_lines) {
      (Some(x), Some(y)) => x < y,
      (Some(_), None) => true,
      (None, _) => false,
    };
    if !thresholds_ok || b.hours < a.hours {
      return Err(TimesheetError::InvalidConfig(format!("{name} must be monotonic non-decreasing")));
    }
  }
  if tiers.iter().any(|t| t.hours < 0.0) {
    return Err(TimesheetError::InvalidConfig(format!("{name} hours must be non-negative")));
  }
  Ok(())
}
