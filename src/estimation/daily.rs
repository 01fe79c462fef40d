// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Convert each per-day task cluster into a raw hour estimate
// role: estimation/daily
// inputs: Day-grouped TaskClusters, TaskLifecycle, EstimatorConfig (strategy, tiers, multipliers)
// outputs: DayMap of TaskEstimates, one per cluster, in cluster order
// invariants:
// - One strategy per run, applied to every tracked cluster
// - Untracked clusters always use the untracked size table
// - Results are quantized to 0.5h within [min_task_hours, max_task_hours]
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::trace;

use super::classify::{classify, TaskType};
use super::group::{TaskCluster, TaskLifecycle};
use super::{quantize, DayMap, TaskEstimate};
use crate::config::{tier_hours, EstimationStrategy, EstimatorConfig};

/// Size-tiered hours for a tracked cluster.
pub fn size_tiered_hours(cluster: &TaskCluster, task_type: TaskType, cfg: &EstimatorConfig) -> f64 {
  let multiplier = task_type.multiplier(&cfg.multipliers);
  let lines = cluster.lines_changed();

  if !cluster.first_day {
    // follow-up commits: coarse table, never inflated by the type multiplier
    return quantize(tier_hours(&cfg.follow_up_tiers, lines) * multiplier.min(1.0), cfg);
  }

  let mut hours = tier_hours(&cfg.tracked_tiers, lines) * multiplier;
  for threshold in &cfg.files_bonus_thresholds {
    if cluster.files_changed > *threshold {
      hours += cfg.files_bonus_hours;
    }
  }
  quantize(hours, cfg)
}

/// Elapsed-time hours for a tracked cluster, pulled toward `size_estimate` when far off.
pub fn time_delta_hours(cluster: &TaskCluster, lifecycle: &TaskLifecycle, size_estimate: f64, cfg: &EstimatorConfig) -> f64 {
  let td = &cfg.time_delta;

  // The span inside a cluster is never a gap: a task's first cluster keeps the size estimate.
  let Some(previous) = lifecycle.previous_commit(&cluster.task_id, cluster.start_time()) else {
    return size_estimate;
  };
  let gap = (cluster.end_time() - previous).num_seconds() as f64 / 3600.0;
  if gap <= 0.0 {
    return size_estimate;
  }

  let mut hours = gap;
  if gap > td.sleep_after_hours {
    let blocks = (gap / 24.0).ceil().max(1.0);
    hours -= blocks * td.sleep_hours_per_day;
  }
  hours = hours.clamp(0.0, td.max_session_hours);

  if size_estimate > 0.0 {
    if hours > td.over_ratio * size_estimate {
      hours = (hours * size_estimate).sqrt();
    } else if hours < td.under_ratio * size_estimate && size_estimate > td.under_min_size_hours {
      hours = (hours * size_estimate).sqrt();
    }
  }
  quantize(hours, cfg)
}

/// Hours for an untracked (no issue id) cluster.
pub fn untracked_hours(cluster: &TaskCluster, task_type: TaskType, cfg: &EstimatorConfig) -> f64 {
  quantize(tier_hours(&cfg.untracked_tiers, cluster.lines_changed()) * task_type.multiplier(&cfg.multipliers), cfg)
}

pub fn estimate_cluster(cluster: &TaskCluster, lifecycle: &TaskLifecycle, cfg: &EstimatorConfig) -> TaskEstimate {
  let title = cluster.title();
  let task_type = classify(&title, &cluster.combined_message(), cluster.lines_added, cluster.lines_deleted);

  let hours = if !cluster.tracked() {
    untracked_hours(cluster, task_type, cfg)
  } else {
    let size = size_tiered_hours(cluster, task_type, cfg);
    match cfg.strategy {
      EstimationStrategy::SizeTiered => size,
      EstimationStrategy::TimeDelta => time_delta_hours(cluster, lifecycle, size, cfg),
    }
  };

  trace!(task = %cluster.task_id, %task_type, lines = cluster.lines_changed(), hours, "cluster estimate");

  TaskEstimate {
    task_id: cluster.task_id.clone(),
    title,
    issue_id: cluster.issue_id(),
    tracked: cluster.tracked(),
    task_type,
    hours,
    start_time: cluster.start_time(),
    commit_count: cluster.commits.len(),
    lines_added: cluster.lines_added,
    lines_deleted: cluster.lines_deleted,
    files_changed: cluster.files_changed,
    first_day: cluster.first_day,
    lifecycle_lines: lifecycle.total_lines(&cluster.task_id),
    backfilled: false,
  }
}

pub fn estimate_days(
  clusters: &BTreeMap<NaiveDate, Vec<TaskCluster>>,
  lifecycle: &TaskLifecycle,
  cfg: &EstimatorConfig,
) -> DayMap {
  clusters
    .iter()
    .map(|(date, day)| (*date, day.iter().map(|c| estimate_cluster(c, lifecycle, cfg)).collect()))
    .collect()
}
