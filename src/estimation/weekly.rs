// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Nudge each ISO week's tracked total toward the weekly target by a bounded scale factor
// role: estimation/weekly
// inputs: Backfilled DayMap; weekly target, scale bounds and dead-band from EstimatorConfig
// outputs: New DayMap with scaled hours (tracked, and untracked when configured)
// invariants:
// - Weeks with zero tracked hours are skipped (no division by zero)
// - Factors within the dead-band leave the week untouched
// - Scaled hours are re-quantized into [min_task_hours, max_task_hours]
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::{quantize, tracked_hours, DayMap};
use crate::config::EstimatorConfig;

/// ISO-8601 (year, week) key; weeks start on Monday.
pub fn iso_week_key(date: NaiveDate) -> (i32, u32) {
  let w = date.iso_week();
  (w.year(), w.week())
}

/// The factor a week would be scaled by, or `None` when the week is left alone.
pub fn week_scale_factor(tracked_total: f64, days_with_work: usize, cfg: &EstimatorConfig) -> Option<f64> {
  if tracked_total <= 0.0 || days_with_work == 0 {
    return None;
  }
  let work_days = cfg.work_days_per_week as usize;
  let target = cfg.weekly_target_hours * days_with_work.min(work_days) as f64 / work_days as f64;
  let factor = (target / tracked_total).clamp(cfg.scale_min, cfg.scale_max);
  if (factor - 1.0).abs() < cfg.scale_dead_band {
    return None;
  }
  Some(factor)
}

pub fn scale_weeks(days: &DayMap, cfg: &EstimatorConfig) -> DayMap {
  let mut weeks: BTreeMap<(i32, u32), Vec<NaiveDate>> = BTreeMap::new();
  for date in days.keys() {
    weeks.entry(iso_week_key(*date)).or_default().push(*date);
  }

  let mut out = DayMap::new();
  for ((year, week), dates) in weeks {
    let total = dates.iter().fold(0.0, |acc, d| acc + tracked_hours(&days[d]));
    let days_with_work = dates.iter().filter(|d| !days[*d].is_empty()).count();

    let factor = week_scale_factor(total, days_with_work, cfg);
    if let Some(f) = factor {
      debug!(year, week, total, days_with_work, factor = f, "scaling week");
    }

    for date in dates {
      let tasks = days[&date]
        .iter()
        .map(|t| match factor {
          Some(f) if t.tracked || cfg.scale_untracked => t.with_hours(quantize(t.hours * f, cfg)),
          _ => t.clone(),
        })
        .collect();
      out.insert(date, tasks);
    }
  }
  out
}
