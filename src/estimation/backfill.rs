// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Move part of a large first-day task's hours back into a light preceding day
// role: estimation/backfill
// inputs: Raw DayMap from the daily estimator; BackfillConfig thresholds
// outputs: New DayMap with synthetic backfilled entries on light days and reduced source entries
// invariants:
// - Total hours are conserved exactly (all quantities are multiples of 0.5)
// - A task is a backfill source at most once; synthetic entries are never sources
// - Source entries keep at least min_remaining_hours; destination days stay within max_hours_per_day
// - Destination days are never before first_exposed, so no hours vanish into the lookback window
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use super::{floor_half, round_half, total_hours, tracked_hours, DayMap, TaskEstimate};
use crate::config::EstimatorConfig;

pub fn backfill(days: &DayMap, first_exposed: NaiveDate, cfg: &EstimatorConfig) -> DayMap {
  let mut out = days.clone();
  let bf = &cfg.backfill;
  if !bf.enabled {
    return out;
  }

  let dates: Vec<_> = out.iter().filter(|(_, tasks)| !tasks.is_empty()).map(|(d, _)| *d).collect();
  let start_time = NaiveTime::from_hms_opt(bf.start_hour, 0, 0).unwrap_or(NaiveTime::MIN);
  let mut used_sources: HashSet<String> = HashSet::new();

  for pair in dates.windows(2) {
    let (light_day, heavy_day) = (pair[0], pair[1]);
    if light_day < first_exposed || (heavy_day - light_day).num_days() > bf.max_gap_days {
      continue;
    }

    let light_tracked = tracked_hours(&out[&light_day]);
    let mut light_total = total_hours(&out[&light_day]);
    let mut heavy_tracked = tracked_hours(&out[&heavy_day]);
    if !(light_tracked < bf.light_day_hours && heavy_tracked > bf.heavy_day_hours) {
      continue;
    }

    // Candidates: tracked first-day tasks on the heavy day, largest first.
    let mut candidates: Vec<usize> = out[&heavy_day]
      .iter()
      .enumerate()
      .filter(|(_, t)| {
        t.tracked && t.first_day && !t.backfilled && t.hours >= bf.min_candidate_hours && !used_sources.contains(&t.task_id)
      })
      .map(|(i, _)| i)
      .collect();
    let heavy_tasks = &out[&heavy_day];
    candidates.sort_by(|a, b| {
      heavy_tasks[*b]
        .hours
        .total_cmp(&heavy_tasks[*a].hours)
        .then_with(|| heavy_tasks[*a].task_id.cmp(&heavy_tasks[*b].task_id))
    });

    let mut moves: Vec<(usize, TaskEstimate)> = Vec::new();
    for idx in candidates {
      let source = &out[&heavy_day][idx];
      used_sources.insert(source.task_id.clone());

      let share = bf.share_for(source.lifecycle_lines);
      let moved = round_half(source.hours * share)
        .min(cfg.max_task_hours)
        .min(floor_half(source.hours - bf.min_remaining_hours))
        .min(floor_half(heavy_tracked - bf.light_day_hours))
        .min(floor_half(cfg.max_hours_per_day - light_total));

      if moved < bf.min_move_hours {
        debug!(task = %source.task_id, moved, "backfill move below threshold; skipped");
        continue;
      }

      let mut synthetic = source.with_hours(moved);
      synthetic.commit_count = 0;
      synthetic.backfilled = true;
      synthetic.first_day = false;
      synthetic.start_time = light_day.and_time(start_time);

      debug!(task = %source.task_id, from = %heavy_day, to = %light_day, moved, share, "backfilled hours");
      heavy_tracked -= moved;
      light_total += moved;
      moves.push((idx, synthetic));
    }

    for (idx, synthetic) in moves {
      if let Some(tasks) = out.get_mut(&heavy_day) {
        let remaining = tasks[idx].hours - synthetic.hours;
        tasks[idx] = tasks[idx].with_hours(remaining);
      }
      out.entry(light_day).or_default().push(synthetic);
    }
  }

  out
}
