// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Enforce the per-day ceiling and build the final day-keyed Timesheet with summary counters
// role: estimation/assembly
// inputs: Scaled DayMap, active commits dated inside the requested range, start/end, EstimatorConfig
// outputs: Timesheet with one TimesheetDay per exposed date
// invariants:
// - Every exposed day totals at most max_hours_per_day
// - Summary counters come from commits, independent of hours
// - Task lists are ordered by start time, then task id
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use super::{round_half, total_hours, DayMap, TaskEstimate};
use crate::config::EstimatorConfig;
use crate::model::{CommitRecord, TaskWork, Timesheet, TimesheetDay, TimesheetSummary};

const STEP: f64 = 0.5;

/// Scale a day's tasks down so the day fits under `max_hours_per_day`.
pub fn cap_day(tasks: &[TaskEstimate], cfg: &EstimatorConfig) -> Vec<TaskEstimate> {
  let total = total_hours(tasks);
  if total <= cfg.max_hours_per_day || total <= 0.0 {
    return tasks.to_vec();
  }

  let factor = cfg.max_hours_per_day / total;
  let mut capped: Vec<TaskEstimate> = tasks
    .iter()
    .map(|t| t.with_hours(round_half(t.hours * factor).max(cfg.min_task_hours)))
    .collect();

  // Rounding and re-flooring can leave the day slightly over; trim the largest tasks.
  while total_hours(&capped) > cfg.max_hours_per_day {
    let reducible = capped
      .iter()
      .enumerate()
      .filter(|(_, t)| t.hours - STEP >= cfg.min_task_hours)
      .max_by(|(ia, a), (ib, b)| {
        (!a.tracked)
          .cmp(&!b.tracked)
          .then(a.hours.total_cmp(&b.hours))
          .then(ib.cmp(ia))
      })
      .map(|(i, _)| i);

    match reducible {
      Some(i) => {
        let h = capped[i].hours - STEP;
        capped[i] = capped[i].with_hours(h);
      }
      None => {
        // Everything sits on the floor: drop the latest untracked entry, then tracked.
        let victim = capped
          .iter()
          .enumerate()
          .max_by(|(_, a), (_, b)| (!a.tracked).cmp(&!b.tracked).then(a.start_time.cmp(&b.start_time)))
          .map(|(i, _)| i);
        match victim {
          Some(i) => {
            capped.remove(i);
          }
          None => break,
        }
      }
    }
  }

  debug!(total, capped = total_hours(&capped), "day over ceiling; scaled down");
  capped
}

fn to_work(t: &TaskEstimate) -> TaskWork {
  TaskWork {
    title: t.title.clone(),
    task_id: t.task_id.clone(),
    issue_id: t.issue_id.clone(),
    hours: t.hours,
    start_time: t.start_time,
    commit_count: t.commit_count,
    task_type: t.task_type,
    backfilled: t.backfilled,
  }
}

fn is_weekend(date: NaiveDate) -> bool {
  matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn summarize(commits: &[&CommitRecord], days: &[TimesheetDay]) -> TimesheetSummary {
  let tracked: Vec<&&CommitRecord> = commits.iter().filter(|c| c.has_issue).collect();
  let tasks: BTreeSet<&str> = tracked.iter().map(|c| c.task_id.as_str()).collect();
  TimesheetSummary {
    total_commits: commits.len(),
    tracked_commits: tracked.len(),
    tracked_tasks: tasks.len(),
    tracked_hours: days.iter().fold(0.0, |acc, d| acc + d.tracked_hours()),
    untracked_hours: days.iter().fold(0.0, |acc, d| acc + d.untracked_hours()),
  }
}

/// Build the exposed `[start, end]` days from the scaled estimates.
pub fn assemble(
  days: &DayMap,
  commits_in_range: &[&CommitRecord],
  start: NaiveDate,
  end: NaiveDate,
  cfg: &EstimatorConfig,
) -> Timesheet {
  let mut out: Vec<TimesheetDay> = Vec::new();

  for date in start.iter_days().take_while(|d| *d <= end) {
    let mut tasks = days.get(&date).map(|t| cap_day(t, cfg)).unwrap_or_default();
    if tasks.is_empty() && !cfg.include_weekends && is_weekend(date) {
      continue;
    }
    tasks.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.task_id.cmp(&b.task_id)));

    let mut day = TimesheetDay::empty(date);
    for t in &tasks {
      if t.tracked {
        day.tracked.push(to_work(t));
      } else {
        day.untracked.push(to_work(t));
      }
    }
    out.push(day);
  }

  let summary = summarize(commits_in_range, &out);
  Timesheet { label: None, start, end, days: out, summary }
}
