//! Property tests over randomly generated two-week histories.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use git_timesheet::estimation::{backfill::backfill, daily::estimate_days, group, total_hours};
use git_timesheet::{build_timesheet, CommitRecord, EstimatorConfig};

use crate::pipeline_scenarios::{commit, day};

const TITLES: &[&str] = &["add exporter", "fix crash on save", "refactor parser", "cleanup old flags", "add tests"];

fn history() -> impl Strategy<Value = Vec<CommitRecord>> {
  let one = (0i64..14, 7u32..21, proptest::option::of(1u8..7), 0i64..3000, 0usize..TITLES.len());
  prop::collection::vec(one, 0..40).prop_map(|rows| {
    rows
      .into_iter()
      .enumerate()
      .map(|(i, (offset, hour, issue, lines, title))| {
        let date = day("2025-08-04") + Duration::days(offset);
        let ts = format!("{} {:02}:{:02}", date, hour, i % 60);
        let issue = issue.map(|n| format!("ABC-{n}"));
        let message = match &issue {
          Some(id) => format!("{id} {}", TITLES[title]),
          None => TITLES[title].to_string(),
        };
        commit(&format!("{i:04}"), &ts, &message, issue.as_deref(), lines)
      })
      .collect()
  })
}

fn range() -> (NaiveDate, NaiveDate) {
  (day("2025-08-11"), day("2025-08-17"))
}

proptest! {
  #[test]
  fn hours_are_quantized_and_bounded(commits in history()) {
    let cfg = EstimatorConfig::default();
    let (start, end) = range();
    let ts = build_timesheet(&commits, start, end, &cfg).unwrap();
    for d in &ts.days {
      prop_assert!(d.total_hours() <= cfg.max_hours_per_day);
      for t in d.tracked.iter().chain(d.untracked.iter()) {
        prop_assert!(t.hours >= cfg.min_task_hours && t.hours <= cfg.max_task_hours, "{} has {}h", t.task_id, t.hours);
        prop_assert_eq!((t.hours * 2.0).fract(), 0.0);
      }
    }
  }

  #[test]
  fn input_order_does_not_matter(commits in history()) {
    let cfg = EstimatorConfig::default();
    let (start, end) = range();
    let forward = build_timesheet(&commits, start, end, &cfg).unwrap();
    let mut reversed = commits.clone();
    reversed.reverse();
    prop_assert_eq!(forward, build_timesheet(&reversed, start, end, &cfg).unwrap());
  }

  #[test]
  fn summary_counts_commits_in_range(commits in history()) {
    let (start, end) = range();
    let ts = build_timesheet(&commits, start, end, &EstimatorConfig::default()).unwrap();
    let in_range: Vec<&CommitRecord> = commits.iter().filter(|c| c.date() >= start && c.date() <= end).collect();
    prop_assert_eq!(ts.summary.total_commits, in_range.len());
    prop_assert_eq!(ts.summary.tracked_commits, in_range.iter().filter(|c| c.has_issue).count());
    prop_assert_eq!(ts.days.len(), 7);
  }

  #[test]
  fn backfill_moves_hours_without_creating_them(commits in history()) {
    let cfg = EstimatorConfig::default();
    let mut sorted: Vec<&CommitRecord> = commits.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.sha.cmp(&b.sha)));
    let lifecycle = group::TaskLifecycle::build(&sorted);
    let raw = estimate_days(&group::group_commits(&sorted, &lifecycle), &lifecycle, &cfg);
    let moved = backfill(&raw, day("2025-08-04"), &cfg);

    let before: f64 = raw.values().map(|t| total_hours(t)).sum();
    let after: f64 = moved.values().map(|t| total_hours(t)).sum();
    prop_assert!((before - after).abs() < 1e-9);
    prop_assert!(moved.values().flatten().all(|t| t.hours >= cfg.min_task_hours));
  }
}
