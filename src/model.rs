use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::estimation::classify::TaskType;

/// Display titles and untracked task ids are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
  pub sha: String,
  /// Author-local wall-clock time.
  pub timestamp: NaiveDateTime,
  pub message: String,
  pub task_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub issue_id: Option<String>,
  pub has_issue: bool,
  pub is_merge: bool,
  pub is_duplicate: bool,
  pub files_changed: i64,
  pub lines_added: i64,
  pub lines_deleted: i64,
  /// Source branch named by a merge commit subject.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub branch: Option<String>,
}

impl CommitRecord {
  pub fn date(&self) -> NaiveDate {
    self.timestamp.date()
  }

  pub fn lines_changed(&self) -> i64 {
    self.lines_added + self.lines_deleted
  }

  /// First line of the message with a leading issue id and separators removed.
  pub fn title(&self) -> String {
    display_title(&self.message, self.issue_id.as_deref())
  }
}

/// Derive a display title from a commit message.
pub fn display_title(message: &str, issue_id: Option<&str>) -> String {
  let first = message.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
  let mut rest = first;

  if let Some(id) = issue_id {
    let bracketed = format!("[{id}]");
    let upper = rest.to_ascii_uppercase();
    if upper.starts_with(&bracketed.to_ascii_uppercase()) {
      rest = &rest[bracketed.len()..];
    } else if upper.starts_with(&id.to_ascii_uppercase()) {
      rest = &rest[id.len()..];
    }
    rest = rest.trim_start_matches(|c: char| c == ':' || c == '-' || c == ' ' || c == '#');
  }

  let title: String = rest.chars().take(TITLE_MAX_CHARS).collect();
  let title = title.trim().to_string();
  if title.is_empty() {
    if first.is_empty() { "(no message)".to_string() } else { first.chars().take(TITLE_MAX_CHARS).collect() }
  } else {
    title
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWork {
  pub title: String,
  pub task_id: String,
  pub issue_id: Option<String>,
  pub hours: f64,
  pub start_time: NaiveDateTime,
  pub commit_count: usize,
  pub task_type: TaskType,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub backfilled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetDay {
  pub date: NaiveDate,
  pub tracked: Vec<TaskWork>,
  pub untracked: Vec<TaskWork>,
}

impl TimesheetDay {
  pub fn empty(date: NaiveDate) -> Self {
    Self { date, tracked: Vec::new(), untracked: Vec::new() }
  }

  pub fn tracked_hours(&self) -> f64 {
    self.tracked.iter().fold(0.0, |acc, t| acc + t.hours)
  }

  pub fn untracked_hours(&self) -> f64 {
    self.untracked.iter().fold(0.0, |acc, t| acc + t.hours)
  }

  pub fn total_hours(&self) -> f64 {
    self.tracked_hours() + self.untracked_hours()
  }

  pub fn is_empty(&self) -> bool {
    self.tracked.is_empty() && self.untracked.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetSummary {
  pub total_commits: usize,
  pub tracked_commits: usize,
  pub tracked_tasks: usize,
  pub tracked_hours: f64,
  pub untracked_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timesheet {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub days: Vec<TimesheetDay>,
  pub summary: TimesheetSummary,
}
