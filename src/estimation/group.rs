// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Group active commits into per-day, per-task clusters and index each task's lifecycle
// role: estimation/grouping
// inputs: Chronologically sorted active CommitRecord references
// outputs: BTreeMap<date, Vec<TaskCluster>> (tasks ordered by first commit); TaskLifecycle
// invariants:
// - Commit order inside a cluster is the input order (chronological)
// - first_day is evaluated against the lifecycle of all active commits, not only the window
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::CommitRecord;

#[derive(Debug, Clone)]
pub struct TaskCluster<'a> {
  pub task_id: String,
  pub commits: Vec<&'a CommitRecord>,
  pub lines_added: i64,
  pub lines_deleted: i64,
  pub files_changed: i64,
  pub first_day: bool,
}

impl<'a> TaskCluster<'a> {
  fn new(first: &'a CommitRecord) -> Self {
    Self {
      task_id: first.task_id.clone(),
      commits: Vec::new(),
      lines_added: 0,
      lines_deleted: 0,
      files_changed: 0,
      first_day: false,
    }
  }

  fn push(&mut self, commit: &'a CommitRecord) {
    self.lines_added += commit.lines_added;
    self.lines_deleted += commit.lines_deleted;
    self.files_changed += commit.files_changed;
    self.commits.push(commit);
  }

  fn first(&self) -> &'a CommitRecord {
    self.commits[0]
  }

  pub fn lines_changed(&self) -> i64 {
    self.lines_added + self.lines_deleted
  }

  pub fn start_time(&self) -> NaiveDateTime {
    self.first().timestamp
  }

  pub fn end_time(&self) -> NaiveDateTime {
    self.commits.last().map(|c| c.timestamp).unwrap_or_else(|| self.start_time())
  }

  pub fn title(&self) -> String {
    self.first().title()
  }

  pub fn issue_id(&self) -> Option<String> {
    self.first().issue_id.clone()
  }

  pub fn tracked(&self) -> bool {
    self.first().has_issue
  }

  /// Messages of every commit in the cluster, joined for keyword classification.
  pub fn combined_message(&self) -> String {
    self.commits.iter().map(|c| c.message.as_str()).collect::<Vec<_>>().join("\n")
  }
}

/// Per-task history over every active commit.
#[derive(Debug, Default, Clone)]
pub struct TaskLifecycle {
  first_day: HashMap<String, NaiveDate>,
  total_lines: HashMap<String, i64>,
  timeline: HashMap<String, Vec<NaiveDateTime>>,
}

impl TaskLifecycle {
  /// `commits` must be sorted chronologically.
  pub fn build(commits: &[&CommitRecord]) -> Self {
    let mut lc = TaskLifecycle::default();
    for c in commits {
      lc.first_day.entry(c.task_id.clone()).or_insert_with(|| c.date());
      *lc.total_lines.entry(c.task_id.clone()).or_insert(0) += c.lines_changed();
      lc.timeline.entry(c.task_id.clone()).or_default().push(c.timestamp);
    }
    lc
  }

  pub fn is_first_day(&self, task_id: &str, date: NaiveDate) -> bool {
    self.first_day.get(task_id).map(|d| *d == date).unwrap_or(true)
  }

  pub fn total_lines(&self, task_id: &str) -> i64 {
    self.total_lines.get(task_id).copied().unwrap_or(0)
  }

  /// The task's latest commit strictly before `before`.
  pub fn previous_commit(&self, task_id: &str, before: NaiveDateTime) -> Option<NaiveDateTime> {
    let times = self.timeline.get(task_id)?;
    let idx = times.partition_point(|t| *t < before);
    if idx == 0 { None } else { Some(times[idx - 1]) }
  }
}

/// Group sorted commits by day, then by task id in order of first appearance.
pub fn group_commits<'a>(commits: &[&'a CommitRecord], lifecycle: &TaskLifecycle) -> BTreeMap<NaiveDate, Vec<TaskCluster<'a>>> {
  let mut out: BTreeMap<NaiveDate, Vec<TaskCluster<'a>>> = BTreeMap::new();
  let mut slot: HashMap<(NaiveDate, &str), usize> = HashMap::new();

  for &c in commits {
    let date = c.date();
    let clusters = out.entry(date).or_default();
    let idx = *slot.entry((date, c.task_id.as_str())).or_insert_with(|| {
      clusters.push(TaskCluster::new(c));
      clusters.len() - 1
    });
    clusters[idx].push(c);
  }

  for (date, clusters) in out.iter_mut() {
    for cluster in clusters.iter_mut() {
      cluster.first_day = lifecycle.is_first_day(&cluster.task_id, *date);
    }
  }

  out
}
