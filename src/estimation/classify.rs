// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Classify a task's nature from its title/message and line deltas; map type to a duration multiplier
// role: estimation/classifier
// outputs: TaskType; multiplier via TaskTypeMultipliers
// invariants:
// - First matching rule wins; rule order is part of the contract
// - Pure; no IO
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TaskTypeMultipliers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
  Feature,
  Fix,
  Clean,
  Build,
  Version,
  Refactor,
  Test,
  Infrastructure,
  Database,
}

impl TaskType {
  pub fn as_str(&self) -> &'static str {
    match self {
      TaskType::Feature => "feature",
      TaskType::Fix => "fix",
      TaskType::Clean => "clean",
      TaskType::Build => "build",
      TaskType::Version => "version",
      TaskType::Refactor => "refactor",
      TaskType::Test => "test",
      TaskType::Infrastructure => "infrastructure",
      TaskType::Database => "database",
    }
  }

  pub fn multiplier(&self, m: &TaskTypeMultipliers) -> f64 {
    match self {
      TaskType::Feature => m.feature,
      TaskType::Fix => m.fix,
      TaskType::Clean => m.clean,
      TaskType::Build => m.build,
      TaskType::Version => m.version,
      TaskType::Refactor => m.refactor,
      TaskType::Test => m.test,
      TaskType::Infrastructure => m.infrastructure,
      TaskType::Database => m.database,
    }
  }
}

impl std::fmt::Display for TaskType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

// Keywords match at a word start so plurals and -ing/-ed forms count.
fn keywords(pattern: &str) -> Regex {
  Regex::new(&format!(r"(?i)\b(?:{pattern})")).unwrap()
}

static RE_VERSION: Lazy<Regex> = Lazy::new(|| keywords(r"BUMP\s+VERSION|VERSION\s+BUMP"));
static RE_BUILD: Lazy<Regex> = Lazy::new(|| keywords(r"BUILD|PIPELINE|CI\b"));
static RE_BUILD_FAILURE: Lazy<Regex> = Lazy::new(|| keywords(r"FIX|ERROR"));
static RE_CLEAN: Lazy<Regex> = Lazy::new(|| keywords(r"CLEAN|CLEANUP|REMOVE|DELETE"));
static RE_CLEAN_UP: Lazy<Regex> = Lazy::new(|| keywords(r"CLEAN\s+UP"));
static RE_DATABASE: Lazy<Regex> = Lazy::new(|| keywords(r"DATABASE|MONGODB|SQLITE|REPLICAT|SYNC|STORE|STORAGE"));
static RE_FIX: Lazy<Regex> = Lazy::new(|| keywords(r"FIX|BUG|CRASH|ISSUE|ERROR"));
static RE_REFACTOR: Lazy<Regex> =
  Lazy::new(|| keywords(r"REFACTOR|REORGANIZE|RESTRUCTURE|REPLACE|CONSOLIDATE|MIGRATE|MOVE"));
static RE_TEST: Lazy<Regex> = Lazy::new(|| keywords(r"TEST|SPEC|COVERAGE"));
static RE_INFRA: Lazy<Regex> = Lazy::new(|| keywords(r"PIPELINE|DEPLOY|DOCKER|CONFIG|SETUP|DAEMON|SERVER"));

/// Classify one task cluster.
pub fn classify(title: &str, message: &str, lines_added: i64, lines_deleted: i64) -> TaskType {
  let text = format!("{title} {message}");

  if RE_VERSION.is_match(&text) {
    return TaskType::Version;
  }
  if RE_BUILD.is_match(&text) && RE_BUILD_FAILURE.is_match(&text) {
    return TaskType::Build;
  }
  if RE_CLEAN.is_match(&text) && (lines_deleted > lines_added || RE_CLEAN_UP.is_match(&text)) {
    return TaskType::Clean;
  }
  if RE_DATABASE.is_match(&text) {
    return TaskType::Database;
  }
  if RE_FIX.is_match(&text) {
    return TaskType::Fix;
  }
  if RE_REFACTOR.is_match(&text) {
    return TaskType::Refactor;
  }
  if RE_TEST.is_match(&text) {
    return TaskType::Test;
  }
  if RE_INFRA.is_match(&text) {
    return TaskType::Infrastructure;
  }
  TaskType::Feature
}
