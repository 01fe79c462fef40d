// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Construct CommitRecords from git metadata and numstat; detect issue ids; collect a window in parallel
// role: commit construction/collection
// inputs: repo path, commit shas, CollectParams (dates, author, merges, issue matcher)
// outputs: CommitRecords in chronological order with author-local timestamps
// side_effects: Reads git
// invariants:
// - task_id is never empty (issue id, else the derived title)
// - Records are filtered by author date to [since, until] inclusive
// - Output order matches rev-list order regardless of parallelism
// errors: Propagates git IO errors and unparseable author dates with the offending sha
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate};
use rayon::prelude::*;
use regex::Regex;
use tracing::{info, warn};

use crate::gitio::{self, Meta};
use crate::model::{display_title, CommitRecord};
use crate::reconcile::merge_source_branch;
use crate::util::short_sha;

const DEFAULT_ISSUE_PATTERN: &str = r"\b[A-Z][A-Z0-9]+-\d+\b";

/// Finds issue identifiers such as `ABC-123` in commit text.
#[derive(Debug, Clone)]
pub struct IssueMatcher {
  re: Regex,
  uppercase: bool,
}

impl Default for IssueMatcher {
  fn default() -> Self {
    Self { re: Regex::new(DEFAULT_ISSUE_PATTERN).unwrap_or_else(|_| unreachable!()), uppercase: false }
  }
}

impl IssueMatcher {
  /// Match only the given project keys, case-insensitively.
  pub fn from_prefixes(prefixes: &[String]) -> Result<Self> {
    if prefixes.is_empty() {
      return Ok(Self::default());
    }
    let alts: Vec<String> = prefixes.iter().map(|p| regex::escape(p.trim())).collect();
    let re = Regex::new(&format!(r"(?i)\b(?:{})-\d+\b", alts.join("|"))).context("building issue prefix pattern")?;
    Ok(Self { re, uppercase: true })
  }

  pub fn from_pattern(pattern: &str) -> Result<Self> {
    let re = Regex::new(pattern).with_context(|| format!("invalid --issue-pattern {:?}", pattern))?;
    Ok(Self { re, uppercase: false })
  }

  pub fn find(&self, text: &str) -> Option<String> {
    let m = self.re.find(text)?;
    let id = m.as_str();
    Some(if self.uppercase { id.to_ascii_uppercase() } else { id.to_string() })
  }
}

#[derive(Debug)]
pub struct CollectParams {
  pub repo: String,
  pub since: NaiveDate,
  pub until: NaiveDate,
  pub author: Option<String>,
  pub include_merges: bool,
  pub matcher: IssueMatcher,
}

pub fn build_commit_record(
  meta: &Meta,
  numstat: &[(String, Option<i64>, Option<i64>)],
  matcher: &IssueMatcher,
) -> Result<CommitRecord> {
  let timestamp = DateTime::parse_from_rfc3339(meta.author_date.trim())
    .with_context(|| format!("commit {}: bad author date {:?}", short_sha(&meta.sha), meta.author_date))?
    .naive_local();

  let message = meta.message();
  let is_merge = meta.is_merge();
  let branch = if is_merge { merge_source_branch(&meta.subject) } else { None };

  let issue_id = matcher
    .find(&meta.subject)
    .or_else(|| matcher.find(&message))
    .or_else(|| branch.as_deref().and_then(|b| matcher.find(b)));
  let task_id = match &issue_id {
    Some(id) => id.clone(),
    None => display_title(&message, None),
  };

  Ok(CommitRecord {
    sha: meta.sha.clone(),
    timestamp,
    message,
    task_id,
    has_issue: issue_id.is_some(),
    issue_id,
    is_merge,
    is_duplicate: false,
    files_changed: numstat.len() as i64,
    lines_added: numstat.iter().filter_map(|(_, a, _)| *a).sum(),
    lines_deleted: numstat.iter().filter_map(|(_, _, d)| *d).sum(),
    branch,
  })
}

/// Loads a single commit.
pub fn load_commit(repo: &str, sha: &str, matcher: &IssueMatcher) -> Result<CommitRecord> {
  let meta = gitio::commit_meta(repo, sha)?;
  let numstat = gitio::commit_numstat(repo, sha, meta.is_merge())?;
  build_commit_record(&meta, &numstat, matcher)
}

/// Collects every commit authored within `[since, until]`.
///
/// `rev-list` bounds on commit date, so the query is widened by a day on each
/// side and the result is filtered on author date afterwards.
pub fn collect_commits(params: &CollectParams) -> Result<Vec<CommitRecord>> {
  let since = format!("{} 00:00:00", params.since - Duration::days(1));
  let until = format!("{} 23:59:59", params.until + Duration::days(1));
  let shas = gitio::rev_list(&params.repo, &since, &until, params.author.as_deref(), params.include_merges)?;

  let loaded: Vec<CommitRecord> = shas
    .par_iter()
    .map(|sha| load_commit(&params.repo, sha, &params.matcher))
    .collect::<Result<Vec<_>>>()?;

  let total = loaded.len();
  let commits: Vec<CommitRecord> = loaded
    .into_iter()
    .filter(|c| c.date() >= params.since && c.date() <= params.until)
    .collect();

  if commits.iter().any(|c| c.is_merge && c.branch.is_none()) {
    warn!("some merge commits name no source branch; they cannot be reconciled");
  }
  info!(repo = %params.repo, scanned = total, kept = commits.len(), since = %params.since, until = %params.until, "collected commits");
  Ok(commits)
}
