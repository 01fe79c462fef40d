// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Mark merge commits that subsume already-collected feature commits as duplicates
// role: preprocessing/merge-reconciliation
// inputs: Collected CommitRecords (merge commits carry the source branch name)
// outputs: Same records with is_duplicate set on reconciled or empty merges
// invariants:
// - A candidate matches when Levenshtein distance <= half the longer normalized string
// - Only commits at or before the merge are candidates; the closest, then most recent, wins
// - Pure; never touches non-merge commits
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::CommitRecord;

static RE_MERGE_BRANCH: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^Merge (?:remote-tracking )?branch '([^']+)'|^Merge pull request #\d+ from (\S+)").unwrap()
});

/// Extract the source branch named by a merge commit subject.
pub fn merge_source_branch(subject: &str) -> Option<String> {
  let caps = RE_MERGE_BRANCH.captures(subject.trim())?;
  caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// Classic edit distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
  let b_chars: Vec<char> = b.chars().collect();
  let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
  let mut cur = vec![0usize; b_chars.len() + 1];

  for (i, ca) in a.chars().enumerate() {
    cur[0] = i + 1;
    for (j, cb) in b_chars.iter().enumerate() {
      let cost = if ca == *cb { 0 } else { 1 };
      cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
    }
    std::mem::swap(&mut prev, &mut cur);
  }
  prev[b_chars.len()]
}

/// Last path segment, lowercased, with `_` and whitespace folded to `-`.
pub fn normalize_ref(name: &str) -> String {
  let last = name.rsplit('/').next().unwrap_or(name);
  last
    .trim()
    .to_lowercase()
    .chars()
    .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
    .collect()
}

/// Whether `distance` is close enough for strings of these lengths.
pub fn is_close(distance: usize, a_len: usize, b_len: usize) -> bool {
  distance <= a_len.max(b_len) / 2
}

/// Index of the best-matching candidate for `branch`, if any is close enough.
pub fn best_match(branch: &str, candidates: &[(usize, &str)]) -> Option<usize> {
  let target = normalize_ref(branch);
  let target_len = target.chars().count();

  let mut best: Option<(usize, usize)> = None;
  for (idx, task_id) in candidates {
    let norm = normalize_ref(task_id);
    let d = levenshtein(&target, &norm);
    if !is_close(d, target_len, norm.chars().count()) {
      continue;
    }
    // later candidates win ties so the most recent commit is preferred
    if best.map(|(_, bd)| d <= bd).unwrap_or(true) {
      best = Some((*idx, d));
    }
  }
  best.map(|(i, _)| i)
}

pub fn reconcile_merges(commits: Vec<CommitRecord>) -> Vec<CommitRecord> {
  let mut out = commits;
  let mut order: Vec<usize> = (0..out.len()).collect();
  order.sort_by(|a, b| out[*a].timestamp.cmp(&out[*b].timestamp).then_with(|| out[*a].sha.cmp(&out[*b].sha)));

  for (pos, &mi) in order.iter().enumerate() {
    if !out[mi].is_merge {
      continue;
    }

    let matched = match out[mi].branch.as_deref() {
      Some(branch) => {
        let candidates: Vec<(usize, &str)> = order[..pos]
          .iter()
          .filter(|&&ci| !out[ci].is_merge)
          .map(|&ci| (ci, out[ci].task_id.as_str()))
          .collect();
        let by_issue = out[mi]
          .issue_id
          .as_deref()
          .and_then(|id| candidates.iter().rev().find(|(ci, _)| out[*ci].issue_id.as_deref() == Some(id)).map(|(ci, _)| *ci));
        by_issue.or_else(|| best_match(branch, &candidates))
      }
      None => None,
    };

    match matched {
      Some(ci) => {
        debug!(merge = %out[mi].sha, feature = %out[ci].sha, "merge commit reconciled into feature commit");
        out[mi].is_duplicate = true;
      }
      None if out[mi].lines_changed() == 0 => {
        debug!(merge = %out[mi].sha, "empty merge commit skipped");
        out[mi].is_duplicate = true;
      }
      None => {}
    }
  }

  out
}
