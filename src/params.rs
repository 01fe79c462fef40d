use anyhow::Result;

use crate::cli::EffectiveConfig;
use crate::commit::{CollectParams, IssueMatcher};
use crate::estimation::lookback_start;
use crate::window::DateRange;

pub fn build_issue_matcher(cfg: &EffectiveConfig) -> Result<IssueMatcher> {
  match &cfg.issue_pattern {
    Some(pattern) => IssueMatcher::from_pattern(pattern),
    None => IssueMatcher::from_prefixes(&cfg.issue_prefixes),
  }
}

/// Collection spans the lookback window before the range so task history is known.
pub fn build_collect_params(cfg: &EffectiveConfig, range: &DateRange) -> Result<CollectParams> {
  Ok(CollectParams {
    repo: cfg.repo.clone(),
    since: lookback_start(range.start, cfg.estimator.lookback_days)?,
    until: range.end,
    author: cfg.author.clone(),
    include_merges: cfg.include_merges,
    matcher: build_issue_matcher(cfg)?,
  })
}
