// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate per-range processing: collect commits, reconcile merges, estimate, render, write
// role: processing/orchestrator
// inputs: EffectiveConfig (with multi_windows), Vec<DateRange>
// outputs: Rendered timesheets on stdout or in the --out file
// side_effects: Reads git; may create the --out parent directory and write the file
// invariants:
// - One timesheet per range, in range order
// - multi_windows with JSON output renders an array; a single range renders an object
// errors: Propagates collection/estimation/write errors with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{EffectiveConfig, OutputFormat};
use crate::commit::collect_commits;
use crate::estimation::build_timesheet;
use crate::model::{CommitRecord, Timesheet};
use crate::params::build_collect_params;
use crate::reconcile::reconcile_merges;
use crate::render::{render_json, render_text_all};
use crate::window::DateRange;

/// Estimate a single range from already-collected commits.
pub fn timesheet_for_range(cfg: &EffectiveConfig, range: &DateRange, commits: Vec<CommitRecord>) -> Result<Timesheet> {
  let commits = if cfg.include_merges { reconcile_merges(commits) } else { commits };
  let mut ts = build_timesheet(&commits, range.start, range.end, &cfg.estimator)
    .with_context(|| format!("estimating {} .. {}", range.start, range.end))?;
  ts.label = range.label.clone();
  Ok(ts)
}

pub fn generate_range_timesheet(cfg: &EffectiveConfig, range: &DateRange) -> Result<Timesheet> {
  let params = build_collect_params(cfg, range)?;
  let commits = collect_commits(&params)?;
  let ts = timesheet_for_range(cfg, range, commits)?;
  info!(
    start = %ts.start,
    end = %ts.end,
    tracked_hours = ts.summary.tracked_hours,
    untracked_hours = ts.summary.untracked_hours,
    "timesheet built"
  );
  Ok(ts)
}

pub fn render_all(cfg: &EffectiveConfig, sheets: &[Timesheet]) -> Result<String> {
  match cfg.format {
    OutputFormat::Text => Ok(render_text_all(sheets)),
    OutputFormat::Json => render_json(sheets),
  }
}

pub fn write_output(out: &str, text: &str) -> Result<()> {
  if out == "-" {
    print!("{}", text);
    if !text.ends_with('\n') {
      println!();
    }
    return Ok(());
  }
  let out_path = std::path::Path::new(out);
  if let Some(parent) = out_path.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
  }
  std::fs::write(out_path, text).with_context(|| format!("writing {}", out_path.display()))
}

pub fn process_ranges(cfg: &EffectiveConfig, ranges: Vec<DateRange>) -> Result<()> {
  let mut sheets: Vec<Timesheet> = Vec::new();
  for r in ranges.iter() {
    sheets.push(generate_range_timesheet(cfg, r)?);
  }

  // A multi-bucket JSON run is always an array, even when it holds one bucket.
  let text = if cfg.multi_windows && cfg.format == OutputFormat::Json {
    serde_json::to_string_pretty(&sheets)?
  } else {
    render_all(cfg, &sheets)?
  };
  write_output(&cfg.out, &text)
}
