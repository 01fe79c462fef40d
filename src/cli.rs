use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::EstimatorConfig;
use crate::gitio;
use crate::util;
use crate::window::WindowSpec;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
  Text,
  Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "git-timesheet",
    version,
    about = "Estimate a daily timesheet from Git history",
    long_about = None
)]
pub struct Cli {
  /// Path to a Git repository (default: current dir)
  #[arg(long, default_value = ".")]
  pub repo: PathBuf,

  /// Calendar month, e.g. 2025-08
  #[arg(long)]
  pub month: Option<String>,

  /// Natural language window, e.g. "last week" or "every week for the last 4 weeks"
  #[arg(long = "for")]
  pub for_str: Option<String>,

  /// First day to report (YYYY-MM-DD, inclusive); must be paired with --until
  #[arg(long, alias = "start")]
  pub since: Option<String>,

  /// Last day to report (YYYY-MM-DD, inclusive); must be paired with --since
  #[arg(long, alias = "end")]
  pub until: Option<String>,

  /// Only count commits by this author (default: git config user.email)
  #[arg(long, conflicts_with = "all_authors")]
  pub author: Option<String>,

  /// Count commits from every author
  #[arg(long)]
  pub all_authors: bool,

  /// Issue key prefix to recognize, e.g. ABC (repeatable; matched case-insensitively)
  #[arg(long = "issue-prefix", conflicts_with = "issue_pattern")]
  pub issue_prefixes: Vec<String>,

  /// Custom regex for issue ids (default: uppercase KEY-123 tokens)
  #[arg(long)]
  pub issue_pattern: Option<String>,

  /// Include merge commits (reconciled against the feature commits they merge)
  #[arg(long)]
  pub include_merges: bool,

  /// JSON file with estimator settings; missing keys keep their defaults
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Override the weekly target hours
  #[arg(long)]
  pub weekly_target: Option<f64>,

  /// Override how many days before the range are considered for task history
  #[arg(long)]
  pub lookback_days: Option<i64>,

  /// Omit Saturdays and Sundays that carry no work
  #[arg(long)]
  pub exclude_weekends: bool,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,

  /// Output file path (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Log pipeline decisions to stderr
  #[arg(long, short = 'v')]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant for natural-language parsing (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub repo: String, // absolute path for stability
  pub window: WindowSpec,
  pub multi_windows: bool,
  pub author: Option<String>,
  pub issue_prefixes: Vec<String>,
  pub issue_pattern: Option<String>,
  pub include_merges: bool,
  pub estimator: EstimatorConfig,
  pub format: OutputFormat,
  pub out: String,
  pub now_override: Option<String>,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  // Validate window selection
  let window = match (&cli.month, &cli.for_str, &cli.since, &cli.until) {
    (Some(ym), None, None, None) => WindowSpec::Month { ym: ym.clone() },
    (None, Some(p), None, None) => WindowSpec::ForPhrase { phrase: p.clone() },
    (None, None, Some(s), Some(u)) => WindowSpec::SinceUntil {
      since: s.clone(),
      until: u.clone(),
    },
    (None, None, None, None) => {
      bail!("Provide one of --month, --for, or (--since AND --until)")
    }
    _ => bail!("Ambiguous time selection: choose only one of --month | --for | --since/--until"),
  };

  let mut estimator = match &cli.config {
    Some(path) => EstimatorConfig::from_json_file(path)?,
    None => EstimatorConfig::default(),
  };
  if let Some(target) = cli.weekly_target {
    estimator.weekly_target_hours = target;
  }
  if let Some(days) = cli.lookback_days {
    estimator.lookback_days = days;
  }
  if cli.exclude_weekends {
    estimator.include_weekends = false;
  }
  estimator.validate()?;

  let repo = util::canonicalize_lossy(&cli.repo);

  let author = if cli.all_authors {
    None
  } else {
    match cli.author {
      Some(a) => Some(a),
      None => gitio::user_email(&repo)?,
    }
  };

  Ok(EffectiveConfig {
    repo,
    window,
    multi_windows: false, // NOTE: set as default but can be overriden
    author,
    issue_prefixes: cli.issue_prefixes,
    issue_pattern: cli.issue_pattern,
    include_merges: cli.include_merges,
    estimator,
    format: cli.format,
    out: cli.out,
    now_override: cli.now_override,
  })
}
