use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use git_timesheet::cli::{Cli, normalize};
use git_timesheet::{range_processor, util, window};

fn init_tracing(verbose: bool) {
  // RUST_LOG wins; otherwise warnings only, or our own debug output with --verbose.
  let default = if verbose { "warn,git_timesheet=debug" } else { "warn" };
  let filter = std::env::var("RUST_LOG")
    .ok()
    .and_then(|raw| {
      let raw = raw.trim();
      if raw.is_empty() {
        return None;
      }
      EnvFilter::try_new(raw).ok()
    })
    .unwrap_or_else(|| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI
  let mut cfg = normalize(cli)?;

  // Phase 2: resolve now and ranges
  let now = util::effective_now(window::parse_now_override(cfg.now_override.as_deref()));
  let ranges = window::resolve_ranges(&cfg.window, now)?;
  cfg.multi_windows = ranges.len() > 1 || window::is_multi_bucket(&cfg.window);

  // Phase 3: estimate and render every range
  range_processor::process_ranges(&cfg, ranges)
}
