use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use okr_period_report::cli::{normalize, Cli};
use okr_period_report::enrichment::advisor::{make_default_advisor, make_null_advisor};
use okr_period_report::{export, util};

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  // stdout carries the CSV; diagnostics go to stderr
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn main() -> Result<()> {
  init_tracing();
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;
  tracing::debug!(config = %serde_json::to_string(&cfg).unwrap_or_default(), "effective config");

  // Phase 2: the clock is read once, here
  let today = util::effective_today(None);

  // Phase 3: export
  let advisor = if cfg.ai_risk || cfg.ai_summaries { make_default_advisor() } else { make_null_advisor() };
  export::run(&cfg, today, advisor.as_ref())?;

  Ok(())
}
