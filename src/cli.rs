// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Command-line surface and its normalization into a validated, serializable EffectiveConfig
// role: cli/config
// inputs: argv via clap derive
// outputs: EffectiveConfig
// invariants:
// - Granularity, dates and field ids are validated here so later phases cannot fail on user input
// - --next and --offset are mutually exclusive; --from/--to come as a pair and only for report-detail
// - The system clock is never read here; a missing anchor stays None
// errors: anyhow with a user-facing message
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::fields::{parse_selection, MeetingField, ReportDetailField, SupportField, TimesheetField};
use crate::model::GoalLevel;
use crate::period::{parse_anchor, DateRange, Granularity, WeekStart};
use crate::render::{ExportMode, GoalFilter, SupportFilter, ViewerRole};
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "okr-period-report",
    version,
    about = "Period rollups and meeting/timesheet CSV exports for OKR goal tracking",
    long_about = None
)]
pub struct Cli {
  /// Dataset JSON (goals, supportProjects, periodOverviews, dailyReports)
  #[arg(long)]
  pub data: Option<PathBuf>,

  /// Export mode
  #[arg(long, value_enum, default_value_t = ExportMode::Meeting)]
  pub mode: ExportMode,

  /// Period granularity: day|week|month|quarter|year (or 日|周|月|季|年)
  #[arg(long, default_value = "quarter")]
  pub period: String,

  /// Export the period after the anchor's (same as --offset 1)
  #[arg(long, conflicts_with = "offset")]
  pub next: bool,

  /// Signed period offset from the anchor's period
  #[arg(long, allow_negative_numbers = true)]
  pub offset: Option<i64>,

  /// Anchor date YYYY-MM-DD (default: today)
  #[arg(long)]
  pub anchor: Option<String>,

  /// Comma-separated field ids for the mode's main table
  #[arg(long, value_delimiter = ',')]
  pub fields: Option<Vec<String>>,

  /// Comma-separated field ids for the support-project table (meeting mode)
  #[arg(long, value_delimiter = ',')]
  pub support_fields: Option<Vec<String>>,

  /// Keep only goals that are not Stable in the goal detail and timesheet
  #[arg(long)]
  pub risk_only: bool,

  /// Viewer role; narrows visible goal levels
  #[arg(long, value_enum)]
  pub role: Option<ViewerRole>,

  #[arg(long)]
  pub product_line: Option<String>,

  #[arg(long)]
  pub category: Option<String>,

  #[arg(long)]
  pub importance: Option<String>,

  /// Goal level: department|team|individual
  #[arg(long)]
  pub level: Option<String>,

  /// Support projects: business unit filter
  #[arg(long)]
  pub bu: Option<String>,

  /// Support projects: stage filter
  #[arg(long)]
  pub stage: Option<String>,

  /// First day of the week
  #[arg(long, value_enum, default_value_t = WeekStart::Monday)]
  pub week_start: WeekStart,

  /// Comma-separated status keywords marking a timeline entry as a risk
  #[arg(long, value_delimiter = ',')]
  pub risk_keywords: Option<Vec<String>>,

  /// Report-detail window start (inclusive); pair with --to
  #[arg(long)]
  pub from: Option<String>,

  /// Report-detail window end (inclusive); pair with --from
  #[arg(long)]
  pub to: Option<String>,

  /// Ask the AI advisor for risk notes on non-stable goals
  #[arg(long)]
  pub ai_risk: bool,

  /// Ask the AI advisor to fill missing daily-report summaries
  #[arg(long)]
  pub ai_summaries: bool,

  /// File name prefix when writing into a directory
  #[arg(long, default_value = "GIA")]
  pub prefix: String,

  /// Output: "-" for stdout, a file path, or a directory (trailing "/") for a conventional file name
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Print the field catalog for the mode and period as JSON, then exit
  #[arg(long)]
  pub list_fields: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub data: Option<String>, // absolute path for stability
  pub mode: ExportMode,
  pub granularity: Granularity,
  pub offset: i64,
  pub anchor: Option<NaiveDate>,
  pub fields: Option<Vec<String>>,
  pub support_fields: Option<Vec<String>>,
  pub risk_only: bool,
  pub goal_filter: GoalFilter,
  pub support_filter: SupportFilter,
  pub week_start: WeekStart,
  pub risk_keywords: Option<Vec<String>>,
  pub report_range: Option<DateRange>,
  pub ai_risk: bool,
  pub ai_summaries: bool,
  pub prefix: String,
  pub out: String,
  pub list_fields: bool,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let granularity: Granularity = cli.period.parse()?;

  let offset = if cli.next { 1 } else { cli.offset.unwrap_or(0) };

  let anchor = cli.anchor.as_deref().map(parse_anchor).transpose().context("invalid --anchor")?;

  let report_range = match (cli.from.as_deref(), cli.to.as_deref()) {
    (None, None) => None,
    (Some(f), Some(t)) => {
      if cli.mode != ExportMode::ReportDetail {
        bail!("--from/--to only apply to --mode report-detail");
      }
      let start = parse_anchor(f).context("invalid --from")?;
      let end = parse_anchor(t).context("invalid --to")?;
      if start > end {
        bail!("--from {start} is after --to {end}");
      }
      Some(DateRange { start, end })
    }
    _ => bail!("--from and --to must be given together"),
  };

  if let Some(ids) = &cli.fields {
    match cli.mode {
      ExportMode::Meeting => parse_selection::<MeetingField, _>(ids.as_slice()).map(|_| ())?,
      ExportMode::Timesheet => parse_selection::<TimesheetField, _>(ids.as_slice()).map(|_| ())?,
      ExportMode::ReportDetail => parse_selection::<ReportDetailField, _>(ids.as_slice()).map(|_| ())?,
    }
  }

  if let Some(ids) = &cli.support_fields {
    if cli.mode != ExportMode::Meeting {
      bail!("--support-fields only applies to --mode meeting");
    }
    parse_selection::<SupportField, _>(ids.as_slice())?;
  }

  let level = cli.level.as_deref().map(parse_level).transpose()?;

  if cli.data.is_none() && !cli.list_fields {
    bail!("--data <dataset.json> is required");
  }

  Ok(EffectiveConfig {
    data: cli.data.as_deref().map(util::canonicalize_lossy),
    mode: cli.mode,
    granularity,
    offset,
    anchor,
    fields: cli.fields,
    support_fields: cli.support_fields,
    risk_only: cli.risk_only,
    goal_filter: GoalFilter {
      role: cli.role,
      product_line: cli.product_line,
      category: cli.category,
      importance: cli.importance,
      level,
    },
    support_filter: SupportFilter { bu: cli.bu, stage: cli.stage },
    week_start: cli.week_start,
    risk_keywords: cli.risk_keywords,
    report_range,
    ai_risk: cli.ai_risk,
    ai_summaries: cli.ai_summaries,
    prefix: cli.prefix,
    out: cli.out,
    list_fields: cli.list_fields,
  })
}

// Reuses the dataset's serde names, so "team" and "团队级" both work.
fn parse_level(s: &str) -> Result<GoalLevel> {
  serde_json::from_value(serde_json::Value::String(s.trim().to_string()))
    .with_context(|| format!("unknown goal level {s:?} (expected department|team|individual)"))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<EffectiveConfig> {
    let mut argv = vec!["okr-period-report"];
    argv.extend_from_slice(args);
    normalize(Cli::try_parse_from(argv)?)
  }

  #[test]
  fn defaults_to_current_quarter_meeting() {
    let cfg = parse(&["--data", "d.json"]).unwrap();
    assert_eq!(cfg.mode, ExportMode::Meeting);
    assert_eq!(cfg.granularity, Granularity::Quarter);
    assert_eq!(cfg.offset, 0);
    assert_eq!(cfg.anchor, None);
    assert_eq!(cfg.out, "-");
    assert_eq!(cfg.prefix, "GIA");
    assert!(cfg.data.unwrap().ends_with("d.json"));
  }

  #[test]
  fn next_and_chinese_period() {
    let cfg = parse(&["--data", "d.json", "--period", "周", "--next", "--anchor", "2026-02-26"]).unwrap();
    assert_eq!(cfg.granularity, Granularity::Week);
    assert_eq!(cfg.offset, 1);
    assert_eq!(cfg.anchor, NaiveDate::from_ymd_opt(2026, 2, 26));
  }

  #[test]
  fn negative_offset_is_accepted() {
    let cfg = parse(&["--data", "d.json", "--offset", "-3"]).unwrap();
    assert_eq!(cfg.offset, -3);
  }

  #[test]
  fn next_conflicts_with_offset() {
    assert!(parse(&["--data", "d.json", "--next", "--offset", "2"]).is_err());
  }

  #[test]
  fn unknown_period_is_rejected() {
    let err = parse(&["--data", "d.json", "--period", "fortnight"]).unwrap_err();
    assert!(format!("{err:#}").contains("fortnight"));
  }

  #[test]
  fn malformed_anchor_is_rejected() {
    let err = parse(&["--data", "d.json", "--anchor", "2026-13-01"]).unwrap_err();
    assert!(format!("{err:#}").contains("--anchor"));
  }

  #[test]
  fn fields_are_checked_against_the_mode_catalog() {
    assert!(parse(&["--data", "d.json", "--mode", "timesheet", "--fields", "date,hours"]).is_ok());
    let err = parse(&["--data", "d.json", "--mode", "timesheet", "--fields", "aiProb"]).unwrap_err();
    assert!(format!("{err:#}").contains("aiProb"));
    assert!(parse(&["--data", "d.json", "--mode", "timesheet", "--support-fields", "name"]).is_err());
  }

  #[test]
  fn from_to_pairing_and_order() {
    let ok = parse(&["--data", "d.json", "--mode", "report-detail", "--from", "2026-02-01", "--to", "2026-02-10"]).unwrap();
    assert_eq!(ok.report_range.unwrap().days(), 10);
    assert!(parse(&["--data", "d.json", "--mode", "report-detail", "--from", "2026-02-01"]).is_err());
    assert!(parse(&["--data", "d.json", "--mode", "report-detail", "--from", "2026-02-10", "--to", "2026-02-01"]).is_err());
    assert!(parse(&["--data", "d.json", "--from", "2026-02-01", "--to", "2026-02-10"]).is_err());
  }

  #[test]
  fn filters_are_collected() {
    let cfg = parse(&[
      "--data", "d.json", "--role", "team-lead", "--level", "团队级", "--product-line", "A", "--bu", "物流",
      "--risk-keywords", "延期,blocked",
    ])
    .unwrap();
    assert_eq!(cfg.goal_filter.role, Some(ViewerRole::TeamLead));
    assert_eq!(cfg.goal_filter.level, Some(GoalLevel::Team));
    assert_eq!(cfg.goal_filter.product_line.as_deref(), Some("A"));
    assert_eq!(cfg.support_filter.bu.as_deref(), Some("物流"));
    assert_eq!(cfg.risk_keywords, Some(vec!["延期".to_string(), "blocked".to_string()]));
    assert!(parse(&["--data", "d.json", "--level", "galaxy"]).is_err());
  }

  #[test]
  fn data_is_optional_only_for_listing() {
    assert!(parse(&[]).is_err());
    assert!(parse(&["--list-fields"]).unwrap().data.is_none());
  }

  #[test]
  fn effective_config_round_trips_through_json() {
    let cfg = parse(&["--data", "d.json", "--week-start", "sunday"]).unwrap();
    let v = serde_json::to_value(&cfg).unwrap();
    assert_eq!(v["granularity"], "quarter");
    let back: EffectiveConfig = serde_json::from_value(v).unwrap();
    assert_eq!(back.week_start, WeekStart::Sunday);
  }
}
