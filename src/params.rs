// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Map a normalized EffectiveConfig plus the boundary "today" into a CompileRequest; export file naming
// role: params/mapping
// inputs: EffectiveConfig, today's date
// outputs: CompileRequest; conventional export file names
// invariants: File names follow <prefix>_<mode>_<G>报_<date>.csv, or <prefix>_工时明细_<start>_至_<end>.csv for report detail
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Result;
use chrono::NaiveDate;

use crate::cli::EffectiveConfig;
use crate::fields::{default_selection, parse_selection};
use crate::period::{DateRange, Granularity, PeriodCalendar};
use crate::render::{CompileRequest, ExportMode};
use crate::summary::{RiskKeywords, SummaryPolicy};

pub fn build_compile_request(cfg: &EffectiveConfig, today: NaiveDate) -> Result<CompileRequest> {
  let mut req = CompileRequest::new(cfg.mode, cfg.granularity, cfg.anchor.unwrap_or(today));
  req.offset = cfg.offset;
  req.risk_only = cfg.risk_only;
  req.goal_filter = cfg.goal_filter.clone();
  req.support_filter = cfg.support_filter.clone();
  req.report_range = cfg.report_range;

  req.policy = SummaryPolicy {
    calendar: PeriodCalendar::new(cfg.week_start),
    risk_keywords: match &cfg.risk_keywords {
      Some(k) => RiskKeywords::new(k.iter().cloned()),
      None => RiskKeywords::default(),
    },
    ..SummaryPolicy::default()
  };

  if let Some(ids) = &cfg.fields {
    match cfg.mode {
      ExportMode::Meeting => req.meeting_fields = parse_selection(ids.as_slice())?,
      ExportMode::Timesheet => req.timesheet_fields = parse_selection(ids.as_slice())?,
      ExportMode::ReportDetail => req.report_fields = parse_selection(ids.as_slice())?,
    }
  }

  req.support_fields = match &cfg.support_fields {
    Some(ids) => parse_selection(ids.as_slice())?,
    None => default_selection(),
  };

  Ok(req)
}

/// Conventional file name for an export written into a directory.
///
/// `range` is only used by the report-detail mode.
pub fn export_file_name(
  prefix: &str,
  mode: ExportMode,
  granularity: Granularity,
  export_date: NaiveDate,
  range: DateRange,
) -> String {
  match mode {
    ExportMode::ReportDetail => format!(
      "{prefix}_{}_{}_至_{}.csv",
      mode.label(),
      range.start.format("%Y-%m-%d"),
      range.end.format("%Y-%m-%d")
    ),
    _ => format!(
      "{prefix}_{}_{}报_{}.csv",
      mode.label(),
      granularity.label(),
      export_date.format("%Y-%m-%d")
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cli::{normalize, Cli};
  use crate::fields::{ExportField, MeetingField, SupportField, TimesheetField};
  use crate::period::WeekStart;
  use clap::Parser;

  fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn cfg(args: &[&str]) -> EffectiveConfig {
    let mut argv = vec!["okr-period-report", "--data", "d.json"];
    argv.extend_from_slice(args);
    normalize(Cli::try_parse_from(argv).unwrap()).unwrap()
  }

  #[test]
  fn anchor_defaults_to_today_at_the_boundary() {
    let req = build_compile_request(&cfg(&[]), day("2026-10-19")).unwrap();
    assert_eq!(req.anchor, day("2026-10-19"));
    let pinned = build_compile_request(&cfg(&["--anchor", "2026-02-26"]), day("2026-10-19")).unwrap();
    assert_eq!(pinned.anchor, day("2026-02-26"));
  }

  #[test]
  fn selections_and_policy_are_carried() {
    let c = cfg(&["--fields", "nextGoal,name", "--support-fields", "issues,name", "--week-start", "sunday", "--risk-keywords", "延期"]);
    let req = build_compile_request(&c, day("2026-02-26")).unwrap();
    assert_eq!(req.meeting_fields, vec![MeetingField::Name, MeetingField::NextGoal]);
    assert_eq!(req.support_fields, vec![SupportField::Name, SupportField::Issues]);
    assert_eq!(req.policy.calendar.week_start, WeekStart::Sunday);
    assert_eq!(req.policy.risk_keywords.keywords(), &["延期".to_string()]);
    assert_eq!(req.timesheet_fields.len(), TimesheetField::ALL.len());
  }

  #[test]
  fn file_names_follow_convention() {
    let range = DateRange { start: day("2026-02-01"), end: day("2026-02-28") };
    assert_eq!(
      export_file_name("GIA", ExportMode::Meeting, Granularity::Quarter, day("2026-02-26"), range),
      "GIA_经分会汇报_季报_2026-02-26.csv"
    );
    assert_eq!(
      export_file_name("GIA", ExportMode::Timesheet, Granularity::Week, day("2026-02-26"), range),
      "GIA_工时系统对齐_周报_2026-02-26.csv"
    );
    assert_eq!(
      export_file_name("GIA", ExportMode::ReportDetail, Granularity::Month, day("2026-02-26"), range),
      "GIA_工时明细_2026-02-01_至_2026-02-28.csv"
    );
  }
}
