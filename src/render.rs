// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Compile goals, support projects and daily reports into an ordered multi-section export document and its CSV text
// role: rendering/compiler
// inputs: CompileRequest (mode, period, anchor, selections, filters, policy), Dataset
// outputs: ExportDocument; BOM-prefixed CSV text
// invariants:
// - Meeting sections are emitted in fixed order: overview, goal detail, support projects, special initiatives
// - Product-line groups keep first-seen order; risk-only filtering touches the goal detail (and timesheet) only
// - Empty collections produce header-only tables or placeholder lines, never errors
// errors: PeriodError only when the anchor/offset leaves chrono's calendar range; csv::Error from the table writer
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::enrichment::achievement::estimate_goal;
use crate::fields::{
  csv_table, default_selection, header_cells, ExportField, MeetingField, ReportDetailField, SupportField, TimesheetField,
};
use crate::model::{Dataset, Goal, GoalLevel, GoalStatus, PeriodSummary, SupportProject};
use crate::period::{DateRange, Granularity, PeriodError};
use crate::summary::{FallbackText, PeriodSummaryProvider, StaticSummaries, SummaryPolicy, TimelineSummaries};

#[derive(Debug, Error)]
pub enum RenderError {
  #[error(transparent)]
  Period(#[from] PeriodError),
  #[error("writing csv: {0}")]
  Csv(#[from] csv::Error),
}

pub const BOM: char = '\u{FEFF}';
pub const OTHER_PRODUCT_LINE: &str = "其他";
pub const NO_SPECIAL_DATA: &str = "暂无符合条件的重点专项数据";
pub const HIGH_RISK_NOTE: &str = "资源依赖阻塞";
pub const NORMAL_NOTE: &str = "正常";
pub const DEFAULT_ACTION_HOURS: f64 = 8.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ExportMode {
  Meeting,
  Timesheet,
  ReportDetail,
}

impl ExportMode {
  pub fn label(self) -> &'static str {
    match self {
      ExportMode::Meeting => "经分会汇报",
      ExportMode::Timesheet => "工时系统对齐",
      ExportMode::ReportDetail => "工时明细",
    }
  }
}

/// Whose dashboard the export is taken from; narrows which goal levels are visible.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ViewerRole {
  DeptHead,
  TeamLead,
  Employee,
}

impl ViewerRole {
  pub fn can_see(self, level: GoalLevel) -> bool {
    match self {
      ViewerRole::DeptHead => true,
      ViewerRole::TeamLead => matches!(level, GoalLevel::Team | GoalLevel::Individual),
      ViewerRole::Employee => level == GoalLevel::Individual,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalFilter {
  pub role: Option<ViewerRole>,
  pub product_line: Option<String>,
  pub category: Option<String>,
  pub importance: Option<String>,
  pub level: Option<GoalLevel>,
}

impl GoalFilter {
  pub fn matches(&self, goal: &Goal) -> bool {
    if let Some(role) = self.role {
      if !role.can_see(goal.level) {
        return false;
      }
    }
    if let Some(pl) = &self.product_line {
      if goal.product_line.as_deref() != Some(pl.as_str()) {
        return false;
      }
    }
    if self.category.as_ref().is_some_and(|c| *c != goal.category) {
      return false;
    }
    if self.importance.as_ref().is_some_and(|i| *i != goal.importance) {
      return false;
    }
    self.level.map_or(true, |l| l == goal.level)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportFilter {
  pub bu: Option<String>,
  pub stage: Option<String>,
}

impl SupportFilter {
  pub fn matches(&self, project: &SupportProject) -> bool {
    self.bu.as_ref().map_or(true, |b| *b == project.bu) && self.stage.as_ref().map_or(true, |s| *s == project.stage)
  }
}

/// Markers that put a goal into the special-initiative section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialMarker {
  pub product_line: String,
  pub category: String,
  pub tag: String,
}

impl Default for SpecialMarker {
  fn default() -> Self {
    Self { product_line: "专项".into(), category: "组织专项".into(), tag: "专项".into() }
  }
}

impl SpecialMarker {
  pub fn matches(&self, goal: &Goal) -> bool {
    goal.product_line.as_deref() == Some(self.product_line.as_str())
      || goal.category == self.category
      || goal.tags.iter().any(|t| *t == self.tag)
  }
}

#[derive(Debug, Clone)]
pub struct CompileRequest {
  pub mode: ExportMode,
  pub granularity: Granularity,
  pub anchor: NaiveDate,
  /// 0 exports the period containing `anchor`, 1 the one after it.
  pub offset: i64,
  pub meeting_fields: Vec<MeetingField>,
  pub support_fields: Vec<SupportField>,
  pub timesheet_fields: Vec<TimesheetField>,
  pub report_fields: Vec<ReportDetailField>,
  pub risk_only: bool,
  pub goal_filter: GoalFilter,
  pub support_filter: SupportFilter,
  pub policy: SummaryPolicy,
  pub special: SpecialMarker,
  /// Advisor explanations keyed by goal id; replaces the static risk note when present.
  pub risk_notes: BTreeMap<String, String>,
  /// Explicit date window for the report-detail mode; defaults to the resolved period.
  pub report_range: Option<DateRange>,
}

impl CompileRequest {
  pub fn new(mode: ExportMode, granularity: Granularity, anchor: NaiveDate) -> Self {
    Self {
      mode,
      granularity,
      anchor,
      offset: 0,
      meeting_fields: default_selection(),
      support_fields: default_selection(),
      timesheet_fields: default_selection(),
      report_fields: default_selection(),
      risk_only: false,
      goal_filter: GoalFilter::default(),
      support_filter: SupportFilter::default(),
      policy: SummaryPolicy::default(),
      special: SpecialMarker::default(),
      risk_notes: BTreeMap::new(),
      report_range: None,
    }
  }

  /// Date range the export describes.
  pub fn period_range(&self) -> Result<DateRange, PeriodError> {
    self.policy.calendar.resolve(self.anchor, self.granularity, self.offset)
  }
  /// Daily-report window: the explicit range when given, else the resolved period.
  pub fn report_window(&self) -> Result<DateRange, PeriodError> {
    match self.report_range {
      Some(r) => Ok(r),
      None => self.period_range(),
    }
  }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
  /// Free text written verbatim (not quoted).
  Line(String),
  Table { header: Vec<String>, rows: Vec<Vec<String>> },
  Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
  pub title: Option<String>,
  pub blocks: Vec<Block>,
  pub trailing_blank: bool,
}

impl Section {
  fn titled(title: String) -> Self {
    Self { title: Some(title), blocks: Vec::new(), trailing_blank: true }
  }

  fn write_into(&self, out: &mut String) -> csv::Result<()> {
    if let Some(t) = &self.title {
      out.push_str(t);
      out.push('\n');
    }
    for block in &self.blocks {
      match block {
        Block::Line(text) => {
          out.push_str(text);
          out.push('\n');
        }
        Block::Table { header, rows } => {
          out.push_str(&csv_table(std::iter::once(header).chain(rows.iter()))?);
        }
        Block::Blank => out.push('\n'),
      }
    }
    if self.trailing_blank {
      out.push('\n');
    }
    Ok(())
  }

  #[cfg(test)]
  fn lines(&self) -> Vec<String> {
    let mut out = String::new();
    self.write_into(&mut out).unwrap();
    out.split_terminator('\n').map(str::to_string).collect()
  }
}

/// Ordered export sections; transient, built per compile call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDocument {
  pub sections: Vec<Section>,
}

impl ExportDocument {
  /// CSV text without the byte-order mark; every line ends with `\n`.
  pub fn to_csv_body(&self) -> csv::Result<String> {
    let mut out = String::new();
    for section in &self.sections {
      section.write_into(&mut out)?;
    }
    Ok(out)
  }

  /// BOM-prefixed CSV text for spreadsheet consumers.
  pub fn to_csv(&self) -> csv::Result<String> {
    let mut out = String::from(BOM);
    out.push_str(&self.to_csv_body()?);
    Ok(out)
  }
}

/// Compile `data` into an export document according to `req`.
pub fn compile(req: &CompileRequest, data: &Dataset) -> Result<ExportDocument, PeriodError> {
  let visible: Vec<&Goal> = data.goals.iter().filter(|g| req.goal_filter.matches(g)).collect();
  let in_scope: Vec<&Goal> = if req.risk_only {
    visible.iter().copied().filter(|g| g.status != GoalStatus::Stable).collect()
  } else {
    visible.clone()
  };

  debug!(
    mode = ?req.mode,
    period = req.granularity.name(),
    anchor = %req.anchor,
    offset = req.offset,
    visible = visible.len(),
    in_scope = in_scope.len(),
    "compiling export"
  );

  let sections = match req.mode {
    ExportMode::Meeting => {
      let period_anchor = req.period_range()?.start;
      let projects: Vec<&SupportProject> =
        data.support_projects.iter().filter(|p| req.support_filter.matches(p)).collect();
      vec![
        overview_section(req, data),
        goal_detail_section(req, &in_scope, period_anchor)?,
        support_section(req, &projects, period_anchor)?,
        special_section(req, &visible, period_anchor)?,
      ]
    }
    ExportMode::Timesheet => {
      // undated items land on the anchor, or on the first day of a shifted period
      let default_date = if req.offset == 0 { req.anchor } else { req.period_range()?.start };
      vec![timesheet_section(req, &in_scope, default_date)]
    }
    ExportMode::ReportDetail => vec![report_detail_section(req, data)?],
  };

  Ok(ExportDocument { sections })
}

/// Compile and render to BOM-prefixed CSV text in one step.
pub fn compile_csv(req: &CompileRequest, data: &Dataset) -> Result<String, RenderError> {
  Ok(compile(req, data)?.to_csv()?)
}

fn overview_section(req: &CompileRequest, data: &Dataset) -> Section {
  let g = req.granularity;
  let overview = data.period_overviews.get(&g).cloned().unwrap_or_default();
  let mut section = Section::titled(format!("一、总体目标概览 ({}度)", g.label()));
  section.blocks = vec![
    Block::Line(format!("完成情况: {}", overview.completion)),
    Block::Line(format!("风险说明: {}", overview.risk)),
    Block::Line(format!("重点专项总结: {}", overview.special)),
  ];
  section
}

fn goal_detail_section(req: &CompileRequest, goals: &[&Goal], period_anchor: NaiveDate) -> Result<Section, PeriodError> {
  let mut section = Section::titled("二、目标执行明细".to_string());
  let blank = FallbackText::blank();

  for (i, (product_line, members)) in group_by_product_line(goals).into_iter().enumerate() {
    if i > 0 {
      section.blocks.push(Block::Blank);
    }
    section.blocks.push(Block::Line(format!("【产线：{product_line}】")));

    let mut rows = Vec::with_capacity(members.len());
    for goal in members {
      let summary = StaticSummaries::new(goal, &blank).summarize(period_anchor, req.granularity)?;
      let row = req
        .meeting_fields
        .iter()
        .map(|f| meeting_cell(req, *f, goal, &summary))
        .collect();
      rows.push(row);
    }

    section.blocks.push(Block::Table { header: header_cells(&req.meeting_fields, req.granularity), rows });
  }

  Ok(section)
}

fn group_by_product_line<'a>(goals: &[&'a Goal]) -> Vec<(String, Vec<&'a Goal>)> {
  let mut groups: Vec<(String, Vec<&'a Goal>)> = Vec::new();

  for goal in goals {
    let key = match goal.product_line.as_deref() {
      Some(pl) if !pl.is_empty() => pl,
      _ => OTHER_PRODUCT_LINE,
    };
    match groups.iter_mut().find(|(k, _)| k == key) {
      Some((_, members)) => members.push(goal),
      None => groups.push((key.to_string(), vec![*goal])),
    }
  }

  groups
}

fn meeting_cell(req: &CompileRequest, field: MeetingField, goal: &Goal, summary: &PeriodSummary) -> String {
  match field {
    MeetingField::Name => goal.name.clone(),
    MeetingField::Level => goal.level.label().to_string(),
    MeetingField::Owner => goal.owner.clone(),
    MeetingField::Progress => format!("{}%", goal.progress),
    MeetingField::Status => goal.status.label().to_string(),
    MeetingField::AiProb => format!("{}%", estimate_goal(goal)),
    MeetingField::Risk => match req.risk_notes.get(&goal.id) {
      Some(note) if !note.is_empty() => note.clone(),
      _ if goal.status == GoalStatus::HighRisk => HIGH_RISK_NOTE.to_string(),
      _ => NORMAL_NOTE.to_string(),
    },
    MeetingField::Category => goal.category.clone(),
    MeetingField::CurrentGoal => summary.current_summary.clone(),
    MeetingField::ProgressAndRisk => summary.issues.clone(),
    MeetingField::NextGoal => summary.next_summary.clone(),
  }
}

fn support_section(
  req: &CompileRequest,
  projects: &[&SupportProject],
  period_anchor: NaiveDate,
) -> Result<Section, PeriodError> {
  let mut section = Section::titled("三、支撑项目说明".to_string());
  let mut rows = Vec::with_capacity(projects.len());

  for project in projects {
    let derived = TimelineSummaries::new(project, &req.policy).summarize(period_anchor, req.granularity)?;
    let row = req
      .support_fields
      .iter()
      .map(|f| match f {
        SupportField::Name => project.name.clone(),
        SupportField::Bu => project.bu.clone(),
        SupportField::Stage => project.stage.clone(),
        SupportField::EstimatedValue => project.estimated_value.to_string(),
        SupportField::ValueImpact => project.value_impact.clone().unwrap_or_default(),
        SupportField::Initiator => project.initiator.clone().unwrap_or_default(),
        SupportField::Date => project.date.clone().unwrap_or_default(),
        SupportField::CurrentSummary => derived.current_summary.clone(),
        SupportField::Issues => derived.issues.clone(),
        SupportField::NextSummary => derived.next_summary.clone(),
      })
      .collect();
    rows.push(row);
  }

  section.blocks.push(Block::Table { header: header_cells(&req.support_fields, req.granularity), rows });
  Ok(section)
}

fn special_section(req: &CompileRequest, goals: &[&Goal], period_anchor: NaiveDate) -> Result<Section, PeriodError> {
  let mut section = Section::titled("四、重点专项与跨事业部支撑明细 (专项标签/跨BU)".to_string());
  let special: Vec<&Goal> = goals.iter().copied().filter(|g| req.special.matches(g)).collect();

  if special.is_empty() {
    section.blocks.push(Block::Line(NO_SPECIAL_DATA.to_string()));
    return Ok(section);
  }

  let label = req.granularity.label();
  let header = vec![
    "模块".to_string(),
    "目标名称".to_string(),
    "负责人".to_string(),
    "当前进度".to_string(),
    format!("本{label}进展"),
    format!("下{label}计划"),
  ];

  let blank = FallbackText::blank();
  let mut rows = Vec::with_capacity(special.len());
  for goal in special {
    let summary = StaticSummaries::new(goal, &blank).summarize(period_anchor, req.granularity)?;
    rows.push(vec![
      goal.product_line.clone().unwrap_or_default(),
      goal.name.clone(),
      goal.owner.clone(),
      format!("{}%", goal.progress),
      summary.issues,
      summary.next_summary,
    ]);
  }

  section.blocks.push(Block::Table { header, rows });
  Ok(section)
}

fn timesheet_section(req: &CompileRequest, goals: &[&Goal], default_date: NaiveDate) -> Section {
  let mut rows = Vec::new();

  for goal in goals {
    for item in &goal.action_items {
      let row = req
        .timesheet_fields
        .iter()
        .map(|f| match f {
          TimesheetField::Date => item.start_date.unwrap_or(default_date).format("%Y-%m-%d").to_string(),
          TimesheetField::Name => goal.name.clone(),
          TimesheetField::Category => goal.category.clone(),
          TimesheetField::Action => item.text.clone(),
          TimesheetField::Owner => goal.owner.clone(),
          TimesheetField::Hours => item.hours.unwrap_or(DEFAULT_ACTION_HOURS).to_string(),
        })
        .collect();
      rows.push(row);
    }
  }

  Section {
    title: None,
    blocks: vec![Block::Table { header: header_cells(&req.timesheet_fields, req.granularity), rows }],
    trailing_blank: false,
  }
}

fn report_detail_section(req: &CompileRequest, data: &Dataset) -> Result<Section, PeriodError> {
  let range = req.report_window()?;
  debug!(range = %range, reports = data.daily_reports.len(), "filtering daily reports");

  let mut rows = Vec::new();
  for report in data.daily_reports.iter().filter(|r| range.contains(r.date)) {
    for segment in &report.segments {
      let row = req
        .report_fields
        .iter()
        .map(|f| match f {
          ReportDetailField::Date => report.date.format("%Y-%m-%d").to_string(),
          ReportDetailField::UserName => report.user_name.clone(),
          ReportDetailField::Role => report.role.clone(),
          ReportDetailField::GoalName => segment.goal_name.clone(),
          ReportDetailField::Hours => segment.hours.to_string(),
          ReportDetailField::Content => segment.content.clone(),
          ReportDetailField::Summary => match segment.summary.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => segment.content.clone(),
          },
        })
        .collect();
      rows.push(row);
    }
  }

  Ok(Section {
    title: None,
    blocks: vec![Block::Table { header: header_cells(&req.report_fields, req.granularity), rows }],
    trailing_blank: false,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{ActionItem, DailyReport, GoalPeriodSummary, PeriodOverview, ReportSegment};

  fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn goal(id: &str, pl: Option<&str>, status: GoalStatus, progress: i64) -> Goal {
    Goal {
      id: id.into(),
      name: format!("goal {id}"),
      level: GoalLevel::Team,
      category: "自动化生产".into(),
      owner: "Eric".into(),
      progress,
      status,
      importance: "P0".into(),
      product_line: pl.map(Into::into),
      tags: vec![],
      action_items: vec![],
      period_summaries: BTreeMap::new(),
    }
  }

  fn anchor() -> NaiveDate {
    day("2026-02-26")
  }

  #[test]
  fn meeting_sections_are_ordered_and_blank_separated() {
    let data = Dataset::default();
    let req = CompileRequest::new(ExportMode::Meeting, Granularity::Quarter, anchor());
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();
    let expected = "一、总体目标概览 (季度)\n完成情况: \n风险说明: \n重点专项总结: \n\n\
二、目标执行明细\n\n\
三、支撑项目说明\n\
\"项目名称\",\"支撑事业部\",\"阶段状态\",\"预估价值(万)\",\"价值影响力\",\"本季支撑总结\",\"存在问题\",\"下季支撑总结\"\n\n\
四、重点专项与跨事业部支撑明细 (专项标签/跨BU)\n暂无符合条件的重点专项数据\n\n";
    assert_eq!(body, expected);
  }

  #[test]
  fn to_csv_prefixes_bom() {
    let req = CompileRequest::new(ExportMode::Timesheet, Granularity::Week, anchor());
    let csv = compile_csv(&req, &Dataset::default()).unwrap();
    assert!(csv.starts_with('\u{FEFF}'));
    assert_eq!(&csv[3..], "\"日期\",\"目标项目\",\"业务分类\",\"执行动作\",\"负责人\",\"工时(h)\"\n");
  }

  #[test]
  fn overview_uses_period_text() {
    let mut data = Dataset::default();
    data.period_overviews.insert(
      Granularity::Month,
      PeriodOverview { completion: "达成 72%".into(), risk: "缺口".into(), special: "专项推进".into() },
    );
    let req = CompileRequest::new(ExportMode::Meeting, Granularity::Month, anchor());
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();
    assert!(body.starts_with("一、总体目标概览 (月度)\n完成情况: 达成 72%\n风险说明: 缺口\n重点专项总结: 专项推进\n\n"));
  }

  #[test]
  fn goals_group_by_first_seen_product_line() {
    let data = Dataset {
      goals: vec![
        goal("1", Some("B"), GoalStatus::Stable, 10),
        goal("2", None, GoalStatus::Stable, 20),
        goal("3", Some("A"), GoalStatus::Stable, 30),
        goal("4", Some("B"), GoalStatus::Stable, 40),
      ],
      ..Dataset::default()
    };
    let mut req = CompileRequest::new(ExportMode::Meeting, Granularity::Quarter, anchor());
    req.meeting_fields = vec![MeetingField::Name];
    let doc = compile(&req, &data).unwrap();
    let lines = doc.sections[1].lines();
    assert_eq!(
      lines,
      vec![
        "二、目标执行明细",
        "【产线：B】",
        "\"目标名称\"",
        "\"goal 1\"",
        "\"goal 4\"",
        "",
        "【产线：其他】",
        "\"目标名称\"",
        "\"goal 2\"",
        "",
        "【产线：A】",
        "\"目标名称\"",
        "\"goal 3\"",
        "",
      ]
    );
  }

  #[test]
  fn meeting_cells_render_every_field() {
    let mut g = goal("g", Some("A"), GoalStatus::HighRisk, 10);
    g.period_summaries.insert(
      Granularity::Quarter,
      GoalPeriodSummary { current_goal: "提升 50%".into(), progress_and_risk: "已达 40%".into(), next_goal: "全量上线".into() },
    );
    let data = Dataset { goals: vec![g], ..Dataset::default() };
    let mut req = CompileRequest::new(ExportMode::Meeting, Granularity::Quarter, anchor());
    req.meeting_fields = MeetingField::ALL.to_vec();
    let doc = compile(&req, &data).unwrap();
    let lines = doc.sections[1].lines();
    assert_eq!(
      lines[2],
      "\"目标名称\",\"组织层级\",\"责任人\",\"当前进度\",\"健康状态\",\"AI达成预测\",\"关键风险点\",\"业务分类\",\"本季目标\",\"完成情况\",\"下季目标\""
    );
    assert_eq!(
      lines[3],
      "\"goal g\",\"团队级\",\"Eric\",\"10%\",\"高风险\",\"15%\",\"资源依赖阻塞\",\"自动化生产\",\"提升 50%\",\"已达 40%\",\"全量上线\""
    );
  }

  #[test]
  fn advisor_risk_note_overrides_static_label() {
    let data = Dataset { goals: vec![goal("g", None, GoalStatus::Stable, 50)], ..Dataset::default() };
    let mut req = CompileRequest::new(ExportMode::Meeting, Granularity::Month, anchor());
    req.meeting_fields = vec![MeetingField::Risk];
    let plain = compile(&req, &data).unwrap().sections[1].lines();
    assert_eq!(plain[3], "\"正常\"");
    req.risk_notes.insert("g".into(), "供应商交付延迟".into());
    let noted = compile(&req, &data).unwrap().sections[1].lines();
    assert_eq!(noted[3], "\"供应商交付延迟\"");
  }

  #[test]
  fn risk_only_touches_goal_detail_not_special() {
    let mut special = goal("s", Some("专项"), GoalStatus::Stable, 60);
    special.tags = vec!["专项".into()];
    let data = Dataset {
      goals: vec![special, goal("r", Some("A"), GoalStatus::Deviated, 30)],
      ..Dataset::default()
    };
    let mut req = CompileRequest::new(ExportMode::Meeting, Granularity::Quarter, anchor());
    req.risk_only = true;
    req.meeting_fields = vec![MeetingField::Name];
    let doc = compile(&req, &data).unwrap();
    let detail = doc.sections[1].lines().join("\n");
    assert!(detail.contains("goal r"));
    assert!(!detail.contains("goal s"));
    let special_lines = doc.sections[3].lines();
    assert_eq!(special_lines[1], "\"模块\",\"目标名称\",\"负责人\",\"当前进度\",\"本季进展\",\"下季计划\"");
    assert_eq!(special_lines[2], "\"专项\",\"goal s\",\"Eric\",\"60%\",\"\",\"\"");
  }

  #[test]
  fn special_marker_matches_category_or_tag() {
    let marker = SpecialMarker::default();
    let mut g = goal("x", Some("A"), GoalStatus::Stable, 1);
    assert!(!marker.matches(&g));
    g.category = "组织专项".into();
    assert!(marker.matches(&g));
    g.category = String::new();
    g.tags = vec!["AI类".into(), "专项".into()];
    assert!(marker.matches(&g));
  }

  #[test]
  fn support_rows_use_timeline_rollups() {
    let project: SupportProject = serde_json::from_value(serde_json::json!({
      "id": "p1",
      "name": "冷链路线",
      "bu": "物流事业部",
      "stage": "POC验证",
      "estimatedValue": 120.0,
      "timeline": [
        { "startTime": "2026-02-10", "advancementStatus": "进行中", "requirementItems": "路线数据对齐" },
        { "startTime": "2026-03-05", "advancementStatus": "存在风险", "requirementItems": "接口排期" },
        { "startTime": "2026-04-02", "advancementStatus": "计划", "requirementItems": "POC 验收" }
      ]
    }))
    .unwrap();
    let data = Dataset { support_projects: vec![project], ..Dataset::default() };
    let req = CompileRequest::new(ExportMode::Meeting, Granularity::Quarter, anchor());
    let lines = compile(&req, &data).unwrap().sections[2].lines();
    assert_eq!(
      lines[2],
      "\"冷链路线\",\"物流事业部\",\"POC验证\",\"120\",\"\",\"[进行中] 路线数据对齐; [存在风险] 接口排期\",\"接口排期\",\"[计划] POC 验收\""
    );
  }

  #[test]
  fn next_offset_shifts_summary_window() {
    let project: SupportProject = serde_json::from_value(serde_json::json!({
      "id": "p1", "name": "n",
      "timeline": [
        { "startTime": "2026-02-10", "advancementStatus": "a", "requirementItems": "feb" },
        { "startTime": "2026-03-05", "advancementStatus": "b", "requirementItems": "mar" }
      ]
    }))
    .unwrap();
    let data = Dataset { support_projects: vec![project], ..Dataset::default() };
    let mut req = CompileRequest::new(ExportMode::Meeting, Granularity::Month, anchor());
    req.support_fields = vec![SupportField::CurrentSummary, SupportField::NextSummary];
    req.offset = 1;
    let lines = compile(&req, &data).unwrap().sections[2].lines();
    assert_eq!(lines[2], "\"[b] mar\",\"下期计划待同步\"");
  }

  #[test]
  fn support_filter_limits_projects() {
    let mk = |id: &str, bu: &str| -> SupportProject {
      serde_json::from_value(serde_json::json!({ "id": id, "name": id, "bu": bu, "stage": "POC验证" })).unwrap()
    };
    let data = Dataset { support_projects: vec![mk("a", "物流"), mk("b", "出行")], ..Dataset::default() };
    let mut req = CompileRequest::new(ExportMode::Meeting, Granularity::Month, anchor());
    req.support_fields = vec![SupportField::Name];
    req.support_filter.bu = Some("出行".into());
    let lines = compile(&req, &data).unwrap().sections[2].lines();
    assert_eq!(&lines[1..], &["\"项目名称\"", "\"b\"", ""]);
  }

  #[test]
  fn timesheet_explodes_action_items() {
    let mut g = goal("g", Some("A"), GoalStatus::Deviated, 50);
    g.action_items = vec![
      ActionItem { id: "a1".into(), text: "上线, 灰度".into(), start_date: Some(day("2026-01-05")), ..ActionItem::default() },
      ActionItem { id: "a2".into(), text: "复盘".into(), hours: Some(2.5), ..ActionItem::default() },
    ];
    let stable = {
      let mut s = goal("s", None, GoalStatus::Stable, 90);
      s.action_items = vec![ActionItem { text: "stable work".into(), ..ActionItem::default() }];
      s
    };
    let data = Dataset { goals: vec![g, stable], ..Dataset::default() };
    let mut req = CompileRequest::new(ExportMode::Timesheet, Granularity::Month, anchor());
    req.risk_only = true;
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "\"2026-01-05\",\"goal g\",\"自动化生产\",\"上线, 灰度\",\"Eric\",\"8\"");
    assert_eq!(lines[2], "\"2026-02-26\",\"goal g\",\"自动化生产\",\"复盘\",\"Eric\",\"2.5\"");
  }

  #[test]
  fn timesheet_default_date_follows_offset_period() {
    let mut g = goal("g", None, GoalStatus::Deviated, 50);
    g.action_items = vec![ActionItem { text: "x".into(), ..ActionItem::default() }];
    let data = Dataset { goals: vec![g], ..Dataset::default() };
    let mut req = CompileRequest::new(ExportMode::Timesheet, Granularity::Month, anchor());
    req.timesheet_fields = vec![TimesheetField::Date, TimesheetField::Action];
    req.offset = 1;
    let range = req.period_range().unwrap();
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();
    assert_eq!(body.lines().nth(1), Some("\"2026-03-01\",\"x\""));
    assert!(range.contains(day("2026-03-01")));

    req.offset = -1;
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();
    assert_eq!(body.lines().nth(1), Some("\"2026-01-01\",\"x\""));
  }

  #[test]
  fn goal_filter_applies_role_visibility() {
    let mut dept = goal("d", None, GoalStatus::Stable, 1);
    dept.level = GoalLevel::Department;
    let mut own = goal("i", None, GoalStatus::Stable, 1);
    own.level = GoalLevel::Individual;
    let team = goal("t", None, GoalStatus::Stable, 1);

    let lead = GoalFilter { role: Some(ViewerRole::TeamLead), ..GoalFilter::default() };
    assert!(!lead.matches(&dept));
    assert!(lead.matches(&team) && lead.matches(&own));

    let employee = GoalFilter { role: Some(ViewerRole::Employee), ..GoalFilter::default() };
    assert!(employee.matches(&own) && !employee.matches(&team));

    let by_line = GoalFilter { product_line: Some("A".into()), ..GoalFilter::default() };
    assert!(!by_line.matches(&team));
  }

  #[test]
  fn report_detail_filters_by_period_and_explodes_segments() {
    let report = |date: &str, segs: Vec<ReportSegment>| DailyReport {
      id: date.into(),
      date: day(date),
      user_name: "Linda".into(),
      role: "员工".into(),
      segments: segs,
    };
    let seg = |goal: &str, hours: f64, summary: Option<&str>| ReportSegment {
      goal_name: goal.into(),
      hours,
      content: format!("{goal} 内容"),
      summary: summary.map(Into::into),
    };
    let data = Dataset {
      daily_reports: vec![
        report("2026-02-22", vec![seg("早", 1.0, None)]),
        report("2026-02-24", vec![seg("甲", 3.0, Some("甲总结")), seg("乙", 5.0, None)]),
        report("2026-03-01", vec![seg("丙", 8.0, Some(""))]),
      ],
      ..Dataset::default()
    };
    let req = CompileRequest::new(ExportMode::ReportDetail, Granularity::Week, anchor());
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();
    assert_eq!(
      body,
      "\"日期\",\"填报人\",\"角色\",\"关联目标\",\"投入工时(h)\",\"一句话总结\"\n\
\"2026-02-24\",\"Linda\",\"员工\",\"甲\",\"3\",\"甲总结\"\n\
\"2026-02-24\",\"Linda\",\"员工\",\"乙\",\"5\",\"乙 内容\"\n\
\"2026-03-01\",\"Linda\",\"员工\",\"丙\",\"8\",\"丙 内容\"\n"
    );

    let mut explicit = req.clone();
    explicit.report_range = Some(DateRange { start: day("2026-02-20"), end: day("2026-02-22") });
    let body = compile(&explicit, &data).unwrap().to_csv_body().unwrap();
    assert_eq!(body.lines().count(), 2);
  }
}
