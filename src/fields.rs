// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Closed export field catalogs per mode, user selection, period relabeling, and CSV cell escaping
// role: rendering/fields
// outputs: Ordered field selections, header rows, escaped CSV rows, FieldSpec listings
// invariants:
// - Selections always follow catalog order, without duplicates
// - Every cell is quoted; embedded quotes are doubled
// - Unknown field ids are rejected when parsing, never rendered as empty cells
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use csv::{QuoteStyle, Terminator};
use serde::Serialize;
use thiserror::Error;

use crate::period::Granularity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
  #[error("unknown {catalog} field {id:?} (known: {known})")]
  UnknownField { catalog: &'static str, id: String, known: String },
}

/// A closed catalog of export columns.
pub trait ExportField: Copy + Eq + Sized + 'static {
  const CATALOG: &'static str;
  const ALL: &'static [Self];

  fn id(self) -> &'static str;
  fn base_label(self) -> &'static str;
  fn is_default_selected(self) -> bool;

  /// Period-parameterized header, when this column has one.
  fn period_label(self, _granularity: Granularity) -> Option<String> {
    None
  }

  fn label(self, granularity: Granularity) -> String {
    self.period_label(granularity).unwrap_or_else(|| self.base_label().to_string())
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeetingField {
  Name,
  Level,
  Owner,
  Progress,
  Status,
  AiProb,
  Risk,
  Category,
  CurrentGoal,
  ProgressAndRisk,
  NextGoal,
}

impl ExportField for MeetingField {
  const CATALOG: &'static str = "meeting";
  const ALL: &'static [Self] = &[
    MeetingField::Name,
    MeetingField::Level,
    MeetingField::Owner,
    MeetingField::Progress,
    MeetingField::Status,
    MeetingField::AiProb,
    MeetingField::Risk,
    MeetingField::Category,
    MeetingField::CurrentGoal,
    MeetingField::ProgressAndRisk,
    MeetingField::NextGoal,
  ];

  fn id(self) -> &'static str {
    match self {
      MeetingField::Name => "name",
      MeetingField::Level => "type",
      MeetingField::Owner => "owner",
      MeetingField::Progress => "progress",
      MeetingField::Status => "status",
      MeetingField::AiProb => "aiProb",
      MeetingField::Risk => "risk",
      MeetingField::Category => "category",
      MeetingField::CurrentGoal => "currentGoal",
      MeetingField::ProgressAndRisk => "progressAndRisk",
      MeetingField::NextGoal => "nextGoal",
    }
  }

  fn base_label(self) -> &'static str {
    match self {
      MeetingField::Name => "目标名称",
      MeetingField::Level => "组织层级",
      MeetingField::Owner => "责任人",
      MeetingField::Progress => "当前进度",
      MeetingField::Status => "健康状态",
      MeetingField::AiProb => "AI达成预测",
      MeetingField::Risk => "关键风险点",
      MeetingField::Category => "业务分类",
      MeetingField::CurrentGoal => "本次目标",
      MeetingField::ProgressAndRisk => "完成情况",
      MeetingField::NextGoal => "下次目标",
    }
  }

  fn is_default_selected(self) -> bool {
    !matches!(self, MeetingField::Category)
  }

  fn period_label(self, granularity: Granularity) -> Option<String> {
    match self {
      MeetingField::CurrentGoal => Some(format!("本{}目标", granularity.label())),
      MeetingField::NextGoal => Some(format!("下{}目标", granularity.label())),
      _ => None,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SupportField {
  Name,
  Bu,
  Stage,
  EstimatedValue,
  ValueImpact,
  Initiator,
  Date,
  CurrentSummary,
  Issues,
  NextSummary,
}

impl ExportField for SupportField {
  const CATALOG: &'static str = "support";
  const ALL: &'static [Self] = &[
    SupportField::Name,
    SupportField::Bu,
    SupportField::Stage,
    SupportField::EstimatedValue,
    SupportField::ValueImpact,
    SupportField::Initiator,
    SupportField::Date,
    SupportField::CurrentSummary,
    SupportField::Issues,
    SupportField::NextSummary,
  ];

  fn id(self) -> &'static str {
    match self {
      SupportField::Name => "name",
      SupportField::Bu => "bu",
      SupportField::Stage => "stage",
      SupportField::EstimatedValue => "estimatedValue",
      SupportField::ValueImpact => "valueImpact",
      SupportField::Initiator => "initiator",
      SupportField::Date => "date",
      SupportField::CurrentSummary => "currentSummary",
      SupportField::Issues => "issues",
      SupportField::NextSummary => "nextSummary",
    }
  }

  fn base_label(self) -> &'static str {
    match self {
      SupportField::Name => "项目名称",
      SupportField::Bu => "支撑事业部",
      SupportField::Stage => "阶段状态",
      SupportField::EstimatedValue => "预估价值(万)",
      SupportField::ValueImpact => "价值影响力",
      SupportField::Initiator => "发起人",
      SupportField::Date => "日期",
      SupportField::CurrentSummary => "本次支撑总结",
      SupportField::Issues => "存在问题",
      SupportField::NextSummary => "下次支撑总结",
    }
  }

  fn is_default_selected(self) -> bool {
    !matches!(self, SupportField::Initiator | SupportField::Date)
  }

  fn period_label(self, granularity: Granularity) -> Option<String> {
    match self {
      SupportField::CurrentSummary => Some(format!("本{}支撑总结", granularity.label())),
      SupportField::NextSummary => Some(format!("下{}支撑总结", granularity.label())),
      _ => None,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimesheetField {
  Date,
  Name,
  Category,
  Action,
  Owner,
  Hours,
}

impl ExportField for TimesheetField {
  const CATALOG: &'static str = "timesheet";
  const ALL: &'static [Self] = &[
    TimesheetField::Date,
    TimesheetField::Name,
    TimesheetField::Category,
    TimesheetField::Action,
    TimesheetField::Owner,
    TimesheetField::Hours,
  ];

  fn id(self) -> &'static str {
    match self {
      TimesheetField::Date => "date",
      TimesheetField::Name => "name",
      TimesheetField::Category => "category",
      TimesheetField::Action => "action",
      TimesheetField::Owner => "owner",
      TimesheetField::Hours => "hours",
    }
  }

  fn base_label(self) -> &'static str {
    match self {
      TimesheetField::Date => "日期",
      TimesheetField::Name => "目标项目",
      TimesheetField::Category => "业务分类",
      TimesheetField::Action => "执行动作",
      TimesheetField::Owner => "负责人",
      TimesheetField::Hours => "工时(h)",
    }
  }

  fn is_default_selected(self) -> bool {
    true
  }
}

/// Columns of the daily-report work-hour detail export.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReportDetailField {
  Date,
  UserName,
  Role,
  GoalName,
  Hours,
  Content,
  Summary,
}

impl ExportField for ReportDetailField {
  const CATALOG: &'static str = "report-detail";
  const ALL: &'static [Self] = &[
    ReportDetailField::Date,
    ReportDetailField::UserName,
    ReportDetailField::Role,
    ReportDetailField::GoalName,
    ReportDetailField::Hours,
    ReportDetailField::Content,
    ReportDetailField::Summary,
  ];

  fn id(self) -> &'static str {
    match self {
      ReportDetailField::Date => "date",
      ReportDetailField::UserName => "userName",
      ReportDetailField::Role => "role",
      ReportDetailField::GoalName => "goalName",
      ReportDetailField::Hours => "hours",
      ReportDetailField::Content => "content",
      ReportDetailField::Summary => "summary",
    }
  }

  fn base_label(self) -> &'static str {
    match self {
      ReportDetailField::Date => "日期",
      ReportDetailField::UserName => "填报人",
      ReportDetailField::Role => "角色",
      ReportDetailField::GoalName => "关联目标",
      ReportDetailField::Hours => "投入工时(h)",
      ReportDetailField::Content => "执行内容",
      ReportDetailField::Summary => "一句话总结",
    }
  }

  fn is_default_selected(self) -> bool {
    !matches!(self, ReportDetailField::Content)
  }
}

/// Serializable view of one catalog entry, as shown to users picking columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
  pub id: &'static str,
  pub label: String,
  pub is_default_selected: bool,
}

pub fn catalog<F: ExportField>(granularity: Granularity) -> Vec<FieldSpec> {
  F::ALL
    .iter()
    .map(|f| FieldSpec { id: f.id(), label: f.label(granularity), is_default_selected: f.is_default_selected() })
    .collect()
}

pub fn default_selection<F: ExportField>() -> Vec<F> {
  F::ALL.iter().copied().filter(|f| f.is_default_selected()).collect()
}

/// Parse user-supplied ids into a catalog-ordered selection.
pub fn parse_selection<F: ExportField, S: AsRef<str>>(ids: &[S]) -> Result<Vec<F>, FieldError> {
  let mut chosen = Vec::with_capacity(ids.len());

  for raw in ids {
    let id = raw.as_ref().trim();
    match F::ALL.iter().copied().find(|f| f.id() == id) {
      Some(f) => chosen.push(f),
      None => {
        return Err(FieldError::UnknownField {
          catalog: F::CATALOG,
          id: id.to_string(),
          known: F::ALL.iter().map(|f| f.id()).collect::<Vec<_>>().join(", "),
        })
      }
    }
  }

  Ok(select(&chosen))
}

/// Normalize a selection to catalog order and drop duplicates.
pub fn select<F: ExportField>(chosen: &[F]) -> Vec<F> {
  F::ALL.iter().copied().filter(|f| chosen.contains(f)).collect()
}

fn table_writer<W: std::io::Write>(wtr: W) -> csv::Writer<W> {
  csv::WriterBuilder::new()
    .quote_style(QuoteStyle::Always)
    .terminator(Terminator::Any(b'\n'))
    .from_writer(wtr)
}

/// Write `rows` as always-quoted CSV records, each terminated by `\n`.
pub fn csv_table<R, C, S>(rows: R) -> csv::Result<String>
where
  R: IntoIterator<Item = C>,
  C: IntoIterator<Item = S>,
  S: AsRef<[u8]>,
{
  let mut wtr = table_writer(Vec::new());
  for row in rows {
    wtr.write_record(row)?;
  }
  let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// One CSV record without its terminator.
pub fn csv_row<S: AsRef<str>>(cells: &[S]) -> csv::Result<String> {
  let mut line = csv_table([cells.iter().map(|c| c.as_ref().as_bytes())])?;
  line.pop();
  Ok(line)
}

/// Quote a cell: wrap in double quotes and double any embedded quote.
pub fn escape(value: &str) -> csv::Result<String> {
  csv_row(&[value])
}

pub fn header_cells<F: ExportField>(fields: &[F], granularity: Granularity) -> Vec<String> {
  fields.iter().map(|f| f.label(granularity)).collect()
}
