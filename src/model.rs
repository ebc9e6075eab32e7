// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the dataset model (goals, support projects, timelines, daily reports, period overviews) consumed by exports
// role: model/types
// outputs: Serializable structs whose JSON field names follow the dashboard's camelCase payloads
// invariants: Every collection defaults to empty; missing optional text stays None rather than ""
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::Granularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalStatus {
  #[serde(rename = "stable", alias = "Stable", alias = "稳定")]
  Stable,
  #[serde(rename = "deviated", alias = "Deviated", alias = "偏离")]
  Deviated,
  #[serde(rename = "high_risk", alias = "HighRisk", alias = "高风险")]
  HighRisk,
}

impl GoalStatus {
  pub fn label(self) -> &'static str {
    match self {
      GoalStatus::Stable => "稳定",
      GoalStatus::Deviated => "偏离",
      GoalStatus::HighRisk => "高风险",
    }
  }
}

/// Organizational level a goal is owned at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalLevel {
  #[serde(rename = "department", alias = "部门级")]
  Department,
  #[serde(rename = "team", alias = "团队级")]
  Team,
  #[default]
  #[serde(rename = "individual", alias = "个人级")]
  Individual,
}

impl GoalLevel {
  pub fn label(self) -> &'static str {
    match self {
      GoalLevel::Department => "部门级",
      GoalLevel::Team => "团队级",
      GoalLevel::Individual => "个人级",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
  #[serde(default)]
  pub id: String,
  pub text: String,
  #[serde(default)]
  pub done: bool,
  #[serde(default)]
  pub start_date: Option<NaiveDate>,
  #[serde(default)]
  pub end_date: Option<NaiveDate>,
  #[serde(default)]
  pub hours: Option<f64>,
}

/// Goal-authored rollup for one granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPeriodSummary {
  #[serde(default)]
  pub current_goal: String,
  #[serde(default)]
  pub progress_and_risk: String,
  #[serde(default)]
  pub next_goal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
  pub id: String,
  pub name: String,
  #[serde(rename = "type", alias = "level", default)]
  pub level: GoalLevel,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub owner: String,
  #[serde(default)]
  pub progress: i64,
  pub status: GoalStatus,
  #[serde(default)]
  pub importance: String,
  #[serde(default)]
  pub product_line: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub action_items: Vec<ActionItem>,
  #[serde(default)]
  pub period_summaries: BTreeMap<Granularity, GoalPeriodSummary>,
}

/// Derived (or configured default) rollup text for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
  #[serde(default)]
  pub current_summary: String,
  #[serde(default)]
  pub issues: String,
  #[serde(default)]
  pub next_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
  #[serde(default)]
  pub id: String,
  #[serde(rename = "startTime", alias = "start_time")]
  pub start_time: NaiveDate,
  #[serde(rename = "advancementStatus", alias = "status", default)]
  pub status: String,
  #[serde(rename = "requirementItems", alias = "description", default)]
  pub description: String,
  #[serde(default)]
  pub hours: f64,
  #[serde(default)]
  pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportProject {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub bu: String,
  #[serde(default)]
  pub stage: String,
  #[serde(default)]
  pub estimated_value: f64,
  #[serde(default)]
  pub value_impact: Option<String>,
  #[serde(default)]
  pub initiator: Option<String>,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub timeline: Vec<TimelineEntry>,
  #[serde(default)]
  pub period_summaries: BTreeMap<Granularity, PeriodSummary>,
}

/// Externally authored period-level overview text (meeting section one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOverview {
  #[serde(default)]
  pub completion: String,
  #[serde(default)]
  pub risk: String,
  #[serde(default)]
  pub special: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSegment {
  #[serde(default)]
  pub goal_name: String,
  #[serde(alias = "timeSpent", default)]
  pub hours: f64,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
  #[serde(default)]
  pub id: String,
  pub date: NaiveDate,
  #[serde(default)]
  pub user_name: String,
  #[serde(default)]
  pub role: String,
  #[serde(default)]
  pub segments: Vec<ReportSegment>,
}

/// In-memory collections handed to the export engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
  #[serde(default)]
  pub goals: Vec<Goal>,
  #[serde(default)]
  pub support_projects: Vec<SupportProject>,
  #[serde(default)]
  pub period_overviews: BTreeMap<Granularity, PeriodOverview>,
  #[serde(default)]
  pub daily_reports: Vec<DailyReport>,
}
