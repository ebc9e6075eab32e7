// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Derive period rollups (current summary, issues, next plan) from timelines or goal-authored tables
// role: aggregation/summaries
// inputs: timeline entries or per-granularity summary tables; explicit anchor date; SummaryPolicy
// outputs: PeriodSummary values
// invariants:
// - Entry order is preserved; entries are joined with "; "
// - Empty buckets fall back to the configured default, then to the policy placeholder
// - Never reads the system clock
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::bucket::bucket_with;
use crate::model::{Goal, PeriodSummary, SupportProject, TimelineEntry};
use crate::period::{Granularity, PeriodCalendar, PeriodError};

pub const ENTRY_SEPARATOR: &str = "; ";

/// Status keywords that flag a timeline entry as a risk or blocker (substring match).
#[derive(Debug, Clone)]
pub struct RiskKeywords {
  keywords: Vec<String>,
  matcher: Option<Regex>,
}

impl RiskKeywords {
  pub fn new<I, S>(keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let keywords: Vec<String> = keywords
      .into_iter()
      .map(Into::into)
      .filter(|k: &String| !k.trim().is_empty())
      .collect();
    let matcher = build_matcher(&keywords, MATCHER_SIZE_LIMIT);
    Self { keywords, matcher }
  }

  pub fn keywords(&self) -> &[String] {
    &self.keywords
  }

  pub fn matches(&self, status: &str) -> bool {
    match &self.matcher {
      Some(re) => re.is_match(status),
      None => {
        let status = status.to_lowercase();
        self.keywords.iter().any(|k| status.contains(&k.to_lowercase()))
      }
    }
  }
}

const MATCHER_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Case-insensitive alternation of the literal keywords; `None` falls back to substring search.
fn build_matcher(keywords: &[String], size_limit: usize) -> Option<Regex> {
  if keywords.is_empty() {
    return None;
  }
  let alternation = keywords.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
  match RegexBuilder::new(&format!("(?:{alternation})")).case_insensitive(true).size_limit(size_limit).build() {
    Ok(re) => Some(re),
    Err(e) => {
      warn!(keywords = keywords.len(), error = %e, "risk keyword matcher unavailable; using substring search");
      None
    }
  }
}

impl Default for RiskKeywords {
  fn default() -> Self {
    Self::new(["阻塞", "风险", "blocked", "risk"])
  }
}

/// Text used when neither the bucket nor the configured default has anything to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackText {
  pub current_summary: String,
  pub issues: String,
  pub next_summary: String,
}

impl Default for FallbackText {
  fn default() -> Self {
    Self {
      current_summary: "本期暂无计划动作".into(),
      issues: "进度正常，暂无重大风险".into(),
      next_summary: "下期计划待同步".into(),
    }
  }
}

impl FallbackText {
  /// Empty placeholders, for goal-authored cells that should stay blank when missing.
  pub fn blank() -> Self {
    Self { current_summary: String::new(), issues: String::new(), next_summary: String::new() }
  }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryPolicy {
  pub calendar: PeriodCalendar,
  pub risk_keywords: RiskKeywords,
  pub fallback: FallbackText,
}

/// Anything able to produce a rollup for a given period.
pub trait PeriodSummaryProvider {
  fn summarize(&self, anchor: NaiveDate, granularity: Granularity) -> Result<PeriodSummary, PeriodError>;
}

/// Live aggregation over a support project's timeline.
pub struct TimelineSummaries<'a> {
  project: &'a SupportProject,
  policy: &'a SummaryPolicy,
}

impl<'a> TimelineSummaries<'a> {
  pub fn new(project: &'a SupportProject, policy: &'a SummaryPolicy) -> Self {
    Self { project, policy }
  }
}

impl PeriodSummaryProvider for TimelineSummaries<'_> {
  fn summarize(&self, anchor: NaiveDate, granularity: Granularity) -> Result<PeriodSummary, PeriodError> {
    derive_with(self.policy, &self.project.timeline, &self.project.period_summaries, anchor, granularity)
  }
}

/// Lookup in a goal's own per-granularity summary table; the anchor is irrelevant.
pub struct StaticSummaries<'a> {
  goal: &'a Goal,
  fallback: &'a FallbackText,
}

impl<'a> StaticSummaries<'a> {
  pub fn new(goal: &'a Goal, fallback: &'a FallbackText) -> Self {
    Self { goal, fallback }
  }
}

impl PeriodSummaryProvider for StaticSummaries<'_> {
  fn summarize(&self, _anchor: NaiveDate, granularity: Granularity) -> Result<PeriodSummary, PeriodError> {
    let authored = self.goal.period_summaries.get(&granularity);
    Ok(PeriodSummary {
      current_summary: or_fallback(authored.map(|s| s.current_goal.as_str()), &self.fallback.current_summary),
      issues: or_fallback(authored.map(|s| s.progress_and_risk.as_str()), &self.fallback.issues),
      next_summary: or_fallback(authored.map(|s| s.next_goal.as_str()), &self.fallback.next_summary),
    })
  }
}

/// Derive a rollup with the default policy (Monday weeks, default keywords and placeholders).
pub fn derive(
  timeline: &[TimelineEntry],
  defaults: &BTreeMap<Granularity, PeriodSummary>,
  anchor: NaiveDate,
  granularity: Granularity,
) -> Result<PeriodSummary, PeriodError> {
  derive_with(&SummaryPolicy::default(), timeline, defaults, anchor, granularity)
}

pub fn derive_with(
  policy: &SummaryPolicy,
  timeline: &[TimelineEntry],
  defaults: &BTreeMap<Granularity, PeriodSummary>,
  anchor: NaiveDate,
  granularity: Granularity,
) -> Result<PeriodSummary, PeriodError> {
  let buckets = bucket_with(&policy.calendar, timeline, anchor, granularity)?;
  let configured = defaults.get(&granularity);

  let current_summary = if buckets.current.is_empty() {
    or_fallback(configured.map(|s| s.current_summary.as_str()), &policy.fallback.current_summary)
  } else {
    join_entries(&buckets.current)
  };

  let risky: Vec<&str> = buckets
    .current
    .iter()
    .filter(|e| policy.risk_keywords.matches(&e.status))
    .map(|e| e.description.as_str())
    .collect();

  let issues = if risky.is_empty() {
    or_fallback(configured.map(|s| s.issues.as_str()), &policy.fallback.issues)
  } else {
    risky.join(ENTRY_SEPARATOR)
  };

  let next_summary = if buckets.next.is_empty() {
    or_fallback(configured.map(|s| s.next_summary.as_str()), &policy.fallback.next_summary)
  } else {
    join_entries(&buckets.next)
  };

  Ok(PeriodSummary { current_summary, issues, next_summary })
}

fn join_entries(entries: &[TimelineEntry]) -> String {
  entries
    .iter()
    .map(|e| format!("[{}] {}", e.status, e.description))
    .collect::<Vec<_>>()
    .join(ENTRY_SEPARATOR)
}

fn or_fallback(configured: Option<&str>, fallback: &str) -> String {
  match configured {
    Some(text) if !text.is_empty() => text.to_string(),
    _ => fallback.to_string(),
  }
}
