// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve calendar period boundaries (day/week/month/quarter/year) for an anchor date and signed offset
// role: calendar/periods
// inputs: anchor NaiveDate, Granularity, i64 offset, WeekStart policy
// outputs: Inclusive DateRange values
// invariants:
// - resolve(a, G, n).end + 1 day == resolve(a, G, n + 1).start for every granularity
// - week ranges always span exactly 7 days starting on the configured week start
// - month/quarter/year arithmetic uses floored division so negative offsets roll back whole years
// errors: InvalidGranularity / InvalidDate when parsing text; OutOfRange only past chrono's calendar limits
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
  #[error("invalid granularity {0:?}: expected one of day, week, month, quarter, year (or 日/周/月/季/年)")]
  InvalidGranularity(String),
  #[error("invalid date {0:?}: expected YYYY-MM-DD")]
  InvalidDate(String),
  #[error("offset {offset} from {anchor} leaves the supported calendar range")]
  OutOfRange { anchor: NaiveDate, offset: i64 },
}

/// Unit of a reporting period.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Granularity {
  Day,
  Week,
  Month,
  Quarter,
  Year,
}

impl Granularity {
  pub const ALL: [Granularity; 5] = [
    Granularity::Day,
    Granularity::Week,
    Granularity::Month,
    Granularity::Quarter,
    Granularity::Year,
  ];

  /// Short label used inside report headers ("本季目标", "季报").
  pub fn label(self) -> &'static str {
    match self {
      Granularity::Day => "日",
      Granularity::Week => "周",
      Granularity::Month => "月",
      Granularity::Quarter => "季",
      Granularity::Year => "年",
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Granularity::Day => "day",
      Granularity::Week => "week",
      Granularity::Month => "month",
      Granularity::Quarter => "quarter",
      Granularity::Year => "year",
    }
  }
}

impl fmt::Display for Granularity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Granularity {
  type Err = PeriodError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let raw = s.trim();
    let g = match raw.to_ascii_lowercase().as_str() {
      "day" | "daily" | "日" | "日度" => Granularity::Day,
      "week" | "weekly" | "周" | "周度" => Granularity::Week,
      "month" | "monthly" | "月" | "月度" => Granularity::Month,
      "quarter" | "quarterly" | "季" | "季度" => Granularity::Quarter,
      "year" | "yearly" | "annual" | "年" | "年度" => Granularity::Year,
      _ => return Err(PeriodError::InvalidGranularity(raw.to_string())),
    };
    Ok(g)
  }
}

impl TryFrom<String> for Granularity {
  type Error = PeriodError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Granularity> for String {
  fn from(g: Granularity) -> Self {
    g.name().to_string()
  }
}

/// First day of the week used when resolving `Granularity::Week`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum WeekStart {
  #[default]
  Monday,
  Sunday,
}

impl WeekStart {
  pub fn weekday(self) -> Weekday {
    match self {
      WeekStart::Monday => Weekday::Mon,
      WeekStart::Sunday => Weekday::Sun,
    }
  }
}

/// Inclusive calendar date range; `start <= end` always holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl DateRange {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }

  pub fn days(&self) -> i64 {
    (self.end - self.start).num_days() + 1
  }
}

impl fmt::Display for DateRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..={}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
  }
}

/// Calendar policy for period resolution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCalendar {
  pub week_start: WeekStart,
}

impl PeriodCalendar {
  pub fn new(week_start: WeekStart) -> Self {
    Self { week_start }
  }

  /// Resolve the period `offset` steps away from the one containing `anchor`.
  pub fn resolve(&self, anchor: NaiveDate, granularity: Granularity, offset: i64) -> Result<DateRange, PeriodError> {
    self
      .resolve_opt(anchor, granularity, offset)
      .ok_or(PeriodError::OutOfRange { anchor, offset })
  }

  fn resolve_opt(&self, anchor: NaiveDate, granularity: Granularity, offset: i64) -> Option<DateRange> {
    match granularity {
      Granularity::Day => {
        let day = shift_days(anchor, offset)?;
        Some(DateRange { start: day, end: day })
      }
      Granularity::Week => {
        let back = days_since_week_start(anchor, self.week_start);
        let start = shift_days(anchor, offset.checked_mul(7)?.checked_sub(back)?)?;
        let end = shift_days(start, 6)?;
        Some(DateRange { start, end })
      }
      Granularity::Month => {
        let index = month_index(i64::from(anchor.year()), anchor.month0())?.checked_add(offset)?;
        span_months(index, 1)
      }
      Granularity::Quarter => {
        let quarter = i64::from(anchor.month0() / 3).checked_add(offset)?;
        let year = i64::from(anchor.year()).checked_add(quarter.div_euclid(4))?;
        let first_month0 = (quarter.rem_euclid(4) * 3) as u32;
        span_months(month_index(year, first_month0)?, 3)
      }
      Granularity::Year => {
        let year = i64::from(anchor.year()).checked_add(offset)?;
        span_months(month_index(year, 0)?, 12)
      }
    }
  }
}

/// Resolve with the default (Monday-start) calendar.
pub fn resolve(anchor: NaiveDate, granularity: Granularity, offset: i64) -> Result<DateRange, PeriodError> {
  PeriodCalendar::default().resolve(anchor, granularity, offset)
}

/// Parse a `YYYY-MM-DD` anchor date.
pub fn parse_anchor(s: &str) -> Result<NaiveDate, PeriodError> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| PeriodError::InvalidDate(s.to_string()))
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
  date.checked_add_signed(TimeDelta::try_days(days)?)
}

fn days_since_week_start(date: NaiveDate, week_start: WeekStart) -> i64 {
  let today = date.weekday().num_days_from_monday();
  let first = week_start.weekday().num_days_from_monday();
  i64::from((today + 7 - first) % 7)
}

fn month_index(year: i64, month0: u32) -> Option<i64> {
  year.checked_mul(12)?.checked_add(i64::from(month0))
}

fn first_of_month(index: i64) -> Option<NaiveDate> {
  let year = i32::try_from(index.div_euclid(12)).ok()?;
  let month = index.rem_euclid(12) as u32 + 1;
  NaiveDate::from_ymd_opt(year, month, 1)
}

// Last day is the day before the 1st of the month following the span.
fn span_months(first_index: i64, count: i64) -> Option<DateRange> {
  let start = first_of_month(first_index)?;
  let end = first_of_month(first_index.checked_add(count)?)?.pred_opt()?;
  Some(DateRange { start, end })
}
