use chrono::NaiveDate;

use crate::model::TimelineEntry;
use crate::period::{DateRange, Granularity, PeriodCalendar, PeriodError};

/// Timeline entries split into the current period and the one after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets {
  pub current_range: DateRange,
  pub next_range: DateRange,
  pub current: Vec<TimelineEntry>,
  pub next: Vec<TimelineEntry>,
}

/// Bucket `entries` into the period containing `anchor` and the following one.
///
/// Entries keep their original order; anything outside both ranges is dropped.
pub fn bucket(entries: &[TimelineEntry], anchor: NaiveDate, granularity: Granularity) -> Result<Buckets, PeriodError> {
  bucket_with(&PeriodCalendar::default(), entries, anchor, granularity)
}

pub fn bucket_with(
  calendar: &PeriodCalendar,
  entries: &[TimelineEntry],
  anchor: NaiveDate,
  granularity: Granularity,
) -> Result<Buckets, PeriodError> {
  let current_range = calendar.resolve(anchor, granularity, 0)?;
  let next_range = calendar.resolve(anchor, granularity, 1)?;

  let mut current = Vec::new();
  let mut next = Vec::new();

  for entry in entries {
    if current_range.contains(entry.start_time) {
      current.push(entry.clone());
    } else if next_range.contains(entry.start_time) {
      next.push(entry.clone());
    }
  }

  Ok(Buckets { current_range, next_range, current, next })
}
