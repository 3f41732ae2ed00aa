//! Records — the tracked events for a single child.
//!
//! Records are immutable once written. Sleep and awake records form
//! open/close intervals through their notes: an interval opens with a
//! [`START_MARKER`] note and closes with an `"end <type>"` note.

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound as _, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

/// Note carried by a record that opens a sleep or awake interval.
pub const START_MARKER: &str = "start";

// ─── Kind ─────────────────────────────────────────────────────────────────────

/// The category of a tracked event.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RecordKind {
  Sleep,
  Awake,
  Feeding,
}

impl RecordKind {
  pub const ALL: [RecordKind; 3] =
    [RecordKind::Sleep, RecordKind::Awake, RecordKind::Feeding];

  /// Parse a lowercase discriminant such as `"sleep"`.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownRecordKind(s.to_owned()))
  }

  /// The interval kind that a new record of this kind closes.
  ///
  /// `Feeding` takes no part in interval pairing.
  pub fn opposite(self) -> Option<Self> {
    match self {
      Self::Sleep => Some(Self::Awake),
      Self::Awake => Some(Self::Sleep),
      Self::Feeding => None,
    }
  }

  /// The note written on the record that closes an interval of this kind.
  pub fn end_marker(self) -> String { format!("end {self}") }
}

// ─── Record ───────────────────────────────────────────────────────────────────

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// Store-assigned, monotonically increasing.
  pub id:        i64,
  pub user_id:   String,
  #[serde(rename = "type")]
  pub kind:      RecordKind,
  pub note:      String,
  pub timestamp: DateTime<Utc>,
}

/// Input for [`RecordStore::add_record`](crate::store::RecordStore::add_record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
  pub user_id:   String,
  pub kind:      RecordKind,
  pub note:      String,
  /// Set by the store when `None`.
  pub timestamp: Option<DateTime<Utc>>,
}

impl NewRecord {
  pub fn new(
    user_id: impl Into<String>,
    kind: RecordKind,
    note: impl Into<String>,
  ) -> Self {
    Self {
      user_id: user_id.into(),
      kind,
      note: note.into(),
      timestamp: None,
    }
  }

  pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
    self.timestamp = Some(timestamp);
    self
  }

  pub fn opens_interval(&self) -> bool { self.note.starts_with(START_MARKER) }
}

/// Current time at the precision the stores keep.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Queries ──────────────────────────────────────────────────────────────────

/// Conjunctive filter for [`RecordStore::list_records`](crate::store::RecordStore::list_records).
///
/// Both bounds are inclusive. The default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
  pub kind: Option<RecordKind>,
  pub from: Option<DateTime<Utc>>,
  pub to:   Option<DateTime<Utc>>,
}

impl RecordFilter {
  pub fn matches(&self, record: &Record) -> bool {
    self.kind.is_none_or(|k| k == record.kind)
      && self.from.is_none_or(|from| record.timestamp >= from)
      && self.to.is_none_or(|to| record.timestamp <= to)
  }
}

/// One line of a date-range report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
  #[serde(rename = "type")]
  pub kind:      RecordKind,
  pub note:      String,
  pub timestamp: DateTime<Utc>,
}

impl From<Record> for ReportEntry {
  fn from(r: Record) -> Self {
    Self { kind: r.kind, note: r.note, timestamp: r.timestamp }
  }
}

// ─── Date bounds ──────────────────────────────────────────────────────────────

/// Which end of a range a textual bound describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
  Lower,
  Upper,
}

impl Bound {
  /// Parse an RFC 3339 instant or a `YYYY-MM-DD` date.
  ///
  /// A bare date covers the whole UTC day: a lower bound starts at midnight,
  /// an upper bound ends at the day's last microsecond.
  pub fn parse(self, s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
      return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .map_err(|_| Error::InvalidBound(s.to_owned()))?;
    let time = match self {
      Bound::Lower => NaiveTime::MIN,
      Bound::Upper => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
        .ok_or_else(|| Error::InvalidBound(s.to_owned()))?,
    };
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_parses_case_insensitively() {
    assert_eq!(RecordKind::parse("Sleep").unwrap(), RecordKind::Sleep);
    assert_eq!(RecordKind::parse("feeding").unwrap(), RecordKind::Feeding);
    assert!(matches!(
      RecordKind::parse("nap"),
      Err(Error::UnknownRecordKind(_))
    ));
  }

  #[test]
  fn kind_serialises_lowercase() {
    assert_eq!(RecordKind::Awake.to_string(), "awake");
    assert_eq!(RecordKind::Sleep.end_marker(), "end sleep");
    assert_eq!(
      serde_json::to_string(&RecordKind::Feeding).unwrap(),
      "\"feeding\""
    );
  }

  #[test]
  fn opposites_pair_sleep_and_awake() {
    assert_eq!(RecordKind::Sleep.opposite(), Some(RecordKind::Awake));
    assert_eq!(RecordKind::Awake.opposite(), Some(RecordKind::Sleep));
    assert_eq!(RecordKind::Feeding.opposite(), None);
  }

  #[test]
  fn date_bounds_cover_whole_day() {
    let from = Bound::Lower.parse("2024-03-01").unwrap();
    let to = Bound::Upper.parse("2024-03-01").unwrap();
    assert_eq!(from.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    assert_eq!(to - from, chrono::Duration::days(1) - chrono::Duration::microseconds(1));
  }

  #[test]
  fn rfc3339_bounds_are_taken_verbatim() {
    let dt = Bound::Upper.parse("2024-03-01T10:30:00+03:00").unwrap();
    assert_eq!(dt.to_rfc3339(), "2024-03-01T07:30:00+00:00");
  }

  #[test]
  fn garbage_bound_is_rejected() {
    assert!(matches!(
      Bound::Lower.parse("yesterday"),
      Err(Error::InvalidBound(_))
    ));
  }
}
