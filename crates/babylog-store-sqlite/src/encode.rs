//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix), so string comparison in SQL matches
//! chronological order.

use babylog_core::{
  identity::UserMapping,
  record::{Record, RecordKind, ReportEntry},
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── RecordKind
// ───────────────────────────────────────────────────────────────

pub fn encode_kind(k: RecordKind) -> &'static str {
  match k {
    RecordKind::Sleep => "sleep",
    RecordKind::Awake => "awake",
    RecordKind::Feeding => "feeding",
  }
}

pub fn decode_kind(s: &str) -> Result<RecordKind> { Ok(RecordKind::parse(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const RECORD_COLUMNS: &str = "id, user_id, kind, note, timestamp";

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub id:        i64,
  pub user_id:   String,
  pub kind:      String,
  pub note:      String,
  pub timestamp: String,
}

impl RawRecord {
  /// Map a row selected with [`RECORD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      user_id:   row.get(1)?,
      kind:      row.get(2)?,
      note:      row.get(3)?,
      timestamp: row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    Ok(Record {
      id:        self.id,
      user_id:   self.user_id,
      kind:      decode_kind(&self.kind)?,
      note:      self.note,
      timestamp: decode_dt(&self.timestamp)?,
    })
  }

  pub fn into_report_entry(self) -> Result<ReportEntry> {
    self.into_record().map(ReportEntry::from)
  }
}

/// Raw strings read directly from a `user_mappings` row.
pub struct RawMapping {
  pub application_id: String,
  pub user_token:     String,
  pub created_at:     String,
}

impl RawMapping {
  pub fn into_mapping(self) -> Result<UserMapping> {
    Ok(UserMapping {
      application_id: self.application_id,
      user_token:     self.user_token,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}
