//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`] and
//! [`IdentityLinker`].

use std::path::Path;

use babylog_core::{
  identity::UserMapping,
  record::{NewRecord, Record, RecordFilter, ReportEntry, START_MARKER, now},
  store::{IdentityLinker, RecordStore},
};
use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{
    RECORD_COLUMNS, RawMapping, RawRecord, encode_dt, encode_kind,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A babylog store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every
/// statement runs on the connection's own thread, one closure at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn mapping_rows(&self) -> Result<i64> {
    Ok(
      self
        .conn
        .call(|conn| {
          Ok(conn.query_row("SELECT COUNT(*) FROM user_mappings", [], |r| {
            r.get::<_, i64>(0)
          })?)
        })
        .await?,
    )
  }
}

// ─── Pairing ─────────────────────────────────────────────────────────────────

/// Close the user's latest open interval of `open_kind`, if any.
///
/// "Latest" is insertion order, not timestamp order: a back-dated start is
/// still the interval the next opposite start closes. An interval is open
/// when its start record has no `end_marker` record of the same kind
/// inserted after it. The closing record is stamped `at`, or
/// at the start's own timestamp if that is later. Returns the id of the
/// closing record.
fn close_open_interval(
  conn:       &rusqlite::Connection,
  user_id:    &str,
  open_kind:  &str,
  end_marker: &str,
  at:         &str,
) -> rusqlite::Result<Option<i64>> {
  let open: Option<(i64, String)> = conn
    .query_row(
      "SELECT id, timestamp FROM records
       WHERE user_id = ?1
         AND kind = ?2
         AND substr(note, 1, length(?3)) = ?3
       ORDER BY id DESC
       LIMIT 1",
      rusqlite::params![user_id, open_kind, START_MARKER],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;

  let Some((open_id, open_ts)) = open else {
    return Ok(None);
  };

  let already_closed = conn
    .query_row(
      "SELECT 1 FROM records
       WHERE user_id = ?1 AND kind = ?2 AND note = ?3 AND id > ?4
       LIMIT 1",
      rusqlite::params![user_id, open_kind, end_marker, open_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);

  if already_closed {
    return Ok(None);
  }

  let close_at = if open_ts.as_str() > at { open_ts.as_str() } else { at };

  conn.execute(
    "INSERT INTO records (user_id, kind, note, timestamp) VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![user_id, open_kind, end_marker, close_at],
  )?;
  Ok(Some(conn.last_insert_rowid()))
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn add_record(&self, input: NewRecord) -> Result<Record> {
    let timestamp = input.timestamp.unwrap_or_else(now).trunc_subsecs(6);

    let user_id_str = input.user_id.clone();
    let kind_str    = encode_kind(input.kind);
    let note_str    = input.note.clone();
    let at_str      = encode_dt(timestamp);
    let closes      = input
      .kind
      .opposite()
      .filter(|_| input.opens_interval())
      .map(|k| (encode_kind(k), k.end_marker()));

    // The lookup and both inserts share one transaction, so concurrent
    // writers cannot both miss the same open interval.
    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some((open_kind, end_marker)) = closes {
          close_open_interval(&tx, &user_id_str, open_kind, &end_marker, &at_str)?;
        }
        tx.execute(
          "INSERT INTO records (user_id, kind, note, timestamp) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id_str, kind_str, note_str, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(Record {
      id,
      user_id: input.user_id,
      kind: input.kind,
      note: input.note,
      timestamp,
    })
  }

  async fn list_records(
    &self,
    user_id: &str,
    filter:  &RecordFilter,
  ) -> Result<Vec<Record>> {
    let mut conds = vec!["user_id = ?1".to_owned()];
    let mut args  = vec![user_id.to_owned()];

    if let Some(kind) = filter.kind {
      args.push(encode_kind(kind).to_owned());
      conds.push(format!("kind = ?{}", args.len()));
    }
    if let Some(from) = filter.from {
      args.push(encode_dt(from));
      conds.push(format!("timestamp >= ?{}", args.len()));
    }
    if let Some(to) = filter.to {
      args.push(encode_dt(to));
      conds.push(format!("timestamp <= ?{}", args.len()));
    }

    let sql = format!(
      "SELECT {RECORD_COLUMNS} FROM records
       WHERE {}
       ORDER BY timestamp DESC, id DESC",
      conds.join(" AND ")
    );

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn report(
    &self,
    user_id: &str,
    from:    DateTime<Utc>,
    to:      DateTime<Utc>,
  ) -> Result<Vec<ReportEntry>> {
    let user_id_str = user_id.to_owned();
    let from_str    = encode_dt(from);
    let to_str      = encode_dt(to);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM records
           WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
           ORDER BY timestamp ASC, id ASC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id_str, from_str, to_str],
            RawRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_report_entry).collect()
  }
}

// ─── IdentityLinker impl ─────────────────────────────────────────────────────

impl IdentityLinker for SqliteStore {
  type Error = crate::Error;

  async fn link(&self, application_id: &str, user_token: &str) -> Result<UserMapping> {
    let mapping = UserMapping {
      application_id: application_id.to_owned(),
      user_token:     user_token.to_owned(),
      created_at:     now(),
    };

    let app_str   = mapping.application_id.clone();
    let token_str = mapping.user_token.clone();
    let at_str    = encode_dt(mapping.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO user_mappings (application_id, user_token, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![app_str, token_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(mapping)
  }

  async fn mapping(&self, application_id: &str) -> Result<Option<UserMapping>> {
    let app_str = application_id.to_owned();

    let raw: Option<RawMapping> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT application_id, user_token, created_at
               FROM user_mappings WHERE application_id = ?1",
              rusqlite::params![app_str],
              |row| {
                Ok(RawMapping {
                  application_id: row.get(0)?,
                  user_token:     row.get(1)?,
                  created_at:     row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMapping::into_mapping).transpose()
  }
}
