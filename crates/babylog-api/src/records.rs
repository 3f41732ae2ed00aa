//! Handlers for the record endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records/:user_id` | Newest first |
//! | `GET`  | `/records/:user_id/filter` | Optional `type`, `from`, `to` |
//! | `POST` | `/add-record` | Body: [`AddRecordBody`]; returns `{"id": n}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use babylog_core::{
  record::{Bound, NewRecord, Record, RecordFilter, RecordKind},
  store::RecordStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Treat an empty query value the same as a missing one.
pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.trim().is_empty())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /records/:user_id`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records = store
    .list_records(&user_id, &RecordFilter::default())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Filter ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
  #[serde(rename = "type")]
  pub kind: Option<String>,
  /// RFC 3339 instant or `YYYY-MM-DD`; inclusive.
  pub from: Option<String>,
  /// RFC 3339 instant or `YYYY-MM-DD`; inclusive.
  pub to:   Option<String>,
}

impl TryFrom<FilterParams> for RecordFilter {
  type Error = babylog_core::Error;

  fn try_from(p: FilterParams) -> Result<Self, Self::Error> {
    Ok(RecordFilter {
      kind: non_empty(p.kind).as_deref().map(RecordKind::parse).transpose()?,
      from: non_empty(p.from)
        .as_deref()
        .map(|s| Bound::Lower.parse(s))
        .transpose()?,
      to:   non_empty(p.to)
        .as_deref()
        .map(|s| Bound::Upper.parse(s))
        .transpose()?,
    })
  }
}

/// `GET /records/:user_id/filter[?type=...][&from=...][&to=...]`
pub async fn filter<S>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<String>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filter = RecordFilter::try_from(params)?;
  let records = store
    .list_records(&user_id, &filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Add ──────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /add-record`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRecordBody {
  pub user_id:   Option<String>,
  #[serde(rename = "type")]
  pub kind:      Option<String>,
  pub note:      Option<String>,
  pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddRecordResponse {
  pub id: i64,
}

/// `POST /add-record` — unlike the voice path, storage errors reach the
/// caller as a 500.
pub async fn add<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<AddRecordBody>,
) -> Result<Json<AddRecordResponse>, ApiError>
where
  S: RecordStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let (Some(user_id), Some(kind)) =
    (non_empty(body.user_id), non_empty(body.kind))
  else {
    return Err(ApiError::BadRequest("userId and type are required".into()));
  };

  let mut input =
    NewRecord::new(user_id, RecordKind::parse(&kind)?, body.note.unwrap_or_default());
  input.timestamp = body.timestamp;

  let record = store.add_record(input).await.map_err(ApiError::store)?;
  tracing::debug!(id = record.id, user_id = %record.user_id, kind = %record.kind, "record added");
  Ok(Json(AddRecordResponse { id: record.id }))
}
