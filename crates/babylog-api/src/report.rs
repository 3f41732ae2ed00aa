//! Handler for `GET /report/:user_id/:from/:to`.
//!
//! `from` and `to` accept RFC 3339 instants or `YYYY-MM-DD` dates; both ends
//! are inclusive.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use babylog_core::{
  record::{Bound, ReportEntry},
  store::RecordStore,
};

use crate::error::ApiError;

pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Path((user_id, from, to)): Path<(String, String, String)>,
) -> Result<Json<Vec<ReportEntry>>, ApiError>
where
  S: RecordStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let from = Bound::Lower.parse(&from)?;
  let to = Bound::Upper.parse(&to)?;

  let entries = store
    .report(&user_id, from, to)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}
