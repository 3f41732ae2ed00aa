//! JSON data and report API for babylog.
//!
//! Exposes an axum [`Router`] backed by any [`babylog_core::store::RecordStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", babylog_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod records;
pub mod report;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use babylog_core::store::RecordStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/records/{user_id}", get(records::list::<S>))
    .route("/records/{user_id}/filter", get(records::filter::<S>))
    .route("/report/{user_id}/{from}/{to}", get(report::handler::<S>))
    .route("/add-record", post(records::add::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use babylog_core::record::{NewRecord, Record, RecordFilter, RecordKind, ReportEntry};
  use babylog_store_sqlite::SqliteStore;
  use chrono::{DateTime, TimeZone as _, Utc};
  use tower::ServiceExt as _;

  use crate::records::AddRecordResponse;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
  }

  async fn call<S: RecordStore + 'static>(
    store:  Arc<S>,
    method: &str,
    uri:    &str,
    body:   Option<&str>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder
      .body(Body::from(body.unwrap_or_default().to_string()))
      .unwrap();
    api_router(store).oneshot(req).await.unwrap()
  }

  async fn json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn seed(store: &SqliteStore) {
    for (kind, ts) in [
      (RecordKind::Feeding, at(1, 8)),
      (RecordKind::Sleep, at(1, 13)),
      (RecordKind::Feeding, at(2, 8)),
      (RecordKind::Feeding, at(3, 8)),
    ] {
      store
        .add_record(NewRecord::new("kid", kind, "note").at(ts))
        .await
        .unwrap();
    }
  }

  // ── Add ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_record_returns_inserted_id() {
    let store = make_store().await;
    let resp = call(
      store.clone(),
      "POST",
      "/add-record",
      Some(r#"{"userId":"kid","type":"feeding","note":"90 ml"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: AddRecordResponse = json(resp).await;

    let records = store.list_records("kid", &RecordFilter::default()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, body.id);
    assert_eq!(records[0].note, "90 ml");
  }

  #[tokio::test]
  async fn add_record_without_type_is_rejected() {
    let store = make_store().await;
    let resp = call(
      store.clone(),
      "POST",
      "/add-record",
      Some(r#"{"userId":"kid","note":"x"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let records = store.list_records("kid", &RecordFilter::default()).await.unwrap();
    assert!(records.is_empty());
  }

  #[tokio::test]
  async fn add_record_with_empty_user_is_rejected() {
    let store = make_store().await;
    let resp = call(
      store,
      "POST",
      "/add-record",
      Some(r#"{"userId":"","type":"sleep"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn add_record_with_unknown_type_is_rejected() {
    let store = make_store().await;
    let resp = call(
      store,
      "POST",
      "/add-record",
      Some(r#"{"userId":"kid","type":"bath"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("bath"));
  }

  #[tokio::test]
  async fn manual_awake_start_pairs_with_open_sleep() {
    let store = make_store().await;
    for kind in ["sleep", "awake"] {
      let body = format!(r#"{{"userId":"kid","type":"{kind}","note":"start"}}"#);
      let resp = call(store.clone(), "POST", "/add-record", Some(&body)).await;
      assert_eq!(resp.status(), StatusCode::OK);
    }

    let records = store.list_records("kid", &RecordFilter::default()).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].note, "end sleep");
  }

  // ── List / filter ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_newest_first() {
    let store = make_store().await;
    seed(&store).await;

    let resp = call(store, "GET", "/records/kid", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let records: Vec<Record> = json(resp).await;
    let stamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![at(3, 8), at(2, 8), at(1, 13), at(1, 8)]);
  }

  #[tokio::test]
  async fn filter_combines_type_and_dates() {
    let store = make_store().await;
    seed(&store).await;

    let resp = call(
      store,
      "GET",
      "/records/kid/filter?type=feeding&from=2024-03-01&to=2024-03-02",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let records: Vec<Record> = json(resp).await;
    let stamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![at(2, 8), at(1, 8)]);
  }

  #[tokio::test]
  async fn empty_filter_values_are_ignored() {
    let store = make_store().await;
    seed(&store).await;

    let resp = call(store, "GET", "/records/kid/filter?type=&from=&to=", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let records: Vec<Record> = json(resp).await;
    assert_eq!(records.len(), 4);
  }

  #[tokio::test]
  async fn bad_filter_date_is_rejected() {
    let store = make_store().await;
    let resp = call(store, "GET", "/records/kid/filter?from=soon", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Report ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn report_covers_inclusive_range() {
    let store = make_store().await;
    seed(&store).await;

    let resp = call(store, "GET", "/report/kid/2024-03-01/2024-03-02", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<ReportEntry> = json(resp).await;
    let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![
      RecordKind::Feeding,
      RecordKind::Sleep,
      RecordKind::Feeding,
    ]);
  }

  #[tokio::test]
  async fn report_with_bad_bound_is_rejected() {
    let store = make_store().await;
    let resp = call(store, "GET", "/report/kid/then/now", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Store failures ──────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("disk on fire")]
  struct DiskOnFire;

  /// Every call fails.
  struct BrokenStore;

  impl RecordStore for BrokenStore {
    type Error = DiskOnFire;

    async fn add_record(&self, _input: NewRecord) -> Result<Record, DiskOnFire> {
      Err(DiskOnFire)
    }

    async fn list_records(
      &self,
      _user_id: &str,
      _filter: &RecordFilter,
    ) -> Result<Vec<Record>, DiskOnFire> {
      Err(DiskOnFire)
    }

    async fn report(
      &self,
      _user_id: &str,
      _from: DateTime<Utc>,
      _to: DateTime<Utc>,
    ) -> Result<Vec<ReportEntry>, DiskOnFire> {
      Err(DiskOnFire)
    }
  }

  #[tokio::test]
  async fn store_failures_are_500_with_error_body() {
    let store = Arc::new(BrokenStore);
    for (method, uri, body) in [
      ("GET", "/records/kid", None),
      ("GET", "/records/kid/filter?type=sleep", None),
      ("GET", "/report/kid/2024-03-01/2024-03-02", None),
      (
        "POST",
        "/add-record",
        Some(r#"{"userId":"kid","type":"feeding","note":"60 ml"}"#),
      ),
    ] {
      let resp = call(store.clone(), method, uri, body).await;
      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
      let body: serde_json::Value = json(resp).await;
      assert_eq!(body["error"], "disk on fire", "{uri}");
    }
  }

  #[tokio::test]
  async fn validation_runs_before_the_store() {
    let resp = call(
      Arc::new(BrokenStore),
      "POST",
      "/add-record",
      Some(r#"{"userId":"kid"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
