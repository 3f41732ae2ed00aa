//! The `RecordStore` and `IdentityLinker` traits.
//!
//! Both are implemented by storage backends (e.g. `babylog-store-sqlite`).
//! The HTTP layers depend on these abstractions, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  identity::UserMapping,
  record::{NewRecord, Record, RecordFilter, ReportEntry},
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// Abstraction over the append-only record table.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a record and return it with its store-assigned id.
  ///
  /// Adding a `sleep` or `awake` record whose note opens an interval first
  /// closes the user's latest still-open interval of the opposite kind, by
  /// inserting an `"end <kind>"` record ahead of the new one.
  fn add_record(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// List a user's records matching `filter`, most recent first.
  fn list_records<'a>(
    &'a self,
    user_id: &'a str,
    filter: &'a RecordFilter,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Report a user's records with `from <= timestamp <= to`, oldest first.
  fn report<'a>(
    &'a self,
    user_id: &'a str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<ReportEntry>, Self::Error>> + Send + 'a;
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Abstraction over the application-id to user-token mapping table.
pub trait IdentityLinker: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Map `application_id` to `user_token`, replacing any prior mapping.
  fn link<'a>(
    &'a self,
    application_id: &'a str,
    user_token: &'a str,
  ) -> impl Future<Output = Result<UserMapping, Self::Error>> + Send + 'a;

  /// The mapping for `application_id`, if one exists.
  fn mapping<'a>(
    &'a self,
    application_id: &'a str,
  ) -> impl Future<Output = Result<Option<UserMapping>, Self::Error>> + Send + 'a;

  /// The linked user token, or `application_id` itself when unlinked.
  fn resolve<'a>(
    &'a self,
    application_id: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a {
    async move {
      self
        .mapping(application_id)
        .await
        .map(|m| m.map_or_else(|| application_id.to_owned(), |m| m.user_token))
    }
  }
}
