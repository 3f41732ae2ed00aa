//! Error types and axum `IntoResponse` implementation.
//!
//! The `/alice` webhook never lets these reach the response; they surface
//! only on the login routes.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("invalid login state")]
  BadState,
  #[error("identity provider error: {0}")]
  Provider(String),
  #[error("identity provider request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("configuration error: {0}")]
  Config(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::BadState => {
        (StatusCode::BAD_REQUEST, "invalid login state").into_response()
      }
      Error::Provider(msg) => {
        tracing::warn!(%msg, "identity provider error");
        (StatusCode::BAD_GATEWAY, msg).into_response()
      }
      Error::Http(e) => {
        tracing::warn!(error = %e, "identity provider request failed");
        (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
      }
      Error::Config(msg) => {
        tracing::error!(%msg, "configuration error");
        (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
    }
  }
}
