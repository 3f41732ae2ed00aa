//! Error types for `babylog-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown record type: {0:?}")]
  UnknownRecordKind(String),

  #[error("invalid date bound: {0:?}")]
  InvalidBound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
