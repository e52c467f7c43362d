//! Error type for `graft-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] graft_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("column decode error: {0}")]
  Decode(String),
}

impl Error {
  /// Whether this wraps a pre-flight validation error rather than a
  /// transaction failure.
  pub fn is_validation(&self) -> bool { matches!(self, Self::Core(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
