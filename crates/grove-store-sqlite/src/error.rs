//! Error type for `grove-store-sqlite`.

use grove_core::{Classify, Failure};
use thiserror::Error;

/// Message raised by the triggers guarding the `changes` table.
pub(crate) const IMMUTABLE_CHANGES: &str = "changes are immutable";

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] grove_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row could not be turned back into a domain value.
  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    match &e {
      rusqlite::Error::SqliteFailure(_, Some(msg))
        if msg.contains(IMMUTABLE_CHANGES) =>
      {
        Self::Core(grove_core::Error::ImmutabilityViolation)
      }
      _ => Self::Sqlite(e),
    }
  }
}

impl Classify for Error {
  fn failure(&self) -> Failure {
    match self {
      Self::Core(e) => e.failure(),
      _ => Failure::Internal,
    }
  }

  fn as_core(&self) -> Option<&grove_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
