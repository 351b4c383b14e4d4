//! Error types for `grove-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed uid {uid:?}: {reason}")]
  MalformedUid { uid: String, reason: String },

  #[error("malformed path {path:?}: {reason}")]
  MalformedPath { path: String, reason: String },

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// An external callback refused the change.
  #[error("rejected by {origin}: {reason}")]
  Rejected { reason: String, origin: String },

  /// Something tried to rewrite the change log.
  #[error("changes are immutable")]
  ImmutabilityViolation,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn malformed_uid(uid: &str, reason: impl Into<String>) -> Self {
    Self::MalformedUid { uid: uid.to_owned(), reason: reason.into() }
  }

  pub(crate) fn malformed_path(path: &str, reason: impl Into<String>) -> Self {
    Self::MalformedPath { path: path.to_owned(), reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure class, used by transport layers to pick a status code
/// without knowing which backend produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
  Malformed,
  Forbidden,
  NotFound,
  Conflict,
  Rejected,
  Internal,
}

/// Implemented by every error type that can cross the store boundary.
pub trait Classify {
  fn failure(&self) -> Failure;

  /// The domain error underneath, if there is one.
  fn as_core(&self) -> Option<&Error> { None }
}

impl Classify for Error {
  fn failure(&self) -> Failure {
    match self {
      Self::MalformedUid { .. } | Self::MalformedPath { .. } => {
        Failure::Malformed
      }
      Self::Forbidden(_) => Failure::Forbidden,
      Self::NotFound(_) => Failure::NotFound,
      Self::Conflict(_) => Failure::Conflict,
      Self::Rejected { .. } => Failure::Rejected,
      Self::ImmutabilityViolation | Self::Serialization(_) => {
        Failure::Internal
      }
    }
  }

  fn as_core(&self) -> Option<&Error> { Some(self) }
}
