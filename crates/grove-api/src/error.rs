//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use grove_core::{Classify, Failure};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Malformed(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  /// A validation callback refused the change.
  #[error("rejected by {origin}: {reason}")]
  Rejected { reason: String, origin: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map any classified error (store or domain) onto its HTTP class.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    if let Some(grove_core::Error::Rejected { reason, origin }) = e.as_core() {
      return Self::Rejected { reason: reason.clone(), origin: origin.clone() };
    }
    match e.failure() {
      Failure::Malformed => Self::Malformed(e.to_string()),
      Failure::Forbidden => Self::Forbidden(e.to_string()),
      Failure::NotFound => Self::NotFound(e.to_string()),
      Failure::Conflict => Self::Conflict(e.to_string()),
      Failure::Rejected | Failure::Internal => Self::Store(Box::new(e)),
    }
  }

  pub fn unauthenticated() -> Self {
    Self::Forbidden("a valid session is required".to_owned())
  }
}

impl From<grove_core::Error> for ApiError {
  fn from(e: grove_core::Error) -> Self { Self::store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Malformed(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Rejected { reason, origin } => (
        StatusCode::FORBIDDEN,
        json!({ "error": reason, "origin": origin }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (grove_core::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
      (grove_core::Error::Conflict("x".into()), StatusCode::CONFLICT),
      (grove_core::Error::Forbidden("x".into()), StatusCode::FORBIDDEN),
      (
        grove_core::Error::MalformedPath { path: "a..b".into(), reason: "empty label".into() },
        StatusCode::BAD_REQUEST,
      ),
      (grove_core::Error::ImmutabilityViolation, StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[test]
  fn rejections_keep_their_origin() {
    let err = ApiError::from(grove_core::Error::Rejected {
      reason: "no".into(),
      origin: "http://hook".into(),
    });
    assert!(matches!(&err, ApiError::Rejected { origin, .. } if origin == "http://hook"));
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
  }
}
