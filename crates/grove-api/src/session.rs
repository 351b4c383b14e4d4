//! Session extractor.
//!
//! The session token comes from the `X-Session` header or, failing that,
//! the `session` query parameter. It is resolved through the configured
//! [`IdentityResolver`](grove_core::identity::IdentityResolver) once per
//! request.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use grove_core::{identity::Identity, store::PostStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

pub const SESSION_HEADER: &str = "x-session";

#[derive(Deserialize)]
struct SessionParam {
  session: Option<String>,
}

/// Who is asking. Both fields are `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct Caller {
  pub session:  Option<String>,
  pub identity: Option<Identity>,
}

impl Caller {
  /// The resolved identity, or 403.
  pub fn require(&self) -> Result<&Identity, ApiError> {
    self.identity.as_ref().ok_or_else(ApiError::unauthenticated)
  }
}

fn session_of(parts: &Parts) -> Option<String> {
  let header = parts
    .headers
    .get(SESSION_HEADER)
    .and_then(|v| v.to_str().ok())
    .filter(|s| !s.is_empty())
    .map(str::to_owned);
  header.or_else(|| {
    Query::<SessionParam>::try_from_uri(&parts.uri)
      .ok()
      .and_then(|Query(p)| p.session)
      .filter(|s| !s.is_empty())
  })
}

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: PostStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(session) = session_of(parts) else {
      return Ok(Caller::default());
    };
    let identity = state.identity.resolve(&session).await;
    Ok(Caller { session: Some(session), identity })
  }
}
