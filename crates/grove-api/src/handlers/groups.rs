//! Handlers for group administration. Privileged identities only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`    | `/groups/:group/memberships/:identity` | Idempotent |
//! | `DELETE` | `/groups/:group/memberships/:identity` | 404 if absent |
//! | `PUT`    | `/groups/:group/subtrees/:path` | Grant the subtree |
//! | `DELETE` | `/groups/:group/subtrees/:path` | Revoke the subtree |
//! | `GET`    | `/groups/:group/subtrees/:path` | `{"included": "granted"|"denied"|"unknown"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use grove_core::{
  group::GroupMembership,
  identity::Identity,
  path,
  store::PostStore,
};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, session::Caller};

fn require_god(caller: &Caller) -> Result<&Identity, ApiError> {
  let identity = caller.require()?;
  if !identity.god {
    return Err(ApiError::Forbidden(
      "group administration is privileged".to_owned(),
    ));
  }
  Ok(identity)
}

/// The caller must be privileged in the realm of `raw`.
fn require_realm(caller: &Caller, raw: &str) -> Result<path::Path, ApiError> {
  let identity = require_god(caller)?;
  let target = path::Path::parse(raw)?;
  if !identity.is_privileged_in(target.realm()) {
    return Err(ApiError::Forbidden(format!(
      "not privileged in realm {}",
      target.realm()
    )));
  }
  Ok(target)
}

/// `PUT /groups/:group/memberships/:identity`
pub async fn add_member<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((group_id, identity_id)): Path<(i64, i64)>,
) -> Result<Json<GroupMembership>, ApiError>
where
  S: PostStore + 'static,
{
  require_god(&caller)?;
  let membership = state
    .store
    .declare_membership(group_id, identity_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(membership))
}

/// `DELETE /groups/:group/memberships/:identity`
pub async fn remove_member<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((group_id, identity_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError>
where
  S: PostStore + 'static,
{
  require_god(&caller)?;
  let removed = state
    .store
    .remove_membership(group_id, identity_id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!(
      "identity {identity_id} is not in group {group_id}"
    )));
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /groups/:group/subtrees/:path`
pub async fn allow<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((group_id, raw)): Path<(i64, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + 'static,
{
  let target = require_realm(&caller, &raw)?;
  let granted = state
    .store
    .allow_subtree(group_id, target)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "granted": granted })))
}

/// `DELETE /groups/:group/subtrees/:path`
pub async fn deny<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((group_id, raw)): Path<(i64, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + 'static,
{
  let target = require_realm(&caller, &raw)?;
  let revoked = state
    .store
    .deny_subtree(group_id, target)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "revoked": revoked })))
}

/// `GET /groups/:group/subtrees/:path`
pub async fn inclusion<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((group_id, raw)): Path<(i64, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + 'static,
{
  let target = require_realm(&caller, &raw)?;
  let included = state
    .store
    .is_included(group_id, target)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "included": included })))
}
