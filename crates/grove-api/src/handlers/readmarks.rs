//! Handlers for the caller's reading cursors.

use axum::{
  Json,
  extract::{Path, State},
  response::{IntoResponse, Response},
};
use grove_core::{
  path::{self, PathQuery},
  readmark::Readmark,
  store::PostStore,
  uid::Uid,
};
use serde_json::json;

use crate::{AppState, error::ApiError, session::Caller};

/// `PUT /readmarks/:path/:uid`: move the cursor at `path` to the UID's oid.
pub async fn set<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((target, raw)): Path<(String, String)>,
) -> Result<Json<Readmark>, ApiError>
where
  S: PostStore + 'static,
{
  let identity = caller.require()?.clone();
  let target = path::Path::parse(&target)?;
  let uid = Uid::parse_scope(&raw)?;
  let post_id = uid
    .oid
    .ok_or_else(|| ApiError::Malformed(format!("{raw} has no oid")))?;
  let mark = state
    .store
    .set_readmark(identity, target, post_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(mark))
}

/// `GET /readmarks/:path`: one readmark for an exact path, a list for any
/// other path form.
pub async fn get_path<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
) -> Result<Response, ApiError>
where
  S: PostStore + 'static,
{
  let identity = caller.require()?.clone();
  let query = PathQuery::parse(&raw)?;
  let exact = !query.is_wildcard();
  let marks = state
    .store
    .readmarks(identity, query)
    .await
    .map_err(ApiError::store)?;

  if exact {
    let mark = marks
      .into_iter()
      .next()
      .ok_or_else(|| ApiError::NotFound(format!("no readmark at {raw}")))?;
    return Ok(Json(mark).into_response());
  }
  Ok(Json(json!({ "readmarks": marks })).into_response())
}
