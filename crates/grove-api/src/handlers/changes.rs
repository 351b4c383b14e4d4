//! Handler for the change feed.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use grove_core::{change::ChangeQuery, store::PostStore, uid::Uid};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, session::Caller};

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
  /// Only changes with a larger id.
  pub since: Option<i64>,
  /// Capped at 1000.
  pub limit: Option<usize>,
}

/// `GET /changes/:uid?since=..&limit=..`: ascending by id.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
  Query(params): Query<FeedParams>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + 'static,
{
  let identity = caller.require()?.clone();
  let query = ChangeQuery {
    scope: Uid::parse_scope(&raw)?,
    since: params.since,
    limit: params.limit,
  };
  let changes = state
    .store
    .changes(query, identity)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "changes": changes })))
}
