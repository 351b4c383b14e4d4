//! Handler for location lookup.

use axum::{
  Json,
  extract::{Path, State},
};
use grove_core::{path::PathQuery, store::PostStore};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// `GET /locations/:path`: every declared location matching the path
/// query, ordered by path.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + 'static,
{
  let query = PathQuery::parse(&raw)?;
  let locations = state
    .store
    .locations(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "locations": locations })))
}
