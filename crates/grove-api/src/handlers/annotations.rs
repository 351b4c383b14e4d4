//! Handlers for a post's secondary paths, tags and occurrences.
//!
//! All of them need an existing post addressed by a full UID (with oid) and
//! return the post as stored after the change.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use grove_core::{
  callback::CallbackAction,
  path,
  post::{Mutation, OccurrenceOp, Post},
  store::PostStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, handlers::posts::apply, session::Caller};

// ─── Paths ───────────────────────────────────────────────────────────────────

/// `POST|PUT /posts/:uid/paths/:path`
pub async fn attach_path<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, target)): Path<(String, String)>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let target = path::Path::parse(&target)?;
  let changes = json!({ "paths": { "add": [target.to_string()] } });
  let post = apply(
    &state,
    &caller,
    &raw,
    Mutation::AttachPath(target),
    Some((CallbackAction::Update, changes)),
  )
  .await?;
  Ok(Json(post))
}

/// `DELETE /posts/:uid/paths/:path`
pub async fn detach_path<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, target)): Path<(String, String)>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let target = path::Path::parse(&target)?;
  let changes = json!({ "paths": { "remove": [target.to_string()] } });
  let post = apply(
    &state,
    &caller,
    &raw,
    Mutation::DetachPath(target),
    Some((CallbackAction::Update, changes)),
  )
  .await?;
  Ok(Json(post))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

fn split_tags(tags: &str) -> Vec<String> {
  tags.split(',').map(str::to_owned).collect()
}

/// `POST|PUT /posts/:uid/tags/:tags`: `tags` is comma-separated.
pub async fn add_tags<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, tags)): Path<(String, String)>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let tags = split_tags(&tags);
  let changes = json!({ "tags": { "add": tags } });
  let post = apply(
    &state,
    &caller,
    &raw,
    Mutation::AddTags(tags),
    Some((CallbackAction::Update, changes)),
  )
  .await?;
  Ok(Json(post))
}

/// `DELETE /posts/:uid/tags/:tags`
pub async fn remove_tags<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, tags)): Path<(String, String)>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let tags = split_tags(&tags);
  let changes = json!({ "tags": { "remove": tags } });
  let post = apply(
    &state,
    &caller,
    &raw,
    Mutation::RemoveTags(tags),
    Some((CallbackAction::Update, changes)),
  )
  .await?;
  Ok(Json(post))
}

// ─── Occurrences ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AtParams {
  /// One or more RFC 3339 timestamps, comma-separated.
  pub at: Option<String>,
}

impl AtParams {
  fn timestamps(&self) -> Result<Vec<DateTime<Utc>>, ApiError> {
    let Some(at) = self.at.as_deref().filter(|s| !s.is_empty()) else {
      return Ok(Vec::new());
    };
    at.split(',')
      .map(|t| {
        DateTime::parse_from_rfc3339(t.trim())
          .map(|dt| dt.with_timezone(&Utc))
          .map_err(|e| ApiError::Malformed(format!("invalid timestamp {t:?}: {e}")))
      })
      .collect()
  }
}

fn describe(op: &OccurrenceOp) -> Value {
  let (kind, at) = match op {
    OccurrenceOp::Append(at) => ("append", at),
    OccurrenceOp::Replace(at) => ("replace", at),
    OccurrenceOp::Remove(at) => ("remove", at),
  };
  json!({ "op": kind, "at": at })
}

async fn occurrences<S>(
  state: AppState<S>,
  caller: Caller,
  raw: String,
  label: String,
  op: OccurrenceOp,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore,
{
  let changes = json!({ "occurrences": { label.clone(): describe(&op) } });
  let post = apply(
    &state,
    &caller,
    &raw,
    Mutation::Occurrences { label, op },
    Some((CallbackAction::Update, changes)),
  )
  .await?;
  Ok(Json(post))
}

/// `POST /posts/:uid/occurrences/:label?at=..`: add timestamps.
pub async fn append_occurrences<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, label)): Path<(String, String)>,
  Query(params): Query<AtParams>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let op = OccurrenceOp::Append(params.timestamps()?);
  occurrences(state, caller, raw, label, op).await
}

/// `PUT /posts/:uid/occurrences/:label?at=..`: replace the label's set.
pub async fn replace_occurrences<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, label)): Path<(String, String)>,
  Query(params): Query<AtParams>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let op = OccurrenceOp::Replace(params.timestamps()?);
  occurrences(state, caller, raw, label, op).await
}

/// `DELETE /posts/:uid/occurrences/:label[?at=..]`: remove the given
/// timestamps, or the whole label.
pub async fn remove_occurrences<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path((raw, label)): Path<(String, String)>,
  Query(params): Query<AtParams>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let op = OccurrenceOp::Remove(params.timestamps()?);
  occurrences(state, caller, raw, label, op).await
}
