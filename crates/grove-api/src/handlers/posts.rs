//! Handlers for `/posts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/posts/:uid` | One post (oid given), a comma-separated list, or a paged collection |
//! | `POST`   | `/posts/:uid` | Create or update; 201 on create |
//! | `PUT`    | `/posts/:uid` | Update only; 404 if absent |
//! | `DELETE` | `/posts/:uid` | Soft delete; 204 |
//! | `POST`   | `/posts/:uid/undelete` | Privileged only |
//! | `GET`    | `/posts/:uid/count` | `{"count": n}` |
//! | `PUT`    | `/posts/:uid/touch` | Bump `updated_at` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use grove_core::{
  cache::{Generation, post_key},
  callback::CallbackAction,
  path,
  post::{Mutation, Occurrences, Post, PostWrite, WriteMode},
  store::{Direction, OccurrenceFilter, PostQuery, PostStore},
  uid::Uid,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  ApiConfig, AppState,
  error::ApiError,
  handlers::{Intent, committed, validate_write},
  session::Caller,
};

// ─── Cache helpers ───────────────────────────────────────────────────────────

/// `true` if `uid` names `post`: same oid, klass allowed, and one of the
/// post's paths matched.
fn addresses(uid: &Uid, post: &Post) -> bool {
  uid.oid == Some(post.id)
    && uid.klass.matches(&post.klass)
    && post.paths.iter().any(|p| uid.path.matches(p))
}

/// Only public, live posts are cached, so a hit is visible to everyone.
///
/// `since` is the cache generation taken before `post` was read; if the post
/// was invalidated after that, the read may be stale and is not cached.
async fn remember<S>(state: &AppState<S>, post: &Post, since: Generation) {
  if post.restricted || post.deleted {
    return;
  }
  if let Ok(value) = serde_json::to_value(post) {
    state.cache.fill(&post_key(post.id), value, since).await;
  }
}

fn cached(value: Option<Value>, uid: &Uid) -> Option<Post> {
  value
    .and_then(|v| serde_json::from_value::<Post>(v).ok())
    .filter(|post| addresses(uid, post))
}

// ─── Get ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
  /// Comma-separated; every tag must be present.
  pub tags:             Option<String>,
  pub created_by:       Option<i64>,
  pub external_id:      Option<String>,
  pub direction:        Option<Direction>,
  #[serde(rename = "occurrence[label]")]
  pub occurrence_label: Option<String>,
  #[serde(rename = "occurrence[from]")]
  pub occurrence_from:  Option<DateTime<Utc>>,
  #[serde(rename = "occurrence[to]")]
  pub occurrence_to:    Option<DateTime<Utc>>,
}

impl ListParams {
  fn into_query(self, scope: Uid, config: ApiConfig) -> PostQuery {
    let mut query = PostQuery::new(scope);
    query.limit = self
      .limit
      .unwrap_or(config.default_limit)
      .min(config.max_limit);
    query.offset = self.offset.unwrap_or(0);
    query.tags = self
      .tags
      .map(|t| t.split(',').map(str::to_owned).collect())
      .unwrap_or_default();
    query.created_by = self.created_by;
    query.external_id = self.external_id;
    query.direction = self.direction.unwrap_or_default();
    query.occurrence = self.occurrence_label.map(|label| OccurrenceFilter {
      label,
      from: self.occurrence_from,
      to: self.occurrence_to,
    });
    query
  }
}

#[derive(Debug, Serialize)]
pub struct PostsPage {
  pub posts:     Vec<Post>,
  pub limit:     usize,
  pub offset:    usize,
  pub last_page: bool,
}

/// `GET /posts/:uid`
pub async fn get_uid<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError>
where
  S: PostStore + 'static,
{
  if raw.contains(',') {
    return Ok(get_many(&state, &caller, &raw).await?.into_response());
  }
  let uid = Uid::parse_scope(&raw)?;
  if uid.oid.is_some() {
    return Ok(Json(get_one(&state, &caller, uid).await?).into_response());
  }

  let query = params.into_query(uid, state.config);
  let page = state
    .store
    .query_posts(query, caller.identity.clone())
    .await
    .map_err(ApiError::store)?;
  Ok(
    Json(PostsPage {
      posts:     page.items,
      limit:     page.limit,
      offset:    page.offset,
      last_page: page.last_page,
    })
    .into_response(),
  )
}

async fn get_one<S>(state: &AppState<S>, caller: &Caller, uid: Uid) -> Result<Post, ApiError>
where
  S: PostStore,
{
  if let Some(oid) = uid.oid {
    if let Some(post) = cached(state.cache.get(&post_key(oid)).await, &uid) {
      return Ok(post);
    }
  }
  let since = state.cache.generation().await;
  let post = state
    .store
    .get_post(uid.clone(), caller.identity.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{uid} not found")))?;
  remember(state, &post, since).await;
  Ok(post)
}

/// Fully-specified UIDs, comma-separated. One slot per UID, `null` for
/// posts that are missing or not visible.
async fn get_many<S>(
  state: &AppState<S>,
  caller: &Caller,
  raw: &str,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore,
{
  let uids = raw
    .split(',')
    .map(Uid::parse)
    .collect::<grove_core::Result<Vec<_>>>()?;
  let mut oids = Vec::with_capacity(uids.len());
  for uid in &uids {
    let oid = uid
      .oid
      .ok_or_else(|| ApiError::Malformed(format!("{uid} has no oid")))?;
    oids.push(oid);
  }

  let keys: Vec<String> = oids.iter().copied().map(post_key).collect();
  let mut slots: Vec<Option<Post>> = state
    .cache
    .get_multi(&keys)
    .await
    .into_iter()
    .zip(&uids)
    .map(|(value, uid)| cached(value, uid))
    .collect();

  let missing: Vec<i64> = slots
    .iter()
    .zip(&oids)
    .filter(|(slot, _)| slot.is_none())
    .map(|(_, oid)| *oid)
    .collect();
  if !missing.is_empty() {
    let since = state.cache.generation().await;
    let fetched = state
      .store
      .get_posts(missing, caller.identity.clone())
      .await
      .map_err(ApiError::store)?;
    for post in &fetched {
      remember(state, post, since).await;
    }
    for (slot, uid) in slots.iter_mut().zip(&uids) {
      if slot.is_none() {
        *slot = fetched.iter().find(|p| addresses(uid, p)).cloned();
      }
    }
  }

  Ok(Json(json!({ "posts": slots })))
}

// ─── Count ───────────────────────────────────────────────────────────────────

/// `GET /posts/:uid/count`
pub async fn count<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + 'static,
{
  let query = params.into_query(Uid::parse_scope(&raw)?, state.config);
  let count = state
    .store
    .count_posts(query, caller.identity.clone())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "count": count })))
}

// ─── Create / update ─────────────────────────────────────────────────────────

/// JSON body accepted by `POST` and `PUT /posts/:uid`.
#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub document:    Option<Value>,
  pub tags:        Option<Vec<String>>,
  pub restricted:  Option<bool>,
  pub paths:       Option<Vec<path::Path>>,
  pub occurrences: Option<Occurrences>,
  pub external_id: Option<String>,
  #[serde(default)]
  pub merge:       bool,
  pub version:     Option<i64>,
}

impl PostBody {
  fn into_write(self, mode: WriteMode) -> PostWrite {
    PostWrite {
      document: self.document,
      tags: self.tags,
      restricted: self.restricted,
      paths: self.paths,
      occurrences: self.occurrences,
      external_id: self.external_id,
      merge: self.merge,
      version: self.version,
      mode,
    }
  }
}

fn parse_body(body: Value) -> Result<PostBody, ApiError> {
  serde_json::from_value(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

async fn write<S>(
  state: AppState<S>,
  caller: Caller,
  raw: String,
  body: Value,
  mode: WriteMode,
) -> Result<Response, ApiError>
where
  S: PostStore,
{
  let identity = caller.require()?.clone();
  let uid = Uid::parse(&raw)?;
  let external_id = parse_body(body.clone())?.external_id;

  let validated = validate_write(
    &state,
    &caller,
    &identity,
    &uid,
    external_id,
    Intent::Upsert,
    body,
  )
  .await?;
  // Hold the store to the action the callbacks approved.
  let mode = match (validated.action, mode) {
    (Some(CallbackAction::Create), WriteMode::Upsert) => WriteMode::CreateOnly,
    (Some(CallbackAction::Update), _) => WriteMode::UpdateOnly,
    _ => mode,
  };
  let write = parse_body(validated.changes)?.into_write(mode);

  let transition = state
    .store
    .upsert(uid, write, identity.clone())
    .await
    .map_err(ApiError::store)?;
  committed(&state, &transition, &identity).await;

  let status = if transition.created() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  Ok((status, Json(transition.after)).into_response())
}

/// `POST /posts/:uid`: create, or update what the UID or `external_id`
/// addresses.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
  Json(body): Json<Value>,
) -> Result<Response, ApiError>
where
  S: PostStore + 'static,
{
  write(state, caller, raw, body, WriteMode::Upsert).await
}

/// `PUT /posts/:uid`: update only.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
  Json(body): Json<Value>,
) -> Result<Response, ApiError>
where
  S: PostStore + 'static,
{
  write(state, caller, raw, body, WriteMode::UpdateOnly).await
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Apply `mutation` after asking the callbacks about `action`.
pub(crate) async fn apply<S>(
  state: &AppState<S>,
  caller: &Caller,
  raw: &str,
  mutation: Mutation,
  action: Option<(CallbackAction, Value)>,
) -> Result<Post, ApiError>
where
  S: PostStore,
{
  let identity = caller.require()?.clone();
  let uid = Uid::parse(raw)?;
  if let Some((action, changes)) = action {
    validate_write(
      state,
      caller,
      &identity,
      &uid,
      None,
      Intent::Existing(action),
      changes,
    )
    .await?;
  }
  let transition = state
    .store
    .mutate(uid, mutation, identity.clone())
    .await
    .map_err(ApiError::store)?;
  committed(state, &transition, &identity).await;
  Ok(transition.after)
}

/// `DELETE /posts/:uid`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: PostStore + 'static,
{
  let changes = json!({ "deleted": true });
  apply(&state, &caller, &raw, Mutation::Delete, Some((CallbackAction::Delete, changes)))
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /posts/:uid/undelete`
pub async fn undelete<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let changes = json!({ "deleted": false });
  let post = apply(
    &state,
    &caller,
    &raw,
    Mutation::Undelete,
    Some((CallbackAction::Undelete, changes)),
  )
  .await?;
  Ok(Json(post))
}

/// `PUT /posts/:uid/touch`
pub async fn touch<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(raw): Path<String>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  Ok(Json(apply(&state, &caller, &raw, Mutation::Touch, None).await?))
}
