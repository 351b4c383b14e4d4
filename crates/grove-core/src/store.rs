//! The `PostStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `grove-store-sqlite`).
//! Higher layers (`grove-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  change::{Change, ChangeQuery, Transition},
  error::Classify,
  group::{GroupMembership, Inclusion},
  identity::Identity,
  location::Location,
  path::{Path, PathQuery},
  post::{Mutation, Post, PostWrite},
  readmark::Readmark,
  uid::Uid,
};

pub const DEFAULT_POST_LIMIT: usize = 20;
pub const MAX_POST_LIMIT: usize = 100;

// ─── Query types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Asc,
  #[default]
  Desc,
}

/// Restrict results to posts with an occurrence under `label`, optionally
/// within `[from, to]`.
#[derive(Debug, Clone)]
pub struct OccurrenceFilter {
  pub label: String,
  pub from:  Option<DateTime<Utc>>,
  pub to:    Option<DateTime<Utc>>,
}

/// Parameters for [`PostStore::query_posts`] and [`PostStore::count_posts`].
#[derive(Debug, Clone)]
pub struct PostQuery {
  /// Klass, path and oid constraints.
  pub scope:       Uid,
  /// All of these (normalised) tags must be present.
  pub tags:        Vec<String>,
  pub created_by:  Option<i64>,
  pub external_id: Option<String>,
  pub occurrence:  Option<OccurrenceFilter>,
  pub direction:   Direction,
  pub limit:       usize,
  pub offset:      usize,
}

impl PostQuery {
  pub fn new(scope: Uid) -> Self {
    Self {
      scope,
      tags: Vec::new(),
      created_by: None,
      external_id: None,
      occurrence: None,
      direction: Direction::default(),
      limit: DEFAULT_POST_LIMIT,
      offset: 0,
    }
  }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items:     Vec<T>,
  pub limit:     usize,
  pub offset:    usize,
  pub last_page: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a post store backend.
///
/// Every post write runs in one transaction: the row, its paths, tags and
/// occurrences, the version bump, the change record and readmark recounts
/// commit together or not at all.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PostStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Locations ─────────────────────────────────────────────────────────

  /// Find or create the location for `path`. A new location inherits the
  /// group grants of its ancestors.
  fn declare_location(
    &self,
    path: Path,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + '_;

  /// All declared locations matching `query`.
  fn locations(
    &self,
    query: PathQuery,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  fn declare_membership(
    &self,
    group_id: i64,
    identity_id: i64,
  ) -> impl Future<Output = Result<GroupMembership, Self::Error>> + Send + '_;

  /// Returns `false` if there was no such membership.
  fn remove_membership(
    &self,
    group_id: i64,
    identity_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Grant `group_id` access to `path` and every location below it,
  /// including ones declared later. Returns the number of new grants.
  fn allow_subtree(
    &self,
    group_id: i64,
    path: Path,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Remove every grant `group_id` holds at or below `path`.
  fn deny_subtree(
    &self,
    group_id: i64,
    path: Path,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn is_included(
    &self,
    group_id: i64,
    path: Path,
  ) -> impl Future<Output = Result<Inclusion, Self::Error>> + Send + '_;

  // ── Posts: writes ────────────────────────────────────────────────────

  /// Look up the row a write to `uid` would target, deleted rows included.
  fn find_target(
    &self,
    uid: Uid,
    external_id: Option<String>,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Create or update the post addressed by `uid` (or by
  /// `write.external_id`).
  fn upsert(
    &self,
    uid: Uid,
    write: PostWrite,
    identity: Identity,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  /// Apply a targeted mutation to the existing post addressed by `uid`.
  fn mutate(
    &self,
    uid: Uid,
    mutation: Mutation,
    identity: Identity,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  // ── Posts: reads ─────────────────────────────────────────────────────

  /// The single undeleted post addressed by `uid`, if `viewer` may see it.
  fn get_post(
    &self,
    uid: Uid,
    viewer: Option<Identity>,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Undeleted posts among `ids` that `viewer` may see, in no order.
  fn get_posts(
    &self,
    ids: Vec<i64>,
    viewer: Option<Identity>,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  fn query_posts(
    &self,
    query: PostQuery,
    viewer: Option<Identity>,
  ) -> impl Future<Output = Result<Page<Post>, Self::Error>> + Send + '_;

  fn count_posts(
    &self,
    query: PostQuery,
    viewer: Option<Identity>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Changes ───────────────────────────────────────────────────────────

  /// Changes in ascending id order.
  fn changes(
    &self,
    query: ChangeQuery,
    viewer: Identity,
  ) -> impl Future<Output = Result<Vec<Change>, Self::Error>> + Send + '_;

  // ── Readmarks ─────────────────────────────────────────────────────────

  fn set_readmark(
    &self,
    owner: Identity,
    path: Path,
    post_id: i64,
  ) -> impl Future<Output = Result<Readmark, Self::Error>> + Send + '_;

  fn readmarks(
    &self,
    owner: Identity,
    query: PathQuery,
  ) -> impl Future<Output = Result<Vec<Readmark>, Self::Error>> + Send + '_;
}
