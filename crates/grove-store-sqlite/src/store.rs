//! [`SqliteStore`]: the SQLite implementation of [`PostStore`].

use std::path::Path as FsPath;

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use grove_core::{
  change::{Change, ChangeQuery, Transition},
  group::{GroupMembership, Inclusion},
  identity::Identity,
  location::Location,
  path::{Path, PathQuery},
  post::{Mutation, Post, PostWrite},
  readmark::Readmark,
  store::{Page, PostQuery, PostStore},
  uid::Uid,
};

use crate::{
  Error, Result, changes,
  encode::storable,
  groups, locations, posts, readmarks,
  schema::SCHEMA,
  writes,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Grove post store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<FsPath>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection outside any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` in an immediate transaction, committed only if `f` succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate)
        {
          Ok(tx) => tx,
          Err(e) => return Ok(Err(Error::from(e))),
        };
        Ok(match f(&tx) {
          Ok(value) => tx.commit().map(|()| value).map_err(Error::from),
          Err(e) => Err(e),
        })
      })
      .await?
  }

  /// Execute raw SQL. Test-only escape hatch for exercising schema-level
  /// guards.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    self.read(move |conn| Ok(conn.execute(sql, [])?)).await
  }
}

// ─── PostStore impl ──────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  type Error = Error;

  // ── Locations ─────────────────────────────────────────────────────────────

  async fn declare_location(&self, path: Path) -> Result<Location> {
    self.write(move |tx| locations::declare(tx, &path)).await
  }

  async fn locations(&self, query: PathQuery) -> Result<Vec<Location>> {
    self.read(move |conn| locations::matching(conn, &query)).await
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn declare_membership(
    &self,
    group_id: i64,
    identity_id: i64,
  ) -> Result<GroupMembership> {
    self
      .write(move |tx| groups::declare_membership(tx, group_id, identity_id))
      .await
  }

  async fn remove_membership(&self, group_id: i64, identity_id: i64) -> Result<bool> {
    self
      .write(move |tx| groups::remove_membership(tx, group_id, identity_id))
      .await
  }

  async fn allow_subtree(&self, group_id: i64, path: Path) -> Result<usize> {
    self
      .write(move |tx| groups::allow_subtree(tx, group_id, &path))
      .await
  }

  async fn deny_subtree(&self, group_id: i64, path: Path) -> Result<usize> {
    self
      .write(move |tx| groups::deny_subtree(tx, group_id, &path))
      .await
  }

  async fn is_included(&self, group_id: i64, path: Path) -> Result<Inclusion> {
    self
      .read(move |conn| groups::is_included(conn, group_id, &path))
      .await
  }

  // ── Posts: writes ────────────────────────────────────────────────────────

  async fn find_target(
    &self,
    uid: Uid,
    external_id: Option<String>,
  ) -> Result<Option<Post>> {
    self
      .read(move |conn| writes::find_target(conn, &uid, external_id.as_deref()))
      .await
  }

  async fn upsert(
    &self,
    uid: Uid,
    write: PostWrite,
    identity: Identity,
  ) -> Result<Transition> {
    let now = storable(Utc::now());
    self
      .write(move |tx| writes::upsert(tx, &uid, write, &identity, now))
      .await
  }

  async fn mutate(
    &self,
    uid: Uid,
    mutation: Mutation,
    identity: Identity,
  ) -> Result<Transition> {
    let now = storable(Utc::now());
    self
      .write(move |tx| writes::mutate(tx, &uid, mutation, &identity, now))
      .await
  }

  // ── Posts: reads ─────────────────────────────────────────────────────────

  async fn get_post(&self, uid: Uid, viewer: Option<Identity>) -> Result<Option<Post>> {
    self
      .read(move |conn| posts::get(conn, &uid, viewer.as_ref()))
      .await
  }

  async fn get_posts(
    &self,
    ids: Vec<i64>,
    viewer: Option<Identity>,
  ) -> Result<Vec<Post>> {
    self
      .read(move |conn| posts::get_many(conn, &ids, viewer.as_ref()))
      .await
  }

  async fn query_posts(
    &self,
    query: PostQuery,
    viewer: Option<Identity>,
  ) -> Result<Page<Post>> {
    self
      .read(move |conn| posts::query(conn, &query, viewer.as_ref()))
      .await
  }

  async fn count_posts(&self, query: PostQuery, viewer: Option<Identity>) -> Result<u64> {
    self
      .read(move |conn| posts::count(conn, &query, viewer.as_ref()))
      .await
  }

  // ── Changes ───────────────────────────────────────────────────────────────

  async fn changes(&self, query: ChangeQuery, viewer: Identity) -> Result<Vec<Change>> {
    self
      .read(move |conn| changes::by_uid(conn, &query, &viewer))
      .await
  }

  // ── Readmarks ─────────────────────────────────────────────────────────────

  async fn set_readmark(
    &self,
    owner: Identity,
    path: Path,
    post_id: i64,
  ) -> Result<Readmark> {
    self
      .write(move |tx| readmarks::set(tx, &owner, &path, post_id))
      .await
  }

  async fn readmarks(&self, owner: Identity, query: PathQuery) -> Result<Vec<Readmark>> {
    self
      .read(move |conn| readmarks::owned(conn, &owner, &query))
      .await
  }
}
