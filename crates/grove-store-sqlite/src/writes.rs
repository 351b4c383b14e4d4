//! Transactional post writes.
//!
//! Every function here runs inside the caller's transaction. A write first
//! applies its row and association changes, then [`finish`] compares the
//! result with the prior state: a real change bumps the version, appends one
//! change record and recounts affected readmarks; a no-op leaves no trace.

use chrono::{DateTime, Utc};
use grove_core::{
  change::{ChangeKind, Transition},
  identity::Identity,
  path::Path,
  post::{Mutation, OccurrenceOp, Post, PostWrite, WriteMode, normalize_tags},
  uid::Uid,
  version::{DocumentUpdate, check_version, plan_document},
};
use rusqlite::{Connection, OptionalExtension as _, params};
use serde_json::json;

use crate::{
  Error, Result, changes,
  encode::{encode_dt, storable},
  locations, posts, readmarks,
};

type CoreError = grove_core::Error;

// ─── Associations ────────────────────────────────────────────────────────────

fn attach(conn: &Connection, post_id: i64, path: &Path) -> Result<()> {
  let location = locations::declare(conn, path)?;
  conn.execute(
    "INSERT OR IGNORE INTO posts_locations (post_id, location_id) VALUES (?1, ?2)",
    params![post_id, location.id],
  )?;
  Ok(())
}

fn detach(conn: &Connection, post_id: i64, path: &Path) -> Result<()> {
  conn.execute(
    "DELETE FROM posts_locations
     WHERE post_id = ?1
       AND location_id = (SELECT id FROM locations WHERE path = ?2)",
    params![post_id, path.to_string()],
  )?;
  Ok(())
}

fn add_tags(conn: &Connection, post_id: i64, tags: &[String]) -> Result<()> {
  let mut stmt = conn
    .prepare_cached("INSERT OR IGNORE INTO post_tags (post_id, tag) VALUES (?1, ?2)")?;
  for tag in tags {
    stmt.execute(params![post_id, tag])?;
  }
  Ok(())
}

fn remove_tags(conn: &Connection, post_id: i64, tags: &[String]) -> Result<()> {
  let mut stmt =
    conn.prepare_cached("DELETE FROM post_tags WHERE post_id = ?1 AND tag = ?2")?;
  for tag in tags {
    stmt.execute(params![post_id, tag])?;
  }
  Ok(())
}

fn replace_tags(conn: &Connection, post_id: i64, tags: &[String]) -> Result<()> {
  conn.execute("DELETE FROM post_tags WHERE post_id = ?1", params![post_id])?;
  add_tags(conn, post_id, tags)
}

fn replace_occurrences(
  conn: &Connection,
  post_id: i64,
  label: &str,
  at: &[DateTime<Utc>],
) -> Result<()> {
  conn.execute(
    "DELETE FROM occurrences WHERE post_id = ?1 AND label = ?2",
    params![post_id, label],
  )?;
  let mut stmt = conn.prepare_cached(
    "INSERT OR IGNORE INTO occurrences (post_id, label, at) VALUES (?1, ?2, ?3)",
  )?;
  for t in at {
    stmt.execute(params![post_id, label, encode_dt(*t)])?;
  }
  Ok(())
}

fn storable_all(at: Vec<DateTime<Utc>>) -> Vec<DateTime<Utc>> {
  at.into_iter().map(storable).collect()
}

fn storable_op(op: OccurrenceOp) -> OccurrenceOp {
  match op {
    OccurrenceOp::Append(at) => OccurrenceOp::Append(storable_all(at)),
    OccurrenceOp::Replace(at) => OccurrenceOp::Replace(storable_all(at)),
    OccurrenceOp::Remove(at) => OccurrenceOp::Remove(storable_all(at)),
  }
}

/// Secondary paths stay inside the post's realm.
fn check_realm(post_realm: &str, path: &Path) -> Result<()> {
  if path.realm() != post_realm {
    return Err(
      CoreError::Forbidden(format!("path {path} is outside realm {post_realm}"))
        .into(),
    );
  }
  Ok(())
}

fn sync_secondary_paths(conn: &Connection, before: &Post, wanted: &[Path]) -> Result<()> {
  for path in wanted {
    check_realm(&before.realm, path)?;
  }
  for path in &before.paths {
    if *path != before.canonical_path && !wanted.contains(path) {
      detach(conn, before.id, path)?;
    }
  }
  for path in wanted {
    if !before.paths.contains(path) {
      attach(conn, before.id, path)?;
    }
  }
  Ok(())
}

fn ensure_external_id_free(
  conn: &Connection,
  realm: &str,
  external_id: &str,
  post_id: i64,
) -> Result<()> {
  let taken: Option<i64> = conn
    .query_row(
      "SELECT id FROM posts WHERE realm = ?1 AND external_id = ?2 AND id != ?3",
      params![realm, external_id, post_id],
      |r| r.get(0),
    )
    .optional()?;
  match taken {
    Some(other) => Err(
      CoreError::Conflict(format!(
        "external id {external_id:?} already belongs to post {other}"
      ))
      .into(),
    ),
    None => Ok(()),
  }
}

fn load_required(conn: &Connection, id: i64) -> Result<Post> {
  posts::load(conn, id)?
    .ok_or_else(|| Error::Corrupt(format!("post {id} vanished mid-transaction")))
}

// ─── Targeting ───────────────────────────────────────────────────────────────

/// The stored post a write to `uid` addresses, deleted or not.
///
/// With an oid the post must carry the UID's klass and be attached to its
/// path. Without one, an `external_id` is looked up within the path's realm;
/// finding it at a different canonical path is a conflict.
pub fn find_target(
  conn: &Connection,
  uid: &Uid,
  external_id: Option<&str>,
) -> Result<Option<Post>> {
  let klass = uid.exact_klass()?;
  let path = uid.exact_path()?;

  if let Some(oid) = uid.oid {
    return Ok(
      posts::load(conn, oid)?
        .filter(|post| post.klass == klass && post.paths.contains(&path)),
    );
  }

  let Some(external_id) = external_id else {
    return Ok(None);
  };
  let id: Option<i64> = conn
    .query_row(
      "SELECT id FROM posts WHERE realm = ?1 AND external_id = ?2",
      params![path.realm(), external_id],
      |r| r.get(0),
    )
    .optional()?;
  let Some(id) = id else {
    return Ok(None);
  };
  let post = load_required(conn, id)?;
  if post.canonical_path != path {
    return Err(
      CoreError::Conflict(format!(
        "external id {external_id:?} already exists at {}",
        post.uid()
      ))
      .into(),
    );
  }
  Ok(Some(post))
}

// ─── Finish ──────────────────────────────────────────────────────────────────

/// Version bump, change record and readmark recount for a write whose row
/// changes have been applied.
fn finish(conn: &Connection, before: Post, now: DateTime<Utc>) -> Result<Transition> {
  let after = load_required(conn, before.id)?;
  let Some(kind) = ChangeKind::classify(Some(&before), &after) else {
    return Ok(Transition { before: Some(before), after, change: None });
  };

  conn.execute(
    "UPDATE posts SET version = version + 1, updated_at = ?1 WHERE id = ?2",
    params![encode_dt(now), before.id],
  )?;
  let after = load_required(conn, before.id)?;
  let change = changes::append(conn, kind, &after, now)?;

  if before.paths != after.paths || before.deleted != after.deleted {
    let mut touched = before.paths.clone();
    touched.extend(after.paths.iter().cloned());
    readmarks::recount_covering(conn, &touched)?;
  }

  Ok(Transition { before: Some(before), after, change: Some(change) })
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

pub fn upsert(
  conn: &Connection,
  uid: &Uid,
  write: PostWrite,
  identity: &Identity,
  now: DateTime<Utc>,
) -> Result<Transition> {
  match find_target(conn, uid, write.external_id.as_deref())? {
    Some(before) if write.mode == WriteMode::CreateOnly => Err(
      CoreError::Conflict(format!("{} already exists", before.uid())).into(),
    ),
    Some(before) => update(conn, before, write, identity, now),
    None if uid.oid.is_some() || write.mode == WriteMode::UpdateOnly => {
      Err(CoreError::NotFound(uid.to_string()).into())
    }
    None if write.version.is_some() => Err(
      CoreError::Forbidden("a version cannot be supplied on create".to_owned())
        .into(),
    ),
    None => create(conn, uid, write, identity, now),
  }
}

fn create(
  conn: &Connection,
  uid: &Uid,
  write: PostWrite,
  identity: &Identity,
  now: DateTime<Utc>,
) -> Result<Transition> {
  let klass = uid.exact_klass()?;
  let path = uid.exact_path()?;
  let realm = path.realm().to_owned();
  let secondary = write.paths.unwrap_or_default();
  for p in &secondary {
    check_realm(&realm, p)?;
  }

  let document = write.document.unwrap_or_else(|| json!({}));
  let created_at = encode_dt(now);
  conn.execute(
    "INSERT INTO posts (
       klass, realm, canonical_path, document, external_id,
       created_by, restricted, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
    params![
      klass,
      realm,
      path.to_string(),
      document.to_string(),
      write.external_id,
      identity.id,
      write.restricted.unwrap_or(false),
      created_at,
    ],
  )?;
  let id = conn.last_insert_rowid();

  attach(conn, id, &path)?;
  for p in &secondary {
    attach(conn, id, p)?;
  }
  if let Some(tags) = write.tags {
    add_tags(conn, id, &normalize_tags(tags))?;
  }
  for (label, at) in write.occurrences.unwrap_or_default() {
    let at = OccurrenceOp::Replace(storable_all(at)).apply(&[]);
    replace_occurrences(conn, id, &label, &at)?;
  }

  let after = load_required(conn, id)?;
  let change = changes::append(conn, ChangeKind::Create, &after, now)?;
  readmarks::recount_covering(conn, &after.paths)?;
  Ok(Transition { before: None, after, change: Some(change) })
}

fn update(
  conn: &Connection,
  before: Post,
  write: PostWrite,
  identity: &Identity,
  now: DateTime<Utc>,
) -> Result<Transition> {
  identity.authorize_update(&before)?;
  check_version(write.version, before.version, write.merge)?;
  let id = before.id;

  if let Some(incoming) = &write.document {
    if let DocumentUpdate::Replace(next) =
      plan_document(&before.document, incoming, write.merge)
    {
      conn.execute(
        "UPDATE posts SET document = ?1 WHERE id = ?2",
        params![next.to_string(), id],
      )?;
    }
  }
  if let Some(restricted) = write.restricted {
    if restricted != before.restricted {
      conn.execute(
        "UPDATE posts SET restricted = ?1 WHERE id = ?2",
        params![restricted, id],
      )?;
    }
  }
  if let Some(external_id) = &write.external_id {
    if before.external_id.as_ref() != Some(external_id) {
      ensure_external_id_free(conn, &before.realm, external_id, id)?;
      conn.execute(
        "UPDATE posts SET external_id = ?1 WHERE id = ?2",
        params![external_id, id],
      )?;
    }
  }
  if let Some(tags) = write.tags {
    replace_tags(conn, id, &normalize_tags(tags))?;
  }
  if let Some(paths) = &write.paths {
    sync_secondary_paths(conn, &before, paths)?;
  }
  for (label, at) in write.occurrences.unwrap_or_default() {
    let at = OccurrenceOp::Replace(storable_all(at)).apply(&[]);
    replace_occurrences(conn, id, &label, &at)?;
  }

  finish(conn, before, now)
}

// ─── Mutations ───────────────────────────────────────────────────────────────

pub fn mutate(
  conn: &Connection,
  uid: &Uid,
  mutation: Mutation,
  identity: &Identity,
  now: DateTime<Utc>,
) -> Result<Transition> {
  if uid.oid.is_none() {
    return Err(
      CoreError::MalformedUid {
        uid:    uid.to_string(),
        reason: "an oid is required".to_owned(),
      }
      .into(),
    );
  }
  let Some(before) = find_target(conn, uid, None)? else {
    return Err(CoreError::NotFound(uid.to_string()).into());
  };
  let id = before.id;

  match mutation {
    Mutation::Delete => {
      identity.authorize_update(&before)?;
      conn.execute("UPDATE posts SET deleted = 1 WHERE id = ?1", params![id])?;
    }
    Mutation::Undelete => {
      identity.authorize_undelete(&before)?;
      conn.execute("UPDATE posts SET deleted = 0 WHERE id = ?1", params![id])?;
    }
    Mutation::Touch => {
      identity.authorize_update(&before)?;
      conn.execute(
        "UPDATE posts SET updated_at = ?1 WHERE id = ?2",
        params![encode_dt(now), id],
      )?;
      let after = load_required(conn, id)?;
      return Ok(Transition { before: Some(before), after, change: None });
    }
    Mutation::AttachPath(path) => {
      identity.authorize_update(&before)?;
      check_realm(&before.realm, &path)?;
      attach(conn, id, &path)?;
    }
    Mutation::DetachPath(path) => {
      identity.authorize_update(&before)?;
      if path == before.canonical_path {
        return Err(
          CoreError::Forbidden(format!(
            "{path} is the canonical path of {}",
            before.uid()
          ))
          .into(),
        );
      }
      detach(conn, id, &path)?;
    }
    Mutation::AddTags(tags) => {
      identity.authorize_update(&before)?;
      add_tags(conn, id, &normalize_tags(tags))?;
    }
    Mutation::RemoveTags(tags) => {
      identity.authorize_update(&before)?;
      remove_tags(conn, id, &normalize_tags(tags))?;
    }
    Mutation::Occurrences { label, op } => {
      identity.authorize_update(&before)?;
      let current = before.occurrences.get(&label).cloned().unwrap_or_default();
      let next = storable_op(op).apply(&current);
      if next != current {
        replace_occurrences(conn, id, &label, &next)?;
      }
    }
  }

  finish(conn, before, now)
}
