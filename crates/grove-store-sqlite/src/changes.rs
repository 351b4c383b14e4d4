//! The append-only change log.

use chrono::{DateTime, Utc};
use grove_core::{
  change::{Change, ChangeKind, ChangeQuery},
  identity::Identity,
  post::Post,
};
use rusqlite::{Connection, params, params_from_iter};
use rusqlite::types::Value;

use crate::{
  Result,
  encode::{RawChange, encode_dt},
  predicate::Filter,
};

/// Append the change for a transition of `post`. Never updates a row.
pub fn append(
  conn: &Connection,
  kind: ChangeKind,
  post: &Post,
  time: DateTime<Utc>,
) -> Result<Change> {
  conn.execute(
    "INSERT INTO changes (kind, post_id, time) VALUES (?1, ?2, ?3)",
    params![kind.to_string(), post.id, encode_dt(time)],
  )?;
  Ok(Change {
    id: conn.last_insert_rowid(),
    kind,
    post_id: post.id,
    post_uid: post.uid().to_string(),
    time,
  })
}

/// Changes matching `query` on posts `viewer` may see, ascending by id.
/// Deleted posts keep their history.
pub fn by_uid(
  conn: &Connection,
  query: &ChangeQuery,
  viewer: &Identity,
) -> Result<Vec<Change>> {
  let mut filter = Filter::new();
  filter.klass("p.klass", &query.scope.klass);
  filter.post_paths(&query.scope.path);
  if let Some(oid) = query.scope.oid {
    filter.push_with("p.id = ?", [Value::Integer(oid)]);
  }
  if let Some(since) = query.since {
    filter.push_with("c.id > ?", [Value::Integer(since)]);
  }
  filter.visible_to(Some(viewer), true);
  let (cond, params) = filter.into_parts();

  let mut stmt = conn.prepare(&format!(
    "SELECT c.id, c.kind, c.post_id, p.klass, p.canonical_path, c.time
     FROM changes c
     JOIN posts p ON p.id = c.post_id
     WHERE {cond}
     ORDER BY c.id ASC
     LIMIT {}",
    query.limit()
  ))?;
  let raws = stmt
    .query_map(params_from_iter(params.iter()), |r| {
      Ok(RawChange {
        id:             r.get(0)?,
        kind:           r.get(1)?,
        post_id:        r.get(2)?,
        klass:          r.get(3)?,
        canonical_path: r.get(4)?,
        time:           r.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawChange::into_change).collect()
}
