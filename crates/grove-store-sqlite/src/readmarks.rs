//! Reading cursors and their denormalised unread counts.

use grove_core::{
  identity::Identity,
  path::{Path, PathQuery},
  readmark::Readmark,
};
use rusqlite::{Connection, params, params_from_iter};
use rusqlite::types::Value;

use crate::{
  Error, Result,
  encode::{READMARK_COLUMNS, RawReadmark},
  locations,
  predicate::Filter,
};

fn list(conn: &Connection, filter: Filter) -> Result<Vec<Readmark>> {
  let (cond, params) = filter.into_parts();
  let mut stmt = conn.prepare(&format!(
    "SELECT {READMARK_COLUMNS} FROM readmarks r
     JOIN locations l ON l.id = r.location_id
     WHERE {cond}
     ORDER BY l.path"
  ))?;
  let raws = stmt
    .query_map(params_from_iter(params.iter()), RawReadmark::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawReadmark::into_readmark).collect()
}

/// Recompute one readmark: undeleted posts under its path newer than its
/// cursor.
fn recount_one(conn: &Connection, id: i64, path: &Path, cursor: i64) -> Result<()> {
  let mut filter = Filter::new();
  filter.push("p.deleted = 0");
  filter.push_with("p.id > ?", [Value::Integer(cursor)]);
  filter.post_paths(&path.subtree());
  let (cond, params) = filter.into_parts();

  let unread: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM posts p WHERE {cond}"),
    params_from_iter(params.iter()),
    |r| r.get(0),
  )?;
  conn.execute(
    "UPDATE readmarks SET unread_count = ?1 WHERE id = ?2",
    params![unread, id],
  )?;
  Ok(())
}

/// Recount every readmark at one of `paths` or an ancestor of one.
pub fn recount_covering(conn: &Connection, paths: &[Path]) -> Result<()> {
  let mut seen = Vec::new();
  for path in paths {
    let mut filter = Filter::new();
    filter.location("l", &path.covering());
    for mark in list(conn, filter)? {
      if seen.contains(&mark.id) {
        continue;
      }
      seen.push(mark.id);
      recount_one(conn, mark.id, &mark.path, mark.post_id)?;
    }
  }
  Ok(())
}

/// Set `owner`'s cursor at `path` to `post_id`, creating the readmark if
/// needed, and recount it.
pub fn set(conn: &Connection, owner: &Identity, path: &Path, post_id: i64) -> Result<Readmark> {
  let location = locations::declare(conn, path)?;
  conn.execute(
    "INSERT INTO readmarks (location_id, owner, post_id) VALUES (?1, ?2, ?3)
     ON CONFLICT(location_id, owner) DO UPDATE SET post_id = excluded.post_id",
    params![location.id, owner.id, post_id],
  )?;
  let id: i64 = conn.query_row(
    "SELECT id FROM readmarks WHERE location_id = ?1 AND owner = ?2",
    params![location.id, owner.id],
    |r| r.get(0),
  )?;
  recount_one(conn, id, path, post_id)?;

  let mut filter = Filter::new();
  filter.push_with("r.id = ?", [Value::Integer(id)]);
  list(conn, filter)?
    .into_iter()
    .next()
    .ok_or_else(|| Error::Corrupt(format!("readmark {id} vanished")))
}

pub fn owned(conn: &Connection, owner: &Identity, query: &PathQuery) -> Result<Vec<Readmark>> {
  let mut filter = Filter::new();
  filter.push_with("r.owner = ?", [Value::Integer(owner.id)]);
  filter.location("l", query);
  list(conn, filter)
}
