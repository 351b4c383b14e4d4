//! Location find-or-create and lookup.

use grove_core::{
  location::Location,
  path::{Path, PathQuery},
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use rusqlite::types::Value;
use tracing::debug;

use crate::{
  Result,
  encode::{RawLocation, encode_labels},
  predicate::Filter,
};

/// Find or create the location for `path`.
///
/// The `path` uniqueness constraint decides races: a losing insert is a
/// no-op and the winner's row is read back. A row this call did create
/// inherits its ancestors' group grants.
pub fn declare(conn: &Connection, path: &Path) -> Result<Location> {
  let text = path.to_string();
  let [l0, l1, l2, l3, l4, l5, l6, l7, l8, l9] = encode_labels(path);
  let inserted = conn.execute(
    "INSERT INTO locations (
       path, label_0, label_1, label_2, label_3, label_4,
       label_5, label_6, label_7, label_8, label_9
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
     ON CONFLICT(path) DO NOTHING",
    params![text, l0, l1, l2, l3, l4, l5, l6, l7, l8, l9],
  )?;

  let id: i64 = conn.query_row(
    "SELECT id FROM locations WHERE path = ?1",
    params![text],
    |r| r.get(0),
  )?;

  if inserted > 0 {
    let extended = extend_from_ancestors(conn, id, path)?;
    debug!(%path, id, extended, "declared location");
  }
  Ok(Location { id, path: path.clone() })
}

/// Grant the new location `id` to every group granted on one of its
/// ancestors. Returns the number of grants added.
fn extend_from_ancestors(conn: &Connection, id: i64, path: &Path) -> Result<usize> {
  let ancestors = path.ancestors();
  if ancestors.is_empty() {
    return Ok(0);
  }
  let marks = vec!["?"; ancestors.len()].join(", ");
  let mut params = vec![Value::Integer(id)];
  params.extend(ancestors.iter().map(|a| Value::Text(a.to_string())));
  let added = conn.execute(
    &format!(
      "INSERT OR IGNORE INTO group_locations (group_id, location_id)
       SELECT DISTINCT gl.group_id, ?
       FROM group_locations gl
       JOIN locations l ON l.id = gl.location_id
       WHERE l.path IN ({marks})"
    ),
    params_from_iter(params.iter()),
  )?;
  Ok(added)
}

/// The location for exactly `path`, if one was ever declared.
pub fn find(conn: &Connection, path: &Path) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM locations WHERE path = ?1",
        params![path.to_string()],
        |r| r.get(0),
      )
      .optional()?,
  )
}

pub fn matching(conn: &Connection, query: &PathQuery) -> Result<Vec<Location>> {
  let mut filter = Filter::new();
  filter.location("l", query);
  let (cond, params) = filter.into_parts();

  let mut stmt = conn.prepare(&format!(
    "SELECT l.id, l.path FROM locations l WHERE {cond} ORDER BY l.path"
  ))?;
  let raws = stmt
    .query_map(params_from_iter(params.iter()), |r| {
      Ok(RawLocation { id: r.get(0)?, path: r.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawLocation::into_location).collect()
}
