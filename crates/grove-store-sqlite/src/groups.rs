//! Group memberships and group-to-location grants.

use grove_core::{
  group::{GroupMembership, Inclusion},
  path::Path,
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use rusqlite::types::Value;

use crate::{Result, locations, predicate::Filter};

pub fn declare_membership(
  conn: &Connection,
  group_id: i64,
  identity_id: i64,
) -> Result<GroupMembership> {
  conn.execute(
    "INSERT INTO group_memberships (group_id, identity_id) VALUES (?1, ?2)
     ON CONFLICT(group_id, identity_id) DO NOTHING",
    params![group_id, identity_id],
  )?;
  Ok(GroupMembership { group_id, identity_id })
}

pub fn remove_membership(
  conn: &Connection,
  group_id: i64,
  identity_id: i64,
) -> Result<bool> {
  let removed = conn.execute(
    "DELETE FROM group_memberships WHERE group_id = ?1 AND identity_id = ?2",
    params![group_id, identity_id],
  )?;
  Ok(removed > 0)
}

/// Grant `group_id` on `path` and every location already declared below it.
/// Locations declared later pick the grant up through
/// [`locations::declare`].
pub fn allow_subtree(conn: &Connection, group_id: i64, path: &Path) -> Result<usize> {
  locations::declare(conn, path)?;

  let mut filter = Filter::new();
  filter.location("l", &path.subtree());
  let (cond, scope) = filter.into_parts();
  let mut params = vec![Value::Integer(group_id)];
  params.extend(scope);

  let added = conn.execute(
    &format!(
      "INSERT OR IGNORE INTO group_locations (group_id, location_id)
       SELECT ?, l.id FROM locations l WHERE {cond}"
    ),
    params_from_iter(params.iter()),
  )?;
  Ok(added)
}

pub fn deny_subtree(conn: &Connection, group_id: i64, path: &Path) -> Result<usize> {
  let mut filter = Filter::new();
  filter.location("l", &path.subtree());
  let (cond, scope) = filter.into_parts();
  let mut params = vec![Value::Integer(group_id)];
  params.extend(scope);

  let removed = conn.execute(
    &format!(
      "DELETE FROM group_locations
       WHERE group_id = ?
         AND location_id IN (SELECT l.id FROM locations l WHERE {cond})"
    ),
    params_from_iter(params.iter()),
  )?;
  Ok(removed)
}

pub fn is_included(conn: &Connection, group_id: i64, path: &Path) -> Result<Inclusion> {
  let Some(location_id) = locations::find(conn, path)? else {
    return Ok(Inclusion::Unknown);
  };
  let granted = conn
    .query_row(
      "SELECT 1 FROM group_locations WHERE group_id = ?1 AND location_id = ?2",
      params![group_id, location_id],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  Ok(if granted { Inclusion::Granted } else { Inclusion::Denied })
}
