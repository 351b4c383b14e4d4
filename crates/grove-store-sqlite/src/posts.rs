//! Post reads: hydration, single and multi fetch, paged queries.

use std::collections::BTreeMap;

use grove_core::{
  identity::Identity,
  path::Path,
  post::{Occurrences, Post, normalize_tags},
  store::{Direction, MAX_POST_LIMIT, Page, PostQuery},
  uid::Uid,
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use rusqlite::types::Value;

use crate::{
  Result,
  encode::{POST_COLUMNS, RawPost, decode_dt, decode_path, encode_dt},
  predicate::Filter,
};

// ─── Hydration ───────────────────────────────────────────────────────────────

fn paths_of(conn: &Connection, post_id: i64) -> Result<Vec<Path>> {
  let mut stmt = conn.prepare_cached(
    "SELECT l.path FROM posts_locations pl
     JOIN locations l ON l.id = pl.location_id
     WHERE pl.post_id = ?1",
  )?;
  let raw = stmt
    .query_map(params![post_id], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let mut paths = raw
    .iter()
    .map(|p| decode_path(p))
    .collect::<Result<Vec<_>>>()?;
  paths.sort();
  Ok(paths)
}

fn tags_of(conn: &Connection, post_id: i64) -> Result<Vec<String>> {
  let mut stmt = conn
    .prepare_cached("SELECT tag FROM post_tags WHERE post_id = ?1 ORDER BY tag")?;
  let tags = stmt
    .query_map(params![post_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(tags)
}

fn occurrences_of(conn: &Connection, post_id: i64) -> Result<Occurrences> {
  let mut stmt = conn.prepare_cached(
    "SELECT label, at FROM occurrences WHERE post_id = ?1 ORDER BY label, at",
  )?;
  let rows = stmt
    .query_map(params![post_id], |r| {
      Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut out: Occurrences = BTreeMap::new();
  for (label, at) in rows {
    out.entry(label).or_default().push(decode_dt(&at)?);
  }
  Ok(out)
}

fn hydrate(conn: &Connection, raw: RawPost) -> Result<Post> {
  let id = raw.id;
  raw.into_post(paths_of(conn, id)?, tags_of(conn, id)?, occurrences_of(conn, id)?)
}

/// Load a post by id regardless of visibility or deletion.
pub fn load(conn: &Connection, id: i64) -> Result<Option<Post>> {
  let raw = conn
    .query_row(
      &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
      params![id],
      RawPost::from_row,
    )
    .optional()?;
  raw.map(|raw| hydrate(conn, raw)).transpose()
}

/// `tail` follows the `WHERE` clause; `tail_params` bind its placeholders.
fn select(
  conn: &Connection,
  filter: Filter,
  tail: &str,
  tail_params: impl IntoIterator<Item = Value>,
) -> Result<Vec<Post>> {
  let (cond, mut params) = filter.into_parts();
  params.extend(tail_params);
  let mut stmt =
    conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts p WHERE {cond} {tail}"))?;
  let raws = stmt
    .query_map(params_from_iter(params.iter()), RawPost::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(|raw| hydrate(conn, raw)).collect()
}

// ─── Reads ───────────────────────────────────────────────────────────────────

fn scope_filter(filter: &mut Filter, uid: &Uid) {
  filter.klass("p.klass", &uid.klass);
  filter.post_paths(&uid.path);
  if let Some(oid) = uid.oid {
    filter.push_with("p.id = ?", [Value::Integer(oid)]);
  }
}

pub fn get(conn: &Connection, uid: &Uid, viewer: Option<&Identity>) -> Result<Option<Post>> {
  if uid.oid.is_none() {
    return Ok(None);
  }
  let mut filter = Filter::new();
  scope_filter(&mut filter, uid);
  filter.visible_to(viewer, false);
  Ok(select(conn, filter, "LIMIT 1", [])?.into_iter().next())
}

pub fn get_many(
  conn: &Connection,
  ids: &[i64],
  viewer: Option<&Identity>,
) -> Result<Vec<Post>> {
  if ids.is_empty() {
    return Ok(Vec::new());
  }
  let mut filter = Filter::new();
  let marks = vec!["?"; ids.len()].join(", ");
  filter.push_with(
    format!("p.id IN ({marks})"),
    ids.iter().copied().map(Value::Integer),
  );
  filter.visible_to(viewer, false);
  select(conn, filter, "", [])
}

fn query_filter(query: &PostQuery, viewer: Option<&Identity>) -> Filter {
  let mut filter = Filter::new();
  scope_filter(&mut filter, &query.scope);
  for tag in normalize_tags(&query.tags) {
    filter.push_with(
      "EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag = ?)",
      [Value::Text(tag)],
    );
  }
  if let Some(created_by) = query.created_by {
    filter.push_with("p.created_by = ?", [Value::Integer(created_by)]);
  }
  if let Some(external_id) = &query.external_id {
    filter.push_with("p.external_id = ?", [Value::Text(external_id.clone())]);
  }
  if let Some(occ) = &query.occurrence {
    let mut cond = "o.post_id = p.id AND o.label = ?".to_owned();
    let mut params = vec![Value::Text(occ.label.clone())];
    if let Some(from) = occ.from {
      cond.push_str(" AND o.at >= ?");
      params.push(Value::Text(encode_dt(from)));
    }
    if let Some(to) = occ.to {
      cond.push_str(" AND o.at <= ?");
      params.push(Value::Text(encode_dt(to)));
    }
    filter.push_with(
      format!("EXISTS (SELECT 1 FROM occurrences o WHERE {cond})"),
      params,
    );
  }
  filter.visible_to(viewer, false);
  filter
}

pub fn query(
  conn: &Connection,
  query: &PostQuery,
  viewer: Option<&Identity>,
) -> Result<Page<Post>> {
  let limit = query.limit.clamp(1, MAX_POST_LIMIT);
  let order = match query.direction {
    Direction::Asc => "ASC",
    Direction::Desc => "DESC",
  };
  // One extra row tells whether another page follows.
  let tail = format!("ORDER BY p.id {order} LIMIT ? OFFSET ?");
  // Offsets past the largest SQLite integer read nothing anyway.
  let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
  let bounds = [Value::Integer(limit as i64 + 1), Value::Integer(offset)];
  let mut items = select(conn, query_filter(query, viewer), &tail, bounds)?;
  let last_page = items.len() <= limit;
  items.truncate(limit);
  Ok(Page { items, limit, offset: query.offset, last_page })
}

pub fn count(conn: &Connection, query: &PostQuery, viewer: Option<&Identity>) -> Result<u64> {
  let (cond, params) = query_filter(query, viewer).into_parts();
  let n: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM posts p WHERE {cond}"),
    params_from_iter(params.iter()),
    |r| r.get(0),
  )?;
  Ok(n.unsigned_abs())
}
