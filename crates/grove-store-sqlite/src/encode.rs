//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond
//! precision, so lexical order equals chronological order. Documents are
//! stored as compact JSON.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use grove_core::{
  change::{Change, ChangeKind},
  location::Location,
  path::{MAX_LABELS, Path},
  post::{Occurrences, Post},
  readmark::Readmark,
  uid::Uid,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Drop precision the column cannot hold, so values compare equal after a
/// round trip.
pub fn storable(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

// ─── Path ────────────────────────────────────────────────────────────────────

pub fn decode_path(s: &str) -> Result<Path> {
  Path::parse(s).map_err(|e| Error::Corrupt(e.to_string()))
}

/// The ten positional label columns for `path`, trailing positions `None`.
pub fn encode_labels(path: &Path) -> [Option<String>; MAX_LABELS] {
  let mut labels: [Option<String>; MAX_LABELS] = Default::default();
  for (slot, label) in labels.iter_mut().zip(path.labels()) {
    *slot = Some(label.clone());
  }
  labels
}

// ─── ChangeKind ──────────────────────────────────────────────────────────────

pub fn decode_change_kind(s: &str) -> Result<ChangeKind> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("unknown change kind: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Plain-text columns of one `posts` row.
pub struct RawPost {
  pub id:             i64,
  pub klass:          String,
  pub realm:          String,
  pub canonical_path: String,
  pub document:       String,
  pub external_id:    Option<String>,
  pub created_by:     i64,
  pub restricted:     bool,
  pub deleted:        bool,
  pub version:        i64,
  pub created_at:     String,
  pub updated_at:     String,
}

/// Column list matching [`RawPost::from_row`]; expects the table alias `p`.
pub const POST_COLUMNS: &str = "p.id, p.klass, p.realm, p.canonical_path, \
  p.document, p.external_id, p.created_by, p.restricted, p.deleted, \
  p.version, p.created_at, p.updated_at";

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      klass:          row.get(1)?,
      realm:          row.get(2)?,
      canonical_path: row.get(3)?,
      document:       row.get(4)?,
      external_id:    row.get(5)?,
      created_by:     row.get(6)?,
      restricted:     row.get(7)?,
      deleted:        row.get(8)?,
      version:        row.get(9)?,
      created_at:     row.get(10)?,
      updated_at:     row.get(11)?,
    })
  }

  /// Assemble the domain value from this row and its association rows.
  pub fn into_post(
    self,
    paths: Vec<Path>,
    tags: Vec<String>,
    occurrences: Occurrences,
  ) -> Result<Post> {
    Ok(Post {
      id: self.id,
      klass: self.klass,
      realm: self.realm,
      canonical_path: decode_path(&self.canonical_path)?,
      paths,
      document: serde_json::from_str(&self.document)?,
      tags,
      occurrences,
      external_id: self.external_id,
      created_by: self.created_by,
      restricted: self.restricted,
      deleted: self.deleted,
      version: self.version,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawLocation {
  pub id:   i64,
  pub path: String,
}

impl RawLocation {
  pub fn into_location(self) -> Result<Location> {
    Ok(Location { id: self.id, path: decode_path(&self.path)? })
  }
}

pub struct RawChange {
  pub id:             i64,
  pub kind:           String,
  pub post_id:        i64,
  pub klass:          String,
  pub canonical_path: String,
  pub time:           String,
}

impl RawChange {
  pub fn into_change(self) -> Result<Change> {
    let path = decode_path(&self.canonical_path)?;
    Ok(Change {
      id:       self.id,
      kind:     decode_change_kind(&self.kind)?,
      post_id:  self.post_id,
      post_uid: Uid::new(&self.klass, &path, Some(self.post_id)).to_string(),
      time:     decode_dt(&self.time)?,
    })
  }
}

pub struct RawReadmark {
  pub id:           i64,
  pub owner:        i64,
  pub path:         String,
  pub post_id:      i64,
  pub unread_count: i64,
}

pub const READMARK_COLUMNS: &str =
  "r.id, r.owner, l.path, r.post_id, r.unread_count";

impl RawReadmark {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      owner:        row.get(1)?,
      path:         row.get(2)?,
      post_id:      row.get(3)?,
      unread_count: row.get(4)?,
    })
  }

  pub fn into_readmark(self) -> Result<Readmark> {
    Ok(Readmark {
      id:           self.id,
      owner:        self.owner,
      path:         decode_path(&self.path)?,
      post_id:      self.post_id,
      unread_count: self.unread_count,
    })
  }
}
