//! UID grammar: `klass:path$oid`.
//!
//! - `klass` is one or more dotted labels (`post`, `post.comment`); an empty
//!   klass means `post`. In query contexts it may be `*` or a `|`-separated
//!   alternation.
//! - `path` is a [`PathQuery`].
//! - `oid` is a positive row id; `*`, an empty string, or no `$` at all
//!   leave it unconstrained.
//!
//! A UID without an oid denotes a query scope, not a single post.

use std::{fmt, str::FromStr};

use crate::{
  Error, Result,
  path::{Path, PathQuery},
};

pub const DEFAULT_KLASS: &str = "post";

// ─── Klass ───────────────────────────────────────────────────────────────────

/// The klass part of a UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KlassQuery {
  Any,
  OneOf(Vec<String>),
}

impl KlassQuery {
  pub fn parse(s: &str) -> Result<Self> {
    if s.is_empty() {
      return Ok(Self::OneOf(vec![DEFAULT_KLASS.to_owned()]));
    }
    if s == "*" {
      return Ok(Self::Any);
    }
    let mut klasses = Vec::new();
    for klass in s.split('|') {
      let valid = !klass.is_empty()
        && klass.split('.').all(|label| {
          !label.is_empty()
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
      if !valid {
        return Err(Error::malformed_uid(s, format!("invalid klass {klass:?}")));
      }
      if !klasses.iter().any(|k| k == klass) {
        klasses.push(klass.to_owned());
      }
    }
    Ok(Self::OneOf(klasses))
  }

  pub fn matches(&self, klass: &str) -> bool {
    match self {
      Self::Any => true,
      Self::OneOf(ks) => ks.iter().any(|k| k == klass),
    }
  }

  /// The klass, if exactly one is named.
  pub fn single(&self) -> Option<&str> {
    match self {
      Self::OneOf(ks) if ks.len() == 1 => Some(&ks[0]),
      _ => None,
    }
  }
}

impl fmt::Display for KlassQuery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Any => f.write_str("*"),
      Self::OneOf(ks) => f.write_str(&ks.join("|")),
    }
  }
}

// ─── Raw parse ───────────────────────────────────────────────────────────────

/// The unvalidated segments of a UID. Absent segments are `None`; present
/// but empty segments are `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUid {
  pub klass: Option<String>,
  pub path:  Option<String>,
  pub oid:   Option<String>,
}

impl RawUid {
  /// Split a UID into segments without validating any of them. Never fails.
  ///
  /// A string without `:` is taken to be a bare klass.
  pub fn parse(s: &str) -> Self {
    let (klass, rest) = match s.split_once(':') {
      Some((k, rest)) => (k, Some(rest)),
      None => (s, None),
    };
    let (path, oid) = match rest {
      Some(rest) => match rest.split_once('$') {
        Some((p, o)) => (Some(p.to_owned()), Some(o.to_owned())),
        None => (Some(rest.to_owned()), None),
      },
      None => (None, None),
    };
    Self {
      klass: (!s.is_empty()).then(|| klass.to_owned()),
      path,
      oid,
    }
  }
}

// ─── Uid ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uid {
  pub klass: KlassQuery,
  pub path:  PathQuery,
  pub oid:   Option<i64>,
}

fn parse_oid(uid: &str, oid: Option<&str>) -> Result<Option<i64>> {
  match oid {
    None | Some("") | Some("*") => Ok(None),
    Some(digits) => match digits.parse::<i64>() {
      Ok(n) if n > 0 => Ok(Some(n)),
      _ => Err(Error::malformed_uid(uid, format!("invalid oid {digits:?}"))),
    },
  }
}

impl Uid {
  /// Strict parse; every segment must be well-formed and the `:` present.
  pub fn parse(s: &str) -> Result<Self> {
    let Some((klass, rest)) = s.split_once(':') else {
      return Err(Error::malformed_uid(s, "missing `:`"));
    };
    let (path, oid) = match rest.split_once('$') {
      Some((p, o)) => (p, Some(o)),
      None => (rest, None),
    };
    let path = PathQuery::parse(path).map_err(|e| match e {
      Error::MalformedPath { reason, .. } => Error::malformed_uid(s, reason),
      other => other,
    })?;
    Ok(Self {
      klass: KlassQuery::parse(klass).map_err(|_| {
        Error::malformed_uid(s, format!("invalid klass {klass:?}"))
      })?,
      path,
      oid: parse_oid(s, oid)?,
    })
  }

  /// Lenient parse for query scopes: missing or empty segments widen to
  /// "anything" instead of failing. Segments that are present must still be
  /// well-formed.
  pub fn parse_scope(s: &str) -> Result<Self> {
    let raw = RawUid::parse(s);
    let klass = match raw.klass.as_deref() {
      None | Some("") | Some("*") => KlassQuery::Any,
      Some(k) => KlassQuery::parse(k)?,
    };
    let path = match raw.path.as_deref() {
      None | Some("") => PathQuery::everything(),
      Some(p) => PathQuery::parse(p)?,
    };
    Ok(Self { klass, path, oid: parse_oid(s, raw.oid.as_deref())? })
  }

  pub fn new(klass: &str, path: &Path, oid: Option<i64>) -> Self {
    Self {
      klass: KlassQuery::OneOf(vec![klass.to_owned()]),
      path: path.exact_query(),
      oid,
    }
  }

  /// `true` when this UID selects a collection rather than one post.
  pub fn is_query(&self) -> bool { self.oid.is_none() }

  /// The exact path, for writes. Wildcards are rejected.
  pub fn exact_path(&self) -> Result<Path> {
    self.path.exact().ok_or_else(|| {
      Error::malformed_uid(&self.to_string(), "writes need an exact path")
    })
  }

  /// The klass, for writes. `*` and alternations are rejected.
  pub fn exact_klass(&self) -> Result<&str> {
    self.klass.single().ok_or_else(|| {
      Error::malformed_uid(&self.to_string(), "writes need a single klass")
    })
  }
}

impl fmt::Display for Uid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.klass, self.path)?;
    if let Some(oid) = self.oid {
      write!(f, "${oid}")?;
    }
    Ok(())
  }
}

impl FromStr for Uid {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}
