//! Path algebra.
//!
//! A [`Path`] is a fully-qualified, dot-separated sequence of labels
//! (`a.b.c`). A [`PathQuery`] is the richer query form used to select
//! locations:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `a.b.c` | exactly `a.b.c` |
//! | `a.b.*` | `a.b` and every descendant |
//! | `*` | every location |
//! | `a.b\|c.d` | `a.b.d` or `a.c.d` |
//! | `a.^b.c` | `a.b.c` or any of its ancestors down to `a` |
//!
//! Queries compile to one [`LabelMatch`] per label position; storage
//! backends render those into their own predicate language.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum number of labels in a path.
pub const MAX_LABELS: usize = 10;

fn validate_label(source: &str, label: &str) -> Result<()> {
  if label.is_empty() {
    return Err(Error::malformed_path(source, "empty label"));
  }
  if !label
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
  {
    return Err(Error::malformed_path(
      source,
      format!("invalid label {label:?}"),
    ));
  }
  Ok(())
}

// ─── Path ────────────────────────────────────────────────────────────────────

/// A fully-qualified location in the hierarchy. Never contains wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path(Vec<String>);

impl Path {
  pub fn parse(s: &str) -> Result<Self> {
    let labels: Vec<String> = s.split('.').map(str::to_owned).collect();
    if labels.len() > MAX_LABELS {
      return Err(Error::malformed_path(
        s,
        format!("more than {MAX_LABELS} labels"),
      ));
    }
    for label in &labels {
      validate_label(s, label)?;
    }
    Ok(Self(labels))
  }

  pub fn labels(&self) -> &[String] { &self.0 }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The top label, which doubles as the tenant namespace.
  pub fn realm(&self) -> &str { &self.0[0] }

  /// Strict prefixes of this path, root first.
  pub fn ancestors(&self) -> Vec<Path> {
    (1..self.0.len()).map(|n| Path(self.0[..n].to_vec())).collect()
  }

  /// `true` if `self` is a strict prefix of `other`.
  pub fn is_ancestor_of(&self, other: &Path) -> bool {
    self.0.len() < other.0.len() && other.0.starts_with(&self.0)
  }

  /// The `self.*` query: this location and all of its descendants.
  pub fn subtree(&self) -> PathQuery {
    let mut terms: Vec<LabelMatch> =
      self.0.iter().cloned().map(LabelMatch::Equals).collect();
    terms.resize(MAX_LABELS, LabelMatch::Unconstrained);
    PathQuery { source: format!("{self}.*"), terms }
  }

  /// The query denoting exactly this path.
  pub fn exact_query(&self) -> PathQuery {
    let mut terms: Vec<LabelMatch> =
      self.0.iter().cloned().map(LabelMatch::Equals).collect();
    terms.resize(MAX_LABELS, LabelMatch::Absent);
    PathQuery { source: self.to_string(), terms }
  }

  /// The `^self` query: this location and every ancestor of it.
  pub fn covering(&self) -> PathQuery {
    let mut terms: Vec<LabelMatch> =
      self.0.iter().cloned().map(LabelMatch::AncestorOrEqual).collect();
    terms.resize(MAX_LABELS, LabelMatch::Absent);
    PathQuery { source: format!("^{self}"), terms }
  }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join("."))
  }
}

impl FromStr for Path {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for Path {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<Path> for String {
  fn from(p: Path) -> Self { p.to_string() }
}

// ─── Predicate terms ─────────────────────────────────────────────────────────

/// The condition a query places on one label position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelMatch {
  Equals(String),
  In(Vec<String>),
  /// The label equals the value, or the position is empty (the target is
  /// an ancestor).
  AncestorOrEqual(String),
  /// The position must be empty.
  Absent,
  Unconstrained,
}

impl LabelMatch {
  pub fn matches(&self, label: Option<&str>) -> bool {
    match self {
      Self::Equals(v) => label == Some(v.as_str()),
      Self::In(vs) => label.is_some_and(|l| vs.iter().any(|v| v == l)),
      Self::AncestorOrEqual(v) => label.is_none_or(|l| l == v),
      Self::Absent => label.is_none(),
      Self::Unconstrained => true,
    }
  }
}

// ─── PathQuery ───────────────────────────────────────────────────────────────

/// A validated path query, compiled to one [`LabelMatch`] per position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
  source: String,
  terms:  Vec<LabelMatch>,
}

impl PathQuery {
  pub fn parse(s: &str) -> Result<Self> {
    if s.is_empty() {
      return Err(Error::malformed_path(s, "empty path"));
    }
    if s == "*" {
      return Ok(Self::everything());
    }

    let tokens: Vec<&str> = s.split('.').collect();
    let open = tokens.last() == Some(&"*");
    let labels = if open { &tokens[..tokens.len() - 1] } else { &tokens[..] };

    if labels.len() > MAX_LABELS {
      return Err(Error::malformed_path(
        s,
        format!("more than {MAX_LABELS} labels"),
      ));
    }

    let mut terms = Vec::with_capacity(MAX_LABELS);
    let mut ancestor_from: Option<usize> = None;

    for (i, token) in labels.iter().enumerate() {
      if token.contains('*') {
        return Err(Error::malformed_path(
          s,
          "`*` is only valid as the final segment",
        ));
      }

      if let Some(rest) = token.strip_prefix('^') {
        if rest.is_empty() {
          return Err(Error::malformed_path(s, "`^` without a label"));
        }
        if ancestor_from.is_some() {
          return Err(Error::malformed_path(s, "more than one `^`"));
        }
        if rest.contains('|') || rest.contains('^') {
          return Err(Error::malformed_path(
            s,
            "`^` cannot be combined with `|`",
          ));
        }
        validate_label(s, rest)?;
        ancestor_from = Some(i);
        terms.push(LabelMatch::AncestorOrEqual(rest.to_owned()));
        continue;
      }

      if token.contains('^') {
        return Err(Error::malformed_path(s, "`^` must lead its label"));
      }

      if token.contains('|') {
        if ancestor_from.is_some() {
          return Err(Error::malformed_path(
            s,
            "`^` cannot be combined with `|`",
          ));
        }
        let mut options: Vec<String> = Vec::new();
        for option in token.split('|') {
          if option.is_empty() {
            return Err(Error::malformed_path(s, "empty alternative"));
          }
          validate_label(s, option)?;
          if !options.iter().any(|o| o == option) {
            options.push(option.to_owned());
          }
        }
        terms.push(if options.len() == 1 {
          LabelMatch::Equals(options.remove(0))
        } else {
          LabelMatch::In(options)
        });
        continue;
      }

      validate_label(s, token)?;
      terms.push(if ancestor_from.is_some() {
        LabelMatch::AncestorOrEqual((*token).to_owned())
      } else {
        LabelMatch::Equals((*token).to_owned())
      });
    }

    if open && ancestor_from.is_some() {
      return Err(Error::malformed_path(
        s,
        "`^` cannot be combined with `*`",
      ));
    }

    let fill = if open { LabelMatch::Unconstrained } else { LabelMatch::Absent };
    terms.resize(MAX_LABELS, fill);

    Ok(Self { source: s.to_owned(), terms })
  }

  /// The query matching every location.
  pub fn everything() -> Self {
    Self {
      source: "*".to_owned(),
      terms:  vec![LabelMatch::Unconstrained; MAX_LABELS],
    }
  }

  /// Per-position conditions, always [`MAX_LABELS`] long.
  pub fn predicate(&self) -> &[LabelMatch] { &self.terms }

  pub fn as_str(&self) -> &str { &self.source }

  pub fn matches(&self, path: &Path) -> bool {
    self
      .terms
      .iter()
      .enumerate()
      .all(|(i, term)| term.matches(path.labels().get(i).map(String::as_str)))
  }

  /// The single path this query denotes, if it has no wildcard of any kind.
  pub fn exact(&self) -> Option<Path> {
    let mut labels = Vec::new();
    for term in &self.terms {
      match term {
        LabelMatch::Equals(v) => labels.push(v.clone()),
        LabelMatch::Absent => break,
        _ => return None,
      }
    }
    Some(Path(labels))
  }

  /// `true` unless the query denotes exactly one path.
  pub fn is_wildcard(&self) -> bool { self.exact().is_none() }

  /// When every position up to the first open one is an equality, the realm
  /// the query is confined to.
  pub fn realm(&self) -> Option<&str> {
    match self.terms.first() {
      Some(LabelMatch::Equals(v) | LabelMatch::AncestorOrEqual(v)) => Some(v),
      _ => None,
    }
  }
}

impl fmt::Display for PathQuery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}

impl FromStr for PathQuery {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

/// Compile a path string to its per-position predicate.
pub fn to_predicate(path: &str) -> Result<Vec<LabelMatch>> {
  Ok(PathQuery::parse(path)?.terms)
}
