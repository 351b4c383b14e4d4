//! Optimistic versioning and merge-on-conflict.
//!
//! A plain update may carry the version the caller last saw; a mismatch is a
//! conflict. A merge update never conflicts: its patch is deep-merged into
//! whatever document is current, so concurrent merges of disjoint keys all
//! land. Merged keys are last-writer-wins at the leaf.

use serde_json::Value;

use crate::{Error, Result};

/// Outcome of comparing a caller's expected version with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionState {
  NoVersionSupplied,
  VersionMatches,
  VersionConflict,
}

impl VersionState {
  pub fn of(expected: Option<i64>, current: i64) -> Self {
    match expected {
      None => Self::NoVersionSupplied,
      Some(v) if v == current => Self::VersionMatches,
      Some(_) => Self::VersionConflict,
    }
  }
}

/// Fail on a version conflict unless the write is a merge.
pub fn check_version(
  expected: Option<i64>,
  current: i64,
  merge: bool,
) -> Result<VersionState> {
  let state = VersionState::of(expected, current);
  if state == VersionState::VersionConflict && !merge {
    return Err(Error::Conflict(format!(
      "expected version {}, found {current}",
      expected.unwrap_or_default()
    )));
  }
  Ok(state)
}

/// Recursively merge `patch` into `target`. Objects merge key-wise; any
/// other patch value (arrays and `null` included) replaces the target.
pub fn deep_merge(target: &mut Value, patch: &Value) {
  match (target, patch) {
    (Value::Object(t), Value::Object(p)) => {
      for (key, value) in p {
        match t.get_mut(key) {
          Some(existing) => deep_merge(existing, value),
          None => {
            t.insert(key.clone(), value.clone());
          }
        }
      }
    }
    (t, p) => *t = p.clone(),
  }
}

/// What a write does to the stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentUpdate {
  Unchanged,
  Replace(Value),
}

/// Decide the next document for `incoming` against `current`. Assumes the
/// version was already checked with [`check_version`].
pub fn plan_document(
  current: &Value,
  incoming: &Value,
  merge: bool,
) -> DocumentUpdate {
  let next = if merge {
    let mut merged = current.clone();
    deep_merge(&mut merged, incoming);
    merged
  } else {
    incoming.clone()
  };
  if next == *current {
    DocumentUpdate::Unchanged
  } else {
    DocumentUpdate::Replace(next)
  }
}
