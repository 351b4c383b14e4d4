//! Post, the document entity, and the write inputs that mutate it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{path::Path, uid::Uid};

/// Labeled timestamps, e.g. `{"due": [..]}`. Each list is sorted and free of
/// duplicates.
pub type Occurrences = BTreeMap<String, Vec<DateTime<Utc>>>;

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
  pub id:             i64,
  pub klass:          String,
  /// Top label of the canonical path.
  pub realm:          String,
  pub canonical_path: Path,
  /// Every path the post is attached to, canonical included, sorted.
  pub paths:          Vec<Path>,
  pub document:       Value,
  /// Normalised, sorted, unique.
  pub tags:           Vec<String>,
  pub occurrences:    Occurrences,
  pub external_id:    Option<String>,
  pub created_by:     i64,
  pub restricted:     bool,
  pub deleted:        bool,
  pub version:        i64,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Post {
  pub fn uid(&self) -> Uid {
    Uid::new(&self.klass, &self.canonical_path, Some(self.id))
  }

  /// `true` when no client-visible attribute differs. Bookkeeping columns
  /// (version, timestamps, creator) are ignored.
  pub fn same_content(&self, other: &Post) -> bool {
    self.klass == other.klass
      && self.canonical_path == other.canonical_path
      && self.paths == other.paths
      && self.document == other.document
      && self.tags == other.tags
      && self.occurrences == other.occurrences
      && self.external_id == other.external_id
      && self.restricted == other.restricted
      && self.deleted == other.deleted
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// Lower-case and strip everything that is not alphanumeric. Returns `None`
/// when nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
  let t: String = tag
    .chars()
    .flat_map(char::to_lowercase)
    .filter(|c| c.is_alphanumeric())
    .collect();
  (!t.is_empty()).then_some(t)
}

/// Normalise a batch of tags into a sorted set.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out: Vec<String> =
    tags.into_iter().filter_map(|t| normalize_tag(t.as_ref())).collect();
  out.sort();
  out.dedup();
  out
}

// ─── Occurrences ─────────────────────────────────────────────────────────────

/// A change to the timestamps under one occurrence label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurrenceOp {
  /// Add timestamps; ones already present are ignored.
  Append(Vec<DateTime<Utc>>),
  /// Replace the label's set.
  Replace(Vec<DateTime<Utc>>),
  /// Remove the given timestamps, or the whole label when empty.
  Remove(Vec<DateTime<Utc>>),
}

impl OccurrenceOp {
  /// The label's set after applying this operation to `current`.
  pub fn apply(&self, current: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
    let mut next: Vec<DateTime<Utc>> = match self {
      Self::Append(at) => current.iter().chain(at).copied().collect(),
      Self::Replace(at) => at.clone(),
      Self::Remove(at) if at.is_empty() => Vec::new(),
      Self::Remove(at) => {
        current.iter().filter(|t| !at.contains(t)).copied().collect()
      }
    };
    next.sort();
    next.dedup();
    next
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
  /// Create when the target does not exist.
  #[default]
  Upsert,
  /// Fail with not-found when the target does not exist.
  UpdateOnly,
  /// Fail with conflict when the target already exists.
  CreateOnly,
}

/// The body of a create-or-update request. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct PostWrite {
  pub document:    Option<Value>,
  /// Replaces the tag set.
  pub tags:        Option<Vec<String>>,
  pub restricted:  Option<bool>,
  /// Replaces the secondary paths; the canonical path always stays.
  pub paths:       Option<Vec<Path>>,
  /// Replaces the listed labels only.
  pub occurrences: Option<Occurrences>,
  pub external_id: Option<String>,
  /// Deep-merge `document` into the latest stored document.
  pub merge:       bool,
  /// Expected current version.
  pub version:     Option<i64>,
  pub mode:        WriteMode,
}

/// A targeted change to an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
  AttachPath(Path),
  DetachPath(Path),
  AddTags(Vec<String>),
  RemoveTags(Vec<String>),
  Occurrences { label: String, op: OccurrenceOp },
  Delete,
  Undelete,
  /// Bump `updated_at` only.
  Touch,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn tags_are_lowercased_and_stripped() {
    assert_eq!(normalize_tag("Hello-World!"), Some("helloworld".into()));
    assert_eq!(normalize_tag("#!?"), None);
    assert_eq!(normalize_tags(["B", "a", "b", "--"]), ["a", "b"]);
  }

  #[test]
  fn append_deduplicates() {
    let op = OccurrenceOp::Append(vec![at(2), at(1)]);
    assert_eq!(op.apply(&[at(1)]), [at(1), at(2)]);
  }

  #[test]
  fn replace_discards_current() {
    let op = OccurrenceOp::Replace(vec![at(5)]);
    assert_eq!(op.apply(&[at(1), at(2)]), [at(5)]);
  }

  #[test]
  fn remove_specific_or_all() {
    let current = [at(1), at(2), at(3)];
    assert_eq!(OccurrenceOp::Remove(vec![at(2)]).apply(&current), [
      at(1),
      at(3)
    ]);
    assert!(OccurrenceOp::Remove(vec![]).apply(&current).is_empty());
  }
}
