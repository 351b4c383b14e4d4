//! The change feed.
//!
//! Every accepted post transition appends one [`Change`]. Changes are never
//! updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{post::Post, uid::Uid};

pub const DEFAULT_CHANGE_LIMIT: usize = 100;
pub const MAX_CHANGE_LIMIT: usize = 1000;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
  Create,
  Update,
  Delete,
}

impl ChangeKind {
  /// Classify a transition by its net effect. `None` means nothing changed.
  ///
  /// Undeleting counts as a create, so feed consumers see the post appear
  /// again.
  pub fn classify(before: Option<&Post>, after: &Post) -> Option<Self> {
    let Some(before) = before else {
      return Some(Self::Create);
    };
    match (before.deleted, after.deleted) {
      (false, true) => Some(Self::Delete),
      (true, false) => Some(Self::Create),
      _ if !before.same_content(after) => Some(Self::Update),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
  pub id:       i64,
  pub kind:     ChangeKind,
  pub post_id:  i64,
  /// The post's UID, resolved when the feed is read.
  pub post_uid: String,
  pub time:     DateTime<Utc>,
}

/// Parameters for reading the feed.
#[derive(Debug, Clone)]
pub struct ChangeQuery {
  pub scope: Uid,
  /// Only changes with an id strictly greater than this.
  pub since: Option<i64>,
  pub limit: Option<usize>,
}

impl ChangeQuery {
  pub fn limit(&self) -> usize {
    self
      .limit
      .unwrap_or(DEFAULT_CHANGE_LIMIT)
      .min(MAX_CHANGE_LIMIT)
  }
}

/// The result of a committed write: the post before and after, and the
/// change appended for it, if any.
#[derive(Debug, Clone)]
pub struct Transition {
  pub before: Option<Post>,
  pub after:  Post,
  pub change: Option<Change>,
}

impl Transition {
  pub fn created(&self) -> bool { self.before.is_none() }

  pub fn kind(&self) -> Option<ChangeKind> {
    self.change.as_ref().map(|c| c.kind)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use serde_json::json;

  use super::*;
  use crate::path::Path;

  fn post() -> Post {
    let now = Utc::now();
    let path = Path::parse("a.b").unwrap();
    Post {
      id:             1,
      klass:          "post".into(),
      realm:          "a".into(),
      canonical_path: path.clone(),
      paths:          vec![path],
      document:       json!({"text": "ding"}),
      tags:           vec![],
      occurrences:    Default::default(),
      external_id:    None,
      created_by:     7,
      restricted:     false,
      deleted:        false,
      version:        1,
      created_at:     now,
      updated_at:     now,
    }
  }

  #[test]
  fn first_save_is_create() {
    assert_eq!(ChangeKind::classify(None, &post()), Some(ChangeKind::Create));
  }

  #[test]
  fn delete_flag_transitions() {
    let live = post();
    let mut gone = post();
    gone.deleted = true;
    assert_eq!(
      ChangeKind::classify(Some(&live), &gone),
      Some(ChangeKind::Delete)
    );
    assert_eq!(
      ChangeKind::classify(Some(&gone), &live),
      Some(ChangeKind::Create)
    );
  }

  #[test]
  fn attribute_diff_is_update_and_bookkeeping_is_not() {
    let before = post();
    let mut after = post();
    after.version = 2;
    after.updated_at = Utc::now();
    assert_eq!(ChangeKind::classify(Some(&before), &after), None);

    after.tags = vec!["x".into()];
    assert_eq!(
      ChangeKind::classify(Some(&before), &after),
      Some(ChangeKind::Update)
    );
  }

  #[test]
  fn limit_is_capped() {
    let scope = Uid::parse_scope("*").unwrap();
    let q = ChangeQuery { scope: scope.clone(), since: None, limit: Some(5000) };
    assert_eq!(q.limit(), MAX_CHANGE_LIMIT);
    let q = ChangeQuery { scope, since: None, limit: None };
    assert_eq!(q.limit(), DEFAULT_CHANGE_LIMIT);
  }
}
