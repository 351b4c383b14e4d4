//! Readmarks: per-identity reading cursors over a path subtree.

use serde::{Deserialize, Serialize};

use crate::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readmark {
  pub id:           i64,
  pub owner:        i64,
  pub path:         Path,
  /// Highest post id the owner has seen.
  pub post_id:      i64,
  /// Undeleted posts under `path` newer than `post_id`.
  pub unread_count: i64,
}
