//! Group-based access to restricted posts.
//!
//! Identities belong to groups; groups are granted read access to locations.
//! A grant made on a subtree also reaches locations declared under it later.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
  pub group_id:    i64,
  pub identity_id: i64,
}

/// Answer to "does this group have access to this exact path?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
  Granted,
  Denied,
  /// No location exists for the path yet.
  Unknown,
}
