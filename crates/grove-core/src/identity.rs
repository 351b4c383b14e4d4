//! Identities and the write-access policy.
//!
//! Identities come from an external service; this crate only consumes them.
//! Privilege (`god`) is scoped to the identity's own realm: a god identity
//! has no special rights over posts in other realms.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, post::Post};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:    i64,
  #[serde(default)]
  pub god:   bool,
  #[serde(default)]
  pub realm: Option<String>,
}

impl Identity {
  /// `true` if this identity may override ownership inside `realm`.
  pub fn is_privileged_in(&self, realm: &str) -> bool {
    self.god && self.realm.as_deref() == Some(realm)
  }

  /// Check that this identity may modify `post`.
  ///
  /// A deleted post is absent to anyone without privilege, so that case is
  /// reported as not-found rather than forbidden.
  pub fn authorize_update(&self, post: &Post) -> Result<()> {
    let privileged = self.is_privileged_in(&post.realm);
    if post.deleted && !privileged {
      return Err(Error::NotFound(post.uid().to_string()));
    }
    if post.created_by != self.id && !privileged {
      return Err(Error::Forbidden(format!(
        "identity {} does not own {}",
        self.id,
        post.uid()
      )));
    }
    Ok(())
  }

  /// Check that this identity may undelete `post`.
  pub fn authorize_undelete(&self, post: &Post) -> Result<()> {
    if !self.is_privileged_in(&post.realm) {
      return Err(Error::Forbidden(format!(
        "only privileged identities may undelete {}",
        post.uid()
      )));
    }
    Ok(())
  }
}

/// Resolves a session token to an identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
  /// `None` when the session is unknown or expired.
  async fn resolve(&self, session: &str) -> Option<Identity>;
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use serde_json::json;

  use super::*;
  use crate::path::Path;

  fn post(created_by: i64, deleted: bool) -> Post {
    let now = Utc::now();
    let path = Path::parse("realm.x").unwrap();
    Post {
      id: 3,
      klass: "post".into(),
      realm: "realm".into(),
      canonical_path: path.clone(),
      paths: vec![path],
      document: json!({}),
      tags: vec![],
      occurrences: Default::default(),
      external_id: None,
      created_by,
      restricted: false,
      deleted,
      version: 1,
      created_at: now,
      updated_at: now,
    }
  }

  fn user(id: i64) -> Identity { Identity { id, god: false, realm: None } }

  fn god(id: i64, realm: &str) -> Identity {
    Identity { id, god: true, realm: Some(realm.into()) }
  }

  #[test]
  fn owner_may_update() {
    assert!(user(1).authorize_update(&post(1, false)).is_ok());
  }

  #[test]
  fn stranger_is_forbidden() {
    assert!(matches!(
      user(2).authorize_update(&post(1, false)),
      Err(Error::Forbidden(_))
    ));
  }

  #[test]
  fn deleted_post_is_not_found_for_owner() {
    assert!(matches!(
      user(1).authorize_update(&post(1, true)),
      Err(Error::NotFound(_))
    ));
  }

  #[test]
  fn god_is_scoped_to_own_realm() {
    assert!(god(9, "realm").authorize_update(&post(1, true)).is_ok());
    assert!(god(9, "realm").authorize_undelete(&post(1, true)).is_ok());
    assert!(matches!(
      god(9, "elsewhere").authorize_update(&post(1, false)),
      Err(Error::Forbidden(_))
    ));
    assert!(user(1).authorize_undelete(&post(1, true)).is_err());
  }
}
