//! Outbound validation callbacks.
//!
//! Before a write is applied, every callback registered for the post's path
//! is asked for a [`Verdict`]. Any denial aborts the write. A callback may
//! also hand back replacement changes, which later callbacks and the write
//! itself see in place of the request body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{identity::Identity, post::Post};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackAction {
  Create,
  Update,
  Delete,
  Undelete,
}

/// The post as the callback sees it.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackPost {
  pub uid:     String,
  /// Stored state, absent on create.
  pub current: Option<Post>,
  /// The request body, as modified by earlier callbacks.
  pub changes: Value,
}

/// Built fresh for every callback invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackContext {
  pub post:     CallbackPost,
  pub action:   CallbackAction,
  pub session:  Option<String>,
  pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Allow,
  Deny { reason: String },
  /// Approve with `changes` in place of the request body. Only create and
  /// update bodies are rewritten; for other actions this is an approval.
  Modify { changes: Value },
}

#[async_trait]
pub trait Callback: Send + Sync {
  /// Reported back to the client when this callback denies a change.
  fn origin(&self) -> &str;

  async fn validate(&self, context: &CallbackContext) -> Verdict;
}
