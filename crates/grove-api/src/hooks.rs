//! Post-commit hooks.
//!
//! After a write commits, the handler runs an explicit, ordered list of
//! hooks over the [`Transition`]. The change record itself is written inside
//! the store transaction; hooks only deal with things outside the store.

use std::sync::Arc;

use async_trait::async_trait;
use grove_core::{
  cache::{Cache, post_key},
  change::Transition,
  event::{EventSink, PostEvent},
  identity::Identity,
};
use tracing::debug;

#[async_trait]
pub trait PostCommitHook: Send + Sync {
  async fn after_commit(&self, transition: &Transition, identity: Option<&Identity>);
}

/// Drops the cached copy of the post. Runs for every write, including ones
/// that appended no change.
pub struct CacheInvalidation {
  pub cache: Arc<dyn Cache>,
}

#[async_trait]
impl PostCommitHook for CacheInvalidation {
  async fn after_commit(&self, transition: &Transition, _: Option<&Identity>) {
    self.cache.delete(&post_key(transition.after.id)).await;
  }
}

/// Publishes a [`PostEvent`] for every transition that appended a change.
pub struct EventPublication {
  pub sink: Arc<dyn EventSink>,
}

#[async_trait]
impl PostCommitHook for EventPublication {
  async fn after_commit(&self, transition: &Transition, identity: Option<&Identity>) {
    let Some(kind) = transition.kind() else {
      return;
    };
    let event = PostEvent {
      kind,
      uid: transition.after.uid().to_string(),
      post: transition.after.clone(),
      identity: identity.map(|i| i.id),
    };
    debug!(kind = %event.kind, uid = %event.uid, "publishing post event");
    self.sink.publish(&event).await;
  }
}

/// The ordered hook list.
pub struct PostCommitHooks {
  hooks: Vec<Box<dyn PostCommitHook>>,
}

impl PostCommitHooks {
  pub fn new(hooks: Vec<Box<dyn PostCommitHook>>) -> Self { Self { hooks } }

  /// Cache invalidation, then event publication.
  pub fn standard(cache: Arc<dyn Cache>, sink: Arc<dyn EventSink>) -> Self {
    Self::new(vec![
      Box::new(CacheInvalidation { cache }),
      Box::new(EventPublication { sink }),
    ])
  }

  pub async fn run(&self, transition: &Transition, identity: Option<&Identity>) {
    for hook in &self.hooks {
      hook.after_commit(transition, identity).await;
    }
  }
}
