//! The opportunistic read cache.
//!
//! The cache is never authoritative: writes delete the affected entry and a
//! miss always falls through to the store.
//!
//! A reader that missed must not put back a copy that a concurrent write
//! has already invalidated. Readers take a [`Generation`] before going to
//! the store and hand it to [`Cache::fill`]; a `fill` for a key deleted
//! after that generation is dropped.

use async_trait::async_trait;
use serde_json::Value;

/// Position in the cache's deletion history.
pub type Generation = u64;

/// Key under which a post is cached.
pub fn post_key(oid: i64) -> String { format!("grove:post:{oid}") }

#[async_trait]
pub trait Cache: Send + Sync {
  async fn get(&self, key: &str) -> Option<Value>;

  /// Store unconditionally.
  async fn set(&self, key: &str, value: Value);

  async fn delete(&self, key: &str);

  /// The current generation. Take it before reading the store.
  async fn generation(&self) -> Generation;

  /// Store `value` unless `key` was deleted after `since`.
  async fn fill(&self, key: &str, value: Value, since: Generation);

  /// One slot per key, in order.
  async fn get_multi(&self, keys: &[String]) -> Vec<Option<Value>> {
    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
      out.push(self.get(key).await);
    }
    out
  }
}

/// A cache that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
  async fn get(&self, _: &str) -> Option<Value> { None }

  async fn set(&self, _: &str, _: Value) {}

  async fn delete(&self, _: &str) {}

  async fn generation(&self) -> Generation { 0 }

  async fn fill(&self, _: &str, _: Value, _: Generation) {}
}
