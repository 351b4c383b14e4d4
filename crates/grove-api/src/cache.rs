//! In-process read cache.

use std::{num::NonZeroUsize, time::Duration};

use async_trait::async_trait;
use grove_core::cache::{Cache, Generation};
use lru::LruCache;
use serde_json::Value;
use tokio::{sync::Mutex, time::Instant};

pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct Entry {
  value:   Value,
  expires: Instant,
}

struct Inner {
  entries:    LruCache<String, Entry>,
  /// Generation of the latest delete, per key.
  tombstones: LruCache<String, Generation>,
  /// Newest tombstone ever evicted. Keys without a tombstone are treated
  /// as deleted at this generation.
  floor:      Generation,
  generation: Generation,
}

impl Inner {
  fn deleted_at(&self, key: &str) -> Generation {
    self.tombstones.peek(key).copied().unwrap_or(self.floor)
  }
}

/// A bounded LRU cache whose entries expire after a fixed time to live.
pub struct MemoryCache {
  ttl:   Duration,
  inner: Mutex<Inner>,
}

impl MemoryCache {
  /// `capacity` is at least one entry.
  pub fn new(capacity: usize) -> Self {
    let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
    Self {
      ttl:   DEFAULT_CACHE_TTL,
      inner: Mutex::new(Inner {
        entries:    LruCache::new(capacity),
        tombstones: LruCache::new(capacity),
        floor:      0,
        generation: 0,
      }),
    }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub async fn len(&self) -> usize { self.inner.lock().await.entries.len() }

  fn lookup(inner: &mut Inner, key: &str) -> Option<Value> {
    match inner.entries.get(key) {
      None => return None,
      Some(entry) if entry.expires > Instant::now() => {
        return Some(entry.value.clone());
      }
      Some(_) => {}
    }
    inner.entries.pop(key);
    None
  }
}

impl Default for MemoryCache {
  fn default() -> Self { Self::new(DEFAULT_CACHE_CAPACITY) }
}

#[async_trait]
impl Cache for MemoryCache {
  async fn get(&self, key: &str) -> Option<Value> {
    Self::lookup(&mut *self.inner.lock().await, key)
  }

  async fn set(&self, key: &str, value: Value) {
    let expires = Instant::now() + self.ttl;
    self
      .inner
      .lock()
      .await
      .entries
      .put(key.to_owned(), Entry { value, expires });
  }

  async fn delete(&self, key: &str) {
    let mut inner = self.inner.lock().await;
    inner.generation += 1;
    let generation = inner.generation;
    inner.entries.pop(key);
    match inner.tombstones.push(key.to_owned(), generation) {
      Some((evicted, at)) if evicted != key => {
        inner.floor = inner.floor.max(at);
      }
      _ => {}
    }
  }

  async fn generation(&self) -> Generation { self.inner.lock().await.generation }

  async fn fill(&self, key: &str, value: Value, since: Generation) {
    let mut inner = self.inner.lock().await;
    if inner.deleted_at(key) > since {
      return;
    }
    let expires = Instant::now() + self.ttl;
    inner.entries.put(key.to_owned(), Entry { value, expires });
  }

  async fn get_multi(&self, keys: &[String]) -> Vec<Option<Value>> {
    let mut inner = self.inner.lock().await;
    keys.iter().map(|k| Self::lookup(&mut inner, k)).collect()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn evicts_least_recently_used_when_full() {
    let cache = MemoryCache::new(2);
    cache.set("a", json!(1)).await;
    cache.set("b", json!(2)).await;
    assert_eq!(cache.get("a").await, Some(json!(1)));
    cache.set("c", json!(3)).await;
    assert_eq!(cache.len().await, 2);
    assert!(cache.get("b").await.is_none());
    assert_eq!(cache.get("a").await, Some(json!(1)));
    assert_eq!(cache.get("c").await, Some(json!(3)));
  }

  #[tokio::test]
  async fn delete_and_get_multi() {
    let cache = MemoryCache::default();
    cache.set("a", json!(1)).await;
    cache.set("b", json!(2)).await;
    cache.delete("a").await;
    let got = cache.get_multi(&["a".into(), "b".into()]).await;
    assert_eq!(got, [None, Some(json!(2))]);
  }

  #[tokio::test]
  async fn fill_after_a_delete_is_dropped() {
    let cache = MemoryCache::default();
    let before = cache.generation().await;
    cache.delete("a").await;
    cache.fill("a", json!("stale"), before).await;
    assert!(cache.get("a").await.is_none());

    let after = cache.generation().await;
    cache.fill("a", json!("fresh"), after).await;
    assert_eq!(cache.get("a").await, Some(json!("fresh")));

    // Deletes of other keys do not block a fill.
    let before = cache.generation().await;
    cache.delete("b").await;
    cache.fill("c", json!(3), before).await;
    assert_eq!(cache.get("c").await, Some(json!(3)));
  }

  #[tokio::test]
  async fn evicted_tombstones_still_block_old_fills() {
    let cache = MemoryCache::new(1);
    let before = cache.generation().await;
    cache.delete("a").await;
    cache.delete("b").await;
    cache.fill("a", json!("stale"), before).await;
    assert!(cache.get("a").await.is_none());
  }

  #[tokio::test]
  async fn entries_expire() {
    let cache = MemoryCache::default().with_ttl(Duration::from_millis(20));
    cache.set("a", json!(1)).await;
    assert_eq!(cache.get("a").await, Some(json!(1)));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.get("a").await.is_none());
    assert_eq!(cache.len().await, 0);
  }
}
