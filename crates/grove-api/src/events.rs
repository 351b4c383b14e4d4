//! Event sinks.

use async_trait::async_trait;
use grove_core::event::{EventSink, PostEvent};
use tracing::info;

/// Emits every post event as a structured `tracing` event under the
/// `grove::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
  async fn publish(&self, event: &PostEvent) {
    info!(
      target: "grove::events",
      kind = %event.kind,
      uid = %event.uid,
      version = event.post.version,
      identity = ?event.identity,
      "post event"
    );
  }
}
