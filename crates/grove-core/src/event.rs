//! Post events for the external change publisher.

use async_trait::async_trait;
use serde::Serialize;

use crate::{change::ChangeKind, post::Post};

#[derive(Debug, Clone, Serialize)]
pub struct PostEvent {
  pub kind:     ChangeKind,
  pub uid:      String,
  pub post:     Post,
  pub identity: Option<i64>,
}

#[async_trait]
pub trait EventSink: Send + Sync {
  async fn publish(&self, event: &PostEvent);
}
