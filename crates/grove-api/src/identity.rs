//! Identity resolvers.

use std::collections::HashMap;

use async_trait::async_trait;
use grove_core::identity::{Identity, IdentityResolver};
use reqwest::StatusCode;
use tracing::warn;

/// A fixed session table, for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentities {
  sessions: HashMap<String, Identity>,
}

impl StaticIdentities {
  pub fn new(sessions: HashMap<String, Identity>) -> Self { Self { sessions } }

  pub fn with(mut self, session: impl Into<String>, identity: Identity) -> Self {
    self.sessions.insert(session.into(), identity);
    self
  }
}

#[async_trait]
impl IdentityResolver for StaticIdentities {
  async fn resolve(&self, session: &str) -> Option<Identity> {
    self.sessions.get(session).cloned()
  }
}

/// Asks the external identity service: `GET {base}/identities/me?session=..`.
///
/// A 200 carries the identity as JSON; any other status means anonymous.
#[derive(Debug, Clone)]
pub struct HttpIdentityResolver {
  base:   String,
  client: reqwest::Client,
}

impl HttpIdentityResolver {
  pub fn new(base: impl Into<String>) -> Self {
    Self {
      base:   base.into().trim_end_matches('/').to_owned(),
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
  async fn resolve(&self, session: &str) -> Option<Identity> {
    let resp = self
      .client
      .get(format!("{}/identities/me", self.base))
      .query(&[("session", session)])
      .send()
      .await;
    let resp = match resp {
      Ok(resp) => resp,
      Err(e) => {
        warn!(error = %e, "identity service unreachable");
        return None;
      }
    };
    if resp.status() != StatusCode::OK {
      return None;
    }
    match resp.json::<Identity>().await {
      Ok(identity) => Some(identity),
      Err(e) => {
        warn!(error = %e, "identity service returned an unreadable body");
        None
      }
    }
  }
}
