//! Validation callbacks: the HTTP implementation and the path-scoped
//! registry consulted before every write.

use std::sync::Arc;

use async_trait::async_trait;
use grove_core::{
  callback::{Callback, CallbackContext, Verdict},
  path::{Path, PathQuery},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

// ─── HTTP callback ───────────────────────────────────────────────────────────

/// POSTs the [`CallbackContext`] as JSON to `url`.
///
/// A 2xx allows the change, or modifies it when the response body carries
/// a `changes` object. Anything else denies it, with the `reason` field of
/// the response body when there is one.
#[derive(Debug, Clone)]
pub struct HttpCallback {
  url:    String,
  client: reqwest::Client,
}

#[derive(Deserialize)]
struct Approval {
  changes: Option<Value>,
}

#[derive(Deserialize)]
struct Denial {
  reason: Option<String>,
}

impl HttpCallback {
  pub fn new(url: impl Into<String>) -> Self {
    Self { url: url.into(), client: reqwest::Client::new() }
  }
}

#[async_trait]
impl Callback for HttpCallback {
  fn origin(&self) -> &str { &self.url }

  async fn validate(&self, context: &CallbackContext) -> Verdict {
    let resp = match self.client.post(&self.url).json(context).send().await {
      Ok(resp) => resp,
      Err(e) => {
        warn!(url = %self.url, error = %e, "callback unreachable");
        return Verdict::Deny { reason: "callback unreachable".to_owned() };
      }
    };
    let status = resp.status();
    if status.is_success() {
      // An empty or non-JSON body is a plain approval.
      return match resp.json::<Approval>().await {
        Ok(Approval { changes: Some(changes) }) => Verdict::Modify { changes },
        _ => Verdict::Allow,
      };
    }
    let reason = resp
      .json::<Denial>()
      .await
      .ok()
      .and_then(|d| d.reason)
      .unwrap_or_else(|| format!("denied with status {status}"));
    Verdict::Deny { reason }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

struct Registration {
  scope:    PathQuery,
  callback: Arc<dyn Callback>,
}

/// Callbacks keyed by the paths they guard.
#[derive(Default)]
pub struct Callbacks {
  registrations: Vec<Registration>,
}

impl Callbacks {
  pub fn new() -> Self { Self::default() }

  /// Consult `callback` for writes to posts whose canonical path matches
  /// `scope`.
  pub fn register(&mut self, scope: PathQuery, callback: Arc<dyn Callback>) {
    self.registrations.push(Registration { scope, callback });
  }

  pub fn is_empty(&self) -> bool { self.registrations.is_empty() }

  /// Ask every callback registered for `path`, in registration order, and
  /// return the changes to apply. The first denial wins. A modification
  /// replaces the changes seen by the callbacks after it.
  pub async fn validate(
    &self,
    path: &Path,
    mut context: CallbackContext,
  ) -> grove_core::Result<Value> {
    for reg in self.registrations.iter().filter(|r| r.scope.matches(path)) {
      match reg.callback.validate(&context).await {
        Verdict::Allow => {}
        Verdict::Modify { changes } => {
          debug!(origin = reg.callback.origin(), %path, "callback modified changes");
          context.post.changes = changes;
        }
        Verdict::Deny { reason } => {
          return Err(grove_core::Error::Rejected {
            reason,
            origin: reg.callback.origin().to_owned(),
          });
        }
      }
    }
    Ok(context.post.changes)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use grove_core::{
    callback::{CallbackAction, CallbackPost},
    identity::Identity,
  };
  use serde_json::json;

  use super::*;

  struct Fixed {
    verdict: Verdict,
    calls:   AtomicUsize,
  }

  #[async_trait]
  impl Callback for Fixed {
    fn origin(&self) -> &str { "fixed" }

    async fn validate(&self, _: &CallbackContext) -> Verdict {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.verdict.clone()
    }
  }

  fn context() -> CallbackContext {
    CallbackContext {
      post:     CallbackPost {
        uid:     "post:a.b".into(),
        current: None,
        changes: json!({}),
      },
      action:   CallbackAction::Create,
      session:  None,
      identity: Identity { id: 1, god: false, realm: None },
    }
  }

  #[tokio::test]
  async fn only_matching_scopes_are_consulted() {
    let deny = Arc::new(Fixed {
      verdict: Verdict::Deny { reason: "closed".into() },
      calls:   AtomicUsize::new(0),
    });
    let mut callbacks = Callbacks::new();
    callbacks.register(PathQuery::parse("b.*").unwrap(), deny.clone());

    let path = Path::parse("a.b").unwrap();
    assert!(callbacks.validate(&path, context()).await.is_ok());
    assert_eq!(deny.calls.load(Ordering::SeqCst), 0);

    let path = Path::parse("b.c").unwrap();
    let err = callbacks.validate(&path, context()).await.unwrap_err();
    assert!(matches!(
      err,
      grove_core::Error::Rejected { ref reason, ref origin }
        if reason == "closed" && origin == "fixed"
    ));
  }

  /// Adds its name to the `seen` array of the changes it receives.
  struct Stamp(&'static str);

  #[async_trait]
  impl Callback for Stamp {
    fn origin(&self) -> &str { self.0 }

    async fn validate(&self, context: &CallbackContext) -> Verdict {
      let mut changes = context.post.changes.clone();
      let mut seen = changes["seen"].as_array().cloned().unwrap_or_default();
      seen.push(json!(self.0));
      changes["seen"] = json!(seen);
      Verdict::Modify { changes }
    }
  }

  #[tokio::test]
  async fn modifications_chain_in_registration_order() {
    let allow = Arc::new(Fixed { verdict: Verdict::Allow, calls: AtomicUsize::new(0) });
    let mut callbacks = Callbacks::new();
    callbacks.register(PathQuery::parse("a.*").unwrap(), Arc::new(Stamp("first")));
    callbacks.register(PathQuery::parse("a.*").unwrap(), allow.clone());
    callbacks.register(PathQuery::parse("a.*").unwrap(), Arc::new(Stamp("second")));

    let path = Path::parse("a.b").unwrap();
    let changes = callbacks.validate(&path, context()).await.unwrap();
    assert_eq!(changes, json!({ "seen": ["first", "second"] }));
    assert_eq!(allow.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn no_callbacks_returns_the_request_body() {
    let callbacks = Callbacks::new();
    let path = Path::parse("a.b").unwrap();
    let changes = callbacks.validate(&path, context()).await.unwrap();
    assert_eq!(changes, json!({}));
  }
}
