//! Route handlers, one module per resource.

pub mod annotations;
pub mod changes;
pub mod groups;
pub mod locations;
pub mod posts;
pub mod readmarks;

use grove_core::{
  callback::{CallbackAction, CallbackContext, CallbackPost},
  change::Transition,
  identity::Identity,
  store::PostStore,
  uid::Uid,
};
use serde_json::Value;

use crate::{AppState, error::ApiError, session::Caller};

/// What a write intends to do to the post it addresses.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Intent {
  /// Create the post, or update it if it exists.
  Upsert,
  /// Act on a post that must already exist.
  Existing(CallbackAction),
}

/// The outcome of [`validate_write`].
pub(crate) struct Validated {
  /// What the callbacks were asked about; `None` when none were asked.
  pub action:  Option<CallbackAction>,
  /// The changes to apply, after any callback modifications.
  pub changes: Value,
}

/// Run the callbacks registered for the post `uid` addresses.
///
/// When the target of an [`Intent::Existing`] write is missing, no callback
/// is asked; the store reports the absence.
///
/// The target is looked up outside the write transaction, so it may be
/// created or deleted before the write commits. Upserts pin the write mode
/// to the returned action (see [`Validated::action`]) so the store refuses
/// a write whose target changed in between.
pub(crate) async fn validate_write<S>(
  state: &AppState<S>,
  caller: &Caller,
  identity: &Identity,
  uid: &Uid,
  external_id: Option<String>,
  intent: Intent,
  changes: Value,
) -> Result<Validated, ApiError>
where
  S: PostStore,
{
  if state.callbacks.is_empty() {
    return Ok(Validated { action: None, changes });
  }
  let current = state
    .store
    .find_target(uid.clone(), external_id)
    .await
    .map_err(ApiError::store)?;
  let (action, path) = match (&current, intent) {
    (Some(post), Intent::Upsert) => {
      (CallbackAction::Update, post.canonical_path.clone())
    }
    (Some(post), Intent::Existing(action)) => {
      (action, post.canonical_path.clone())
    }
    (None, Intent::Upsert) => (CallbackAction::Create, uid.exact_path()?),
    (None, Intent::Existing(_)) => {
      return Ok(Validated { action: None, changes });
    }
  };
  let context = CallbackContext {
    post: CallbackPost { uid: uid.to_string(), current, changes },
    action,
    session: caller.session.clone(),
    identity: identity.clone(),
  };
  let changes = state.callbacks.validate(&path, context).await?;
  Ok(Validated { action: Some(action), changes })
}

/// Post-commit hooks for a committed write.
pub(crate) async fn committed<S>(
  state: &AppState<S>,
  transition: &Transition,
  identity: &Identity,
) {
  state.hooks.run(transition, Some(identity)).await;
}
