//! JSON HTTP API for Grove.
//!
//! Exposes an axum [`Router`] backed by any [`grove_core::store::PostStore`].
//! TLS and process concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = grove_api::router(AppState::new(store, identities));
//! axum::serve(listener, app).await?;
//! ```

pub mod cache;
pub mod callbacks;
pub mod error;
pub mod events;
pub mod handlers;
pub mod hooks;
pub mod identity;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use grove_core::{
  cache::Cache,
  event::EventSink,
  identity::IdentityResolver,
  store::{DEFAULT_POST_LIMIT, MAX_POST_LIMIT, PostStore},
};
use tower_http::trace::TraceLayer;

pub use cache::MemoryCache;
pub use callbacks::{Callbacks, HttpCallback};
pub use error::ApiError;
pub use events::TracingEventSink;
pub use hooks::PostCommitHooks;
pub use identity::{HttpIdentityResolver, StaticIdentities};

use handlers::{annotations, changes, groups, locations, posts, readmarks};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Request-level limits.
#[derive(Debug, Clone, Copy)]
pub struct ApiConfig {
  pub default_limit: usize,
  pub max_limit:     usize,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self { default_limit: DEFAULT_POST_LIMIT, max_limit: MAX_POST_LIMIT }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub identity:  Arc<dyn IdentityResolver>,
  pub cache:     Arc<dyn Cache>,
  pub events:    Arc<dyn EventSink>,
  pub callbacks: Arc<Callbacks>,
  pub hooks:     Arc<PostCommitHooks>,
  pub config:    ApiConfig,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      identity:  self.identity.clone(),
      cache:     self.cache.clone(),
      events:    self.events.clone(),
      callbacks: self.callbacks.clone(),
      hooks:     self.hooks.clone(),
      config:    self.config,
    }
  }
}

impl<S> AppState<S> {
  /// State with an in-memory cache, tracing events and no callbacks.
  pub fn new(store: Arc<S>, identity: Arc<dyn IdentityResolver>) -> Self {
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::default());
    let events: Arc<dyn EventSink> = Arc::new(TracingEventSink);
    Self {
      store,
      identity,
      hooks: Arc::new(PostCommitHooks::standard(cache.clone(), events.clone())),
      cache,
      events,
      callbacks: Arc::new(Callbacks::new()),
      config: ApiConfig::default(),
    }
  }

  pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
    self.cache = cache;
    self.rebuild_hooks()
  }

  pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
    self.events = events;
    self.rebuild_hooks()
  }

  pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
    self.callbacks = Arc::new(callbacks);
    self
  }

  pub fn with_config(mut self, config: ApiConfig) -> Self {
    self.config = config;
    self
  }

  fn rebuild_hooks(mut self) -> Self {
    self.hooks = Arc::new(PostCommitHooks::standard(
      self.cache.clone(),
      self.events.clone(),
    ));
    self
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the Grove API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PostStore + 'static,
{
  Router::new()
    // Posts
    .route(
      "/posts/{uid}",
      get(posts::get_uid::<S>)
        .post(posts::create::<S>)
        .put(posts::update::<S>)
        .delete(posts::delete::<S>),
    )
    .route("/posts/{uid}/undelete", post(posts::undelete::<S>))
    .route("/posts/{uid}/count", get(posts::count::<S>))
    .route("/posts/{uid}/touch", put(posts::touch::<S>))
    // Annotations
    .route(
      "/posts/{uid}/paths/{path}",
      post(annotations::attach_path::<S>)
        .put(annotations::attach_path::<S>)
        .delete(annotations::detach_path::<S>),
    )
    .route(
      "/posts/{uid}/tags/{tags}",
      post(annotations::add_tags::<S>)
        .put(annotations::add_tags::<S>)
        .delete(annotations::remove_tags::<S>),
    )
    .route(
      "/posts/{uid}/occurrences/{label}",
      post(annotations::append_occurrences::<S>)
        .put(annotations::replace_occurrences::<S>)
        .delete(annotations::remove_occurrences::<S>),
    )
    // Feed and cursors
    .route("/changes/{uid}", get(changes::list::<S>))
    .route("/readmarks/{path}", get(readmarks::get_path::<S>))
    .route("/readmarks/{path}/{uid}", put(readmarks::set::<S>))
    // Administration
    .route(
      "/groups/{group}/memberships/{identity}",
      put(groups::add_member::<S>).delete(groups::remove_member::<S>),
    )
    .route(
      "/groups/{group}/subtrees/{path}",
      get(groups::inclusion::<S>)
        .put(groups::allow::<S>)
        .delete(groups::deny::<S>),
    )
    .route("/locations/{path}", get(locations::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
