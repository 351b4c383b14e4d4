//! grove server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! SQLite store and serves the post API over HTTP.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use grove_api::{
  AppState, Callbacks, HttpCallback, HttpIdentityResolver, MemoryCache,
  StaticIdentities,
};
use grove_core::{identity::IdentityResolver, path::PathQuery};
use grove_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Grove post store server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let layered = settings::defaults()
    .context("invalid built-in defaults")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(settings::environment())
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = layered
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(dir) = store_path.parent() {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {dir:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(Arc::new(store), identity_resolver(&server_cfg))
    .with_cache(Arc::new(
      MemoryCache::new(server_cfg.cache_capacity)
        .with_ttl(Duration::from_secs(server_cfg.cache_ttl_secs)),
    ))
    .with_callbacks(callbacks(&server_cfg)?)
    .with_config(server_cfg.api());

  let app = grove_api::router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn identity_resolver(cfg: &ServerConfig) -> Arc<dyn IdentityResolver> {
  if let Some(url) = &cfg.identity.url {
    tracing::info!(%url, "resolving sessions through the identity service");
    return Arc::new(HttpIdentityResolver::new(url.clone()));
  }
  tracing::warn!(
    sessions = cfg.identity.sessions.len(),
    "no identity service configured; using the static session table"
  );
  Arc::new(StaticIdentities::new(cfg.identity.sessions.clone()))
}

fn callbacks(cfg: &ServerConfig) -> anyhow::Result<Callbacks> {
  let mut callbacks = Callbacks::new();
  for cb in &cfg.callbacks {
    let scope = PathQuery::parse(&cb.path)
      .with_context(|| format!("invalid callback path {:?}", cb.path))?;
    tracing::info!(url = %cb.url, path = %cb.path, "registered callback");
    callbacks.register(scope, Arc::new(HttpCallback::new(cb.url.clone())));
  }
  Ok(callbacks)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
