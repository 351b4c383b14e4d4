//! Server configuration.
//!
//! Built-in defaults, then `config.toml`, then `GROVE_*` environment
//! variables (`__` separates nested keys, e.g. `GROVE_IDENTITY__URL`).

use std::{collections::HashMap, path::PathBuf};

use config::{ConfigBuilder, ConfigError, Environment, builder::DefaultState};
use grove_api::{
  ApiConfig,
  cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL},
};
use grove_core::{
  identity::Identity,
  store::{DEFAULT_POST_LIMIT, MAX_POST_LIMIT},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  pub default_limit:  usize,
  pub max_limit:      usize,
  pub cache_capacity: usize,
  /// Seconds a cached post is served before it is read again.
  pub cache_ttl_secs: u64,
  #[serde(default)]
  pub identity:       IdentityConfig,
  #[serde(default)]
  pub callbacks:      Vec<CallbackConfig>,
}

/// Where identities come from. `url` wins when both are set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
  /// Base URL of the external identity service.
  pub url:      Option<String>,
  /// Static session table, for development.
  #[serde(default)]
  pub sessions: HashMap<String, Identity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackConfig {
  pub url:  String,
  /// Path query the callback guards, e.g. `acme.forum.*`.
  pub path: String,
}

impl ServerConfig {
  pub fn api(&self) -> ApiConfig {
    ApiConfig {
      default_limit: self.default_limit.min(self.max_limit),
      max_limit:     self.max_limit,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// A builder holding the defaults. Callers add files and the environment.
pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 4300)?
    .set_default("store_path", "~/.local/share/grove/grove.db")?
    .set_default("default_limit", DEFAULT_POST_LIMIT as u64)?
    .set_default("max_limit", MAX_POST_LIMIT as u64)?
    .set_default("cache_capacity", DEFAULT_CACHE_CAPACITY as u64)?
    .set_default("cache_ttl_secs", DEFAULT_CACHE_TTL.as_secs())
}

pub fn environment() -> Environment {
  Environment::with_prefix("GROVE").separator("__")
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  fn load(toml: &str) -> ServerConfig {
    defaults()
      .unwrap()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_fill_missing_keys() {
    let cfg = load("");
    assert_eq!(cfg.address(), "127.0.0.1:4300");
    assert_eq!(cfg.default_limit, 20);
    assert_eq!(cfg.max_limit, 100);
    assert_eq!(cfg.cache_ttl_secs, 300);
    assert!(cfg.identity.url.is_none());
    assert!(cfg.callbacks.is_empty());
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = load(
      r#"
        port = 8080
        max_limit = 50
        cache_ttl_secs = 30

        [identity]
        url = "http://identity.local"

        [identity.sessions.dev]
        id = 1
        god = true
        realm = "acme"

        [[callbacks]]
        url = "http://moderation.local/check"
        path = "acme.forum.*"
      "#,
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.api().max_limit, 50);
    assert_eq!(cfg.cache_ttl_secs, 30);
    assert_eq!(cfg.identity.url.as_deref(), Some("http://identity.local"));
    let dev = &cfg.identity.sessions["dev"];
    assert!(dev.is_privileged_in("acme"));
    assert_eq!(cfg.callbacks[0].path, "acme.forum.*");
  }

  #[test]
  fn default_limit_never_exceeds_the_cap() {
    let cfg = load("default_limit = 500\nmax_limit = 100");
    assert_eq!(cfg.api().default_limit, 100);
  }
}
