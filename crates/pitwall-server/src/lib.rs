//! Server wiring for pitwall: configuration, backend selection, and the
//! top-level HTTP router.

pub mod backend;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use pitwall_core::service::VoteService;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use backend::Backend;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PITWALL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  /// SQLite database file. When absent or unopenable the server falls back
  /// to the seed file and in-memory accumulation.
  #[serde(default)]
  pub database_path:    Option<PathBuf>,
  /// JSON seed document with subjects and baseline counts.
  #[serde(default)]
  pub seed_path:        Option<PathBuf>,
  #[serde(default = "default_store_timeout_ms")]
  pub store_timeout_ms: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_timeout_ms() -> u64 { 5000 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      database_path:    None,
      seed_path:        None,
      store_timeout_ms: default_store_timeout_ms(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router over `backend`.
pub fn router(backend: Backend, config: &ServerConfig) -> Router {
  let service = VoteService::new(Arc::new(backend));
  pitwall_api::api_router(service, config.store_timeout()).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ────────────────────────────────────────────────────────
