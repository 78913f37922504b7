//! Backend selection.
//!
//! Chooses one store per process from what the environment provides, in a
//! fixed order: the SQLite database if configured and openable, otherwise
//! the seed file plus in-process accumulation, otherwise an empty
//! in-memory store. Each fallback step is logged, never raised. Data
//! written to one backend is not visible to another.

use std::path::Path;

use anyhow::Context as _;
use pitwall_core::{
  identity::Identity,
  memory::MemoryStore,
  seeded::{Seed, SeededStore},
  store::VoteStore,
  subject::{Subject, SubjectKey},
  vote::{Counts, Direction, UpsertOutcome},
};
use pitwall_store_sqlite::SqliteStore;

use crate::{ServerConfig, expand_tilde};

/// The store chosen for this process.
#[derive(Clone)]
pub enum Backend {
  Sqlite(SqliteStore),
  Seeded(SeededStore),
  Memory(MemoryStore),
}

impl Backend {
  pub fn name(&self) -> &'static str {
    match self {
      Backend::Sqlite(_) => "sqlite",
      Backend::Seeded(_) => "seeded",
      Backend::Memory(_) => "memory",
    }
  }
}

/// Pick a backend for `config`. Never fails; the last resort is memory.
pub async fn select(config: &ServerConfig) -> Backend {
  let seed = match &config.seed_path {
    Some(path) => match load_seed(&expand_tilde(path)).await {
      Ok(seed) => Some(seed),
      Err(e) => {
        tracing::warn!(error = %format!("{e:#}"), "seed file unusable, continuing without it");
        None
      }
    },
    None => None,
  };

  if let Some(path) = &config.database_path {
    let path = expand_tilde(path);
    match open_sqlite(&path, seed.as_ref()).await {
      Ok(store) => {
        tracing::info!(path = %path.display(), "using sqlite vote store");
        return Backend::Sqlite(store);
      }
      Err(e) => {
        tracing::warn!(
          path = %path.display(),
          error = %format!("{e:#}"),
          "sqlite store unavailable, falling back"
        );
      }
    }
  } else {
    tracing::info!("no database configured");
  }

  if let Some(seed) = seed {
    match SeededStore::new(seed).await {
      Ok(store) => {
        tracing::info!("using seeded in-memory vote store");
        return Backend::Seeded(store);
      }
      Err(e) => tracing::warn!(error = %e, "seeded store unavailable, falling back"),
    }
  }

  tracing::warn!("using volatile in-memory vote store; votes are lost on restart");
  Backend::Memory(MemoryStore::new())
}

async fn load_seed(path: &Path) -> anyhow::Result<Seed> {
  let text = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  Seed::from_json(&text).with_context(|| format!("failed to parse seed file {path:?}"))
}

async fn open_sqlite(path: &Path, seed: Option<&Seed>) -> anyhow::Result<SqliteStore> {
  let store = SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;

  if let Some(seed) = seed {
    let mut registered = 0;
    for subject in &seed.subjects {
      if store.register_subject(subject.clone()).await? {
        registered += 1;
      }
    }
    tracing::info!(registered, "seeded subjects into sqlite store");
    if !seed.counts.is_empty() {
      tracing::info!("seed counts are ignored by the sqlite store");
    }
  }
  Ok(store)
}

// ─── VoteStore impl ──────────────────────────────────────────────────────────

impl VoteStore for Backend {
  type Error = pitwall_core::Error;

  async fn get_subject(&self, key: &SubjectKey) -> pitwall_core::Result<Option<Subject>> {
    match self {
      Backend::Sqlite(s) => s.get_subject(key).await.map_err(Into::into),
      Backend::Seeded(s) => s.get_subject(key).await,
      Backend::Memory(s) => s.get_subject(key).await,
    }
  }

  async fn list_subjects(&self) -> pitwall_core::Result<Vec<Subject>> {
    match self {
      Backend::Sqlite(s) => s.list_subjects().await.map_err(Into::into),
      Backend::Seeded(s) => s.list_subjects().await,
      Backend::Memory(s) => s.list_subjects().await,
    }
  }

  async fn register_subject(&self, subject: Subject) -> pitwall_core::Result<bool> {
    match self {
      Backend::Sqlite(s) => s.register_subject(subject).await.map_err(Into::into),
      Backend::Seeded(s) => s.register_subject(subject).await,
      Backend::Memory(s) => s.register_subject(subject).await,
    }
  }

  async fn get(
    &self,
    subject:  &SubjectKey,
    identity: &Identity,
  ) -> pitwall_core::Result<Option<Direction>> {
    match self {
      Backend::Sqlite(s) => s.get(subject, identity).await.map_err(Into::into),
      Backend::Seeded(s) => s.get(subject, identity).await,
      Backend::Memory(s) => s.get(subject, identity).await,
    }
  }

  async fn upsert(
    &self,
    subject:   &SubjectKey,
    identity:  &Identity,
    direction: Direction,
  ) -> pitwall_core::Result<UpsertOutcome> {
    match self {
      Backend::Sqlite(s) => s.upsert(subject, identity, direction).await.map_err(Into::into),
      Backend::Seeded(s) => s.upsert(subject, identity, direction).await,
      Backend::Memory(s) => s.upsert(subject, identity, direction).await,
    }
  }

  async fn counts_for(&self, subject: &SubjectKey) -> pitwall_core::Result<Counts> {
    match self {
      Backend::Sqlite(s) => s.counts_for(subject).await.map_err(Into::into),
      Backend::Seeded(s) => s.counts_for(subject).await,
      Backend::Memory(s) => s.counts_for(subject).await,
    }
  }
}
