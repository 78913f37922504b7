//! [`SqliteStore`]: the SQLite implementation of [`VoteStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use pitwall_core::{
  identity::Identity,
  store::VoteStore,
  subject::{Subject, SubjectKey},
  vote::{Counts, Direction, UpsertOutcome},
};

use crate::{
  encode::{RawSubject, SUBJECT_COLUMNS, decode_direction, encode_direction, encode_dt},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A vote store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// How long a write waits on another connection's lock before failing
  /// with `SQLITE_BUSY`. Defaults to two seconds.
  pub async fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── VoteStore impl ──────────────────────────────────────────────────────────

impl VoteStore for SqliteStore {
  type Error = crate::Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn get_subject(&self, key: &SubjectKey) -> Result<Option<Subject>> {
    let key_str = key.to_string();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_key = ?1"),
              rusqlite::params![key_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY subject_key"))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn register_subject(&self, subject: Subject) -> Result<bool> {
    let subject = subject.normalized()?;
    let key_str     = subject.key.to_string();
    let status_str  = subject.status.as_str();
    let expires_str = subject.expires_at.map(encode_dt);
    let created_str = encode_dt(subject.created_at);
    let Subject { title, description, .. } = subject;

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO subjects (
             subject_key, title, description, status, expires_at, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![key_str, title, description, status_str, expires_str, created_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    Ok(inserted)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn get(&self, subject: &SubjectKey, identity: &Identity) -> Result<Option<Direction>> {
    let key_str = subject.to_string();
    let id_str  = identity.as_str().to_owned();

    let yes: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT direction FROM votes WHERE subject_key = ?1 AND identity = ?2",
              rusqlite::params![key_str, id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(yes.map(decode_direction))
  }

  async fn upsert(
    &self,
    subject:   &SubjectKey,
    identity:  &Identity,
    direction: Direction,
  ) -> Result<UpsertOutcome> {
    let key_str = subject.to_string();
    let id_str  = identity.as_str().to_owned();
    let yes     = encode_direction(direction);
    let at_str  = encode_dt(Utc::now());

    // The read of the previous row and the upsert share one IMMEDIATE
    // transaction, so no other connection can write between them.
    let previous: Option<bool> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<bool> = tx
          .query_row(
            "SELECT direction FROM votes WHERE subject_key = ?1 AND identity = ?2",
            rusqlite::params![key_str, id_str],
            |r| r.get(0),
          )
          .optional()?;

        if previous == Some(yes) {
          return Ok(previous);
        }

        tx.execute(
          "INSERT INTO votes (subject_key, identity, direction, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)
           ON CONFLICT (subject_key, identity) DO UPDATE
             SET direction  = excluded.direction,
                 updated_at = excluded.updated_at",
          rusqlite::params![key_str, id_str, yes, at_str],
        )?;
        tx.commit()?;
        Ok(previous)
      })
      .await?;

    Ok(match previous.map(decode_direction) {
      Some(prev) => UpsertOutcome::replaced(prev),
      None => UpsertOutcome::created(),
    })
  }

  async fn counts_for(&self, subject: &SubjectKey) -> Result<Counts> {
    let key_str = subject.to_string();

    let row: Option<(i64, i64)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT yes_votes, no_votes FROM vote_summary WHERE subject_key = ?1",
              rusqlite::params![key_str],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let (yes, no) = row.unwrap_or_default();
    Ok(Counts::new(yes.max(0) as u64, no.max(0) as u64))
  }
}
