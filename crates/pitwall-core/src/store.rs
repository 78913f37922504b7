//! The `VoteStore` trait.
//!
//! The trait is implemented by storage backends: [`MemoryStore`] and
//! [`SeededStore`] in this crate, `SqliteStore` in `pitwall-store-sqlite`.
//! The submission service and the HTTP layer depend on this abstraction,
//! never on a concrete backend.
//!
//! [`MemoryStore`]: crate::memory::MemoryStore
//! [`SeededStore`]: crate::seeded::SeededStore

use std::future::Future;

use crate::{
  identity::Identity,
  subject::{Subject, SubjectKey},
  vote::{Counts, Direction, UpsertOutcome},
};

/// Keyed storage of `(subject, identity) → latest direction`.
///
/// At most one vote exists per `(subject, identity)` pair. [`upsert`]
/// must be atomic per key: the read of the previous direction and the write
/// of the new one cannot interleave with another writer for the same key.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
///
/// [`upsert`]: VoteStore::upsert
pub trait VoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Retrieve a registered subject. Returns `None` if not found.
  fn get_subject<'a>(
    &'a self,
    key: &'a SubjectKey,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// List all registered subjects.
  fn list_subjects(&self) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Register a subject if its key is not already taken.
  ///
  /// Seed and admin path only; the voting flow never creates subjects.
  /// Returns `false` when a subject with the same key already exists.
  fn register_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// The direction currently on record for `(subject, identity)`.
  fn get<'a>(
    &'a self,
    subject: &'a SubjectKey,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<Option<Direction>, Self::Error>> + Send + 'a;

  /// Record `direction` as the latest vote for `(subject, identity)`.
  ///
  /// A first vote creates the record; a different direction replaces it,
  /// moving one unit between buckets. Re-submitting the recorded direction
  /// writes nothing and reports `previous == Some(direction)`.
  fn upsert<'a>(
    &'a self,
    subject: &'a SubjectKey,
    identity: &'a Identity,
    direction: Direction,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + 'a;

  /// Current yes/no tallies for a subject; zero for unknown subjects.
  fn counts_for<'a>(
    &'a self,
    subject: &'a SubjectKey,
  ) -> impl Future<Output = Result<Counts, Self::Error>> + Send + 'a;
}
