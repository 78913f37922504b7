//! [`MemoryStore`]: the process-local backend.
//!
//! Volatile: everything is lost on restart. Per-subject counts are kept
//! alongside the vote map and adjusted under the same lock as each write,
//! so they never drift from the votes they summarise.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;

use crate::{
  Error, Result,
  identity::Identity,
  store::VoteStore,
  subject::{Subject, SubjectKey},
  vote::{Counts, Direction, UpsertOutcome, Vote},
};

#[derive(Default)]
struct Inner {
  subjects: BTreeMap<SubjectKey, Subject>,
  votes:    HashMap<(SubjectKey, Identity), Vote>,
  counts:   HashMap<SubjectKey, Counts>,
}

/// An in-memory vote store.
///
/// Cloning is cheap; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
    self.inner.read().map_err(|_| Error::unavailable("memory store lock poisoned"))
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
    self.inner.write().map_err(|_| Error::unavailable("memory store lock poisoned"))
  }

  /// Number of distinct vote records held.
  pub fn len(&self) -> Result<usize> { Ok(self.read()?.votes.len()) }

  pub fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }
}

impl VoteStore for MemoryStore {
  type Error = Error;

  async fn get_subject(&self, key: &SubjectKey) -> Result<Option<Subject>> {
    Ok(self.read()?.subjects.get(key).cloned())
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    Ok(self.read()?.subjects.values().cloned().collect())
  }

  async fn register_subject(&self, subject: Subject) -> Result<bool> {
    let subject = subject.normalized()?;
    let mut inner = self.write()?;
    if inner.subjects.contains_key(&subject.key) {
      return Ok(false);
    }
    inner.subjects.insert(subject.key.clone(), subject);
    Ok(true)
  }

  async fn get(&self, subject: &SubjectKey, identity: &Identity) -> Result<Option<Direction>> {
    let key = (subject.clone(), identity.clone());
    Ok(self.read()?.votes.get(&key).map(|v| v.direction))
  }

  async fn upsert(
    &self,
    subject:   &SubjectKey,
    identity:  &Identity,
    direction: Direction,
  ) -> Result<UpsertOutcome> {
    let key = (subject.clone(), identity.clone());
    let mut guard = self.write()?;
    let inner = &mut *guard;

    let outcome = match inner.votes.get_mut(&key) {
      Some(vote) if vote.direction == direction => return Ok(UpsertOutcome::replaced(direction)),
      Some(vote) => {
        let previous = vote.direction;
        vote.direction = direction;
        vote.updated_at = Utc::now();
        inner.counts.entry(subject.clone()).or_default().flip(previous);
        UpsertOutcome::replaced(previous)
      }
      None => {
        inner.votes.insert(key, Vote {
          subject: subject.clone(),
          identity: identity.clone(),
          direction,
          updated_at: Utc::now(),
        });
        inner.counts.entry(subject.clone()).or_default().add(direction);
        UpsertOutcome::created()
      }
    };
    Ok(outcome)
  }

  async fn counts_for(&self, subject: &SubjectKey) -> Result<Counts> {
    Ok(self.read()?.counts.get(subject).copied().unwrap_or_default())
  }
}
