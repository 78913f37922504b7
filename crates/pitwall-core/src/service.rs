//! The vote submission service.
//!
//! Owns the write path into a [`VoteStore`]: it resolves the subject,
//! enforces the duplicate/change rule, performs exactly one upsert, and
//! returns freshly aggregated counts. Read-only callers may use
//! [`VoteService::tally`], which never writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  aggregate::Aggregate,
  identity::Identity,
  store::VoteStore,
  subject::{Subject, SubjectKey},
  vote::{Direction, UpsertOutcome},
};

/// A validated vote request in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
  pub subject:   SubjectKey,
  pub identity:  Identity,
  pub direction: Direction,
}

/// The result of a successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
  /// The registered subject, if any. Unregistered race keys yield `None`.
  pub subject:   Option<Subject>,
  pub aggregate: Aggregate,
  /// The direction now on record for the voter.
  pub direction: Direction,
  pub outcome:   UpsertOutcome,
}

/// Counts for a subject plus, optionally, one voter's current choice.
#[derive(Debug, Clone)]
pub struct Tally {
  pub subject:   Option<Subject>,
  pub aggregate: Aggregate,
  pub user_vote: Option<Direction>,
}

pub struct VoteService<S> {
  store: Arc<S>,
}

impl<S> Clone for VoteService<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: VoteStore> VoteService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// The underlying store, for read-only display queries.
  pub fn store(&self) -> &S { &self.store }

  /// Accept `ballot`, returning refreshed aggregate counts.
  pub async fn submit(&self, ballot: Ballot) -> Result<Submission> {
    self.submit_at(ballot, Utc::now()).await
  }

  /// As [`submit`](Self::submit), evaluating subject expiry at `now`.
  pub async fn submit_at(&self, ballot: Ballot, now: DateTime<Utc>) -> Result<Submission> {
    let Ballot { subject: key, identity, direction } = ballot;
    let key = key.normalized()?;

    let subject = self.open_subject(&key, now).await?;

    let current = self.store.get(&key, &identity).await.map_err(store_err)?;
    if current == Some(direction) {
      return Err(Error::DuplicateVote);
    }

    let outcome = self.upsert_with_retry(&key, &identity, direction).await?;
    // A concurrent request from the same voter got there first.
    if outcome.is_unchanged(direction) {
      return Err(Error::DuplicateVote);
    }

    tracing::debug!(
      subject = %key,
      direction = %direction,
      created = outcome.created,
      "vote recorded"
    );

    let counts = self.store.counts_for(&key).await.map_err(store_err)?;
    Ok(Submission {
      subject,
      aggregate: Aggregate::from(counts),
      direction,
      outcome,
    })
  }

  /// Aggregate for `key`, and the recorded direction of `identity` if given.
  pub async fn tally(&self, key: &SubjectKey, identity: Option<&Identity>) -> Result<Tally> {
    let key = &key.clone().normalized()?;
    let subject = self.store.get_subject(key).await.map_err(store_err)?;
    if subject.is_none() && key.requires_registration() {
      return Err(Error::NotFound(format!("subject {key} not found")));
    }

    let counts = self.store.counts_for(key).await.map_err(store_err)?;
    let user_vote = match identity {
      Some(id) => self.store.get(key, id).await.map_err(store_err)?,
      None => None,
    };
    Ok(Tally { subject, aggregate: Aggregate::from(counts), user_vote })
  }

  /// The direction on record for `(key, identity)`.
  pub async fn current_vote(&self, key: &SubjectKey, identity: &Identity) -> Result<Option<Direction>> {
    self.store.get(key, identity).await.map_err(store_err)
  }

  /// Every registered subject with its aggregate.
  pub async fn list(&self) -> Result<Vec<(Subject, Aggregate)>> {
    let subjects = self.store.list_subjects().await.map_err(store_err)?;
    let mut out = Vec::with_capacity(subjects.len());
    for subject in subjects {
      let counts = self.store.counts_for(&subject.key).await.map_err(store_err)?;
      out.push((subject, Aggregate::from(counts)));
    }
    Ok(out)
  }

  async fn open_subject(&self, key: &SubjectKey, now: DateTime<Utc>) -> Result<Option<Subject>> {
    match self.store.get_subject(key).await.map_err(store_err)? {
      Some(subject) if subject.is_open(now) => Ok(Some(subject)),
      Some(_) => Err(Error::NotFound(format!("subject {key} is not open for voting"))),
      None if key.requires_registration() => {
        Err(Error::NotFound(format!("subject {key} not found")))
      }
      None => Ok(None),
    }
  }

  async fn upsert_with_retry(
    &self,
    key:       &SubjectKey,
    identity:  &Identity,
    direction: Direction,
  ) -> Result<UpsertOutcome> {
    match self.store.upsert(key, identity, direction).await.map_err(store_err) {
      Err(Error::ConflictRetry) => {
        tracing::warn!(subject = %key, "write conflict, retrying once");
        match self.store.upsert(key, identity, direction).await.map_err(store_err) {
          Err(Error::ConflictRetry) => {
            Err(Error::unavailable(format!("write conflict persisted for {key}")))
          }
          other => other,
        }
      }
      other => other,
    }
  }
}

fn store_err<E: Into<Error>>(e: E) -> Error { e.into() }
