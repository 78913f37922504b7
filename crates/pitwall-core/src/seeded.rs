//! [`SeededStore`]: file-seeded counts plus an in-process delta.
//!
//! This is the degraded fallback used when no relational store is
//! configured. Baseline tallies come from a static seed document; votes cast
//! during the process lifetime accumulate in a [`MemoryStore`] and are added
//! on top. Seeded votes are anonymous, so every live vote counts as new
//! relative to them.
//!
//! Visibility is limited to one process: two server instances never see
//! each other's deltas, and nothing survives a restart except the seed.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  error::Error,
  identity::Identity,
  memory::MemoryStore,
  store::VoteStore,
  subject::{Subject, SubjectKey},
  vote::{Counts, Direction, UpsertOutcome},
};

// ─── Seed document ───────────────────────────────────────────────────────────

/// Baseline tallies for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCount {
  pub subject: SubjectKey,
  #[serde(default)]
  pub yes:     u64,
  #[serde(default)]
  pub no:      u64,
}

/// The on-disk seed: registered subjects and their baseline counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
  #[serde(default)]
  pub subjects: Vec<Subject>,
  #[serde(default)]
  pub counts:   Vec<SeedCount>,
}

impl Seed {
  pub fn from_json(text: &str) -> Result<Self> { Ok(serde_json::from_str(text)?) }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SeededStore {
  baseline: Arc<HashMap<SubjectKey, Counts>>,
  delta:    MemoryStore,
}

impl SeededStore {
  /// Build a store from `seed`, registering its subjects.
  ///
  /// Duplicate count rows for the same subject are summed. A subject whose
  /// seeded tallies do not fit in a `u64` is a validation error.
  pub async fn new(seed: Seed) -> Result<Self> {
    let delta = MemoryStore::new();
    for subject in seed.subjects {
      delta.register_subject(subject).await?;
    }

    let mut baseline: HashMap<SubjectKey, Counts> = HashMap::new();
    for row in seed.counts {
      let entry = baseline.entry(row.subject.clone()).or_default();
      *entry = entry.checked_add(Counts::new(row.yes, row.no)).ok_or_else(|| {
        Error::validation(format!("seed counts for {} overflow", row.subject))
      })?;
    }

    Ok(Self { baseline: Arc::new(baseline), delta })
  }

  /// The seed tallies alone, without live votes.
  pub fn baseline(&self, subject: &SubjectKey) -> Counts {
    self.baseline.get(subject).copied().unwrap_or_default()
  }
}

impl VoteStore for SeededStore {
  type Error = Error;

  async fn get_subject(&self, key: &SubjectKey) -> Result<Option<Subject>> {
    self.delta.get_subject(key).await
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> { self.delta.list_subjects().await }

  async fn register_subject(&self, subject: Subject) -> Result<bool> {
    self.delta.register_subject(subject).await
  }

  async fn get(&self, subject: &SubjectKey, identity: &Identity) -> Result<Option<Direction>> {
    self.delta.get(subject, identity).await
  }

  async fn upsert(
    &self,
    subject:   &SubjectKey,
    identity:  &Identity,
    direction: Direction,
  ) -> Result<UpsertOutcome> {
    self.delta.upsert(subject, identity, direction).await
  }

  async fn counts_for(&self, subject: &SubjectKey) -> Result<Counts> {
    Ok(self.baseline(subject) + self.delta.counts_for(subject).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::conformance;

  fn monza() -> SubjectKey { SubjectKey::race("Italian Grand Prix", "2025-09-07").unwrap() }

  #[tokio::test]
  async fn conforms_with_empty_seed() {
    conformance::run_all(|| async { SeededStore::new(Seed::default()).await.unwrap() }).await;
  }

  #[tokio::test]
  async fn parses_seed_document() {
    let seed = Seed::from_json(
      r#"{
        "subjects": [
          {"key": {"kind": "proposition", "id": 1}, "title": "Win in Monza?"}
        ],
        "counts": [
          {"subject": {"kind": "race", "name": "Italian Grand Prix", "date": "2025-09-07"}, "yes": 12, "no": 4},
          {"subject": {"kind": "proposition", "id": 1}, "yes": 3}
        ]
      }"#,
    )
    .unwrap();
    assert_eq!(seed.subjects.len(), 1);
    assert_eq!(seed.counts.len(), 2);
    assert_eq!(seed.counts[1].no, 0);
  }

  #[tokio::test]
  async fn live_votes_add_to_baseline() {
    let store = SeededStore::new(Seed {
      subjects: vec![],
      counts:   vec![SeedCount { subject: monza(), yes: 12, no: 4 }],
    })
    .await
    .unwrap();

    let fan = Identity::session("fan").unwrap();
    store.upsert(&monza(), &fan, Direction::No).await.unwrap();
    assert_eq!(store.counts_for(&monza()).await.unwrap(), Counts::new(12, 5));

    store.upsert(&monza(), &fan, Direction::Yes).await.unwrap();
    assert_eq!(store.counts_for(&monza()).await.unwrap(), Counts::new(13, 4));
    assert_eq!(store.baseline(&monza()), Counts::new(12, 4));
  }

  #[tokio::test]
  async fn duplicate_seed_rows_are_summed() {
    let store = SeededStore::new(Seed {
      subjects: vec![],
      counts:   vec![
        SeedCount { subject: monza(), yes: 1, no: 1 },
        SeedCount { subject: monza(), yes: 2, no: 0 },
      ],
    })
    .await
    .unwrap();
    assert_eq!(store.counts_for(&monza()).await.unwrap(), Counts::new(3, 1));
  }

  #[tokio::test]
  async fn overflowing_seed_is_rejected() {
    let result = SeededStore::new(Seed {
      subjects: vec![],
      counts:   vec![
        SeedCount { subject: monza(), yes: u64::MAX, no: 0 },
        SeedCount { subject: monza(), yes: 1, no: 0 },
      ],
    })
    .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let split = SeededStore::new(Seed {
      subjects: vec![],
      counts:   vec![SeedCount { subject: monza(), yes: u64::MAX, no: 1 }],
    })
    .await;
    assert!(matches!(split, Err(Error::Validation(_))));
  }

  #[tokio::test]
  async fn saturated_seed_still_accepts_votes() {
    let store = SeededStore::new(Seed {
      subjects: vec![],
      counts:   vec![SeedCount { subject: monza(), yes: u64::MAX, no: 0 }],
    })
    .await
    .unwrap();
    let svc = crate::service::VoteService::new(Arc::new(store));

    let sub = svc
      .submit(crate::service::Ballot {
        subject:   monza(),
        identity:  Identity::session("fan").unwrap(),
        direction: Direction::Yes,
      })
      .await
      .unwrap();
    assert_eq!(sub.aggregate.yes, u64::MAX);
    assert_eq!(sub.aggregate.total, u64::MAX);
    assert_eq!(sub.aggregate.win_probability, 100);
  }
}
