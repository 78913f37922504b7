//! Behavioural checks every [`VoteStore`] backend must pass.
//!
//! Backends call [`run_all`] from their own test modules with a factory
//! that yields a fresh, empty store per check. Enabled outside this crate by
//! the `conformance` feature.

use std::future::Future;

use tokio::task::JoinSet;

use crate::{
  identity::Identity,
  store::VoteStore,
  subject::{Subject, SubjectKey, SubjectStatus},
  vote::{Counts, Direction, UpsertOutcome},
};

fn race() -> SubjectKey { SubjectKey::race("British Grand Prix", "2025-07-06").unwrap() }

fn race_date() -> chrono::NaiveDate {
  chrono::NaiveDate::from_ymd_opt(2025, 7, 6).unwrap()
}

fn prop(id: i64) -> SubjectKey { SubjectKey::proposition(id).unwrap() }

fn voter(n: usize) -> Identity { Identity::session(&format!("voter-{n}")).unwrap() }

/// Run every check against stores produced by `make`.
pub async fn run_all<S, F, Fut>(make: F)
where
  S: VoteStore + Clone + 'static,
  F: Fn() -> Fut,
  Fut: Future<Output = S>,
{
  first_vote_is_created(make().await).await;
  identical_resubmission_writes_nothing(make().await).await;
  changed_vote_moves_one_unit(make().await).await;
  subjects_and_identities_are_isolated(make().await).await;
  five_voters_tally(make().await).await;
  concurrent_voters_lose_nothing(make().await).await;
  subjects_register_once(make().await).await;
  unknown_subject_counts_zero(make().await).await;
  registered_keys_are_normalised(make().await).await;
}

pub async fn first_vote_is_created<S: VoteStore>(store: S) {
  let s = race();
  let id = voter(1);

  assert_eq!(store.get(&s, &id).await.unwrap(), None);
  let outcome = store.upsert(&s, &id, Direction::Yes).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::created());
  assert_eq!(store.get(&s, &id).await.unwrap(), Some(Direction::Yes));
  assert_eq!(store.counts_for(&s).await.unwrap(), Counts::new(1, 0));
}

pub async fn identical_resubmission_writes_nothing<S: VoteStore>(store: S) {
  let s = race();
  let id = voter(1);

  store.upsert(&s, &id, Direction::No).await.unwrap();
  let again = store.upsert(&s, &id, Direction::No).await.unwrap();
  assert!(again.is_unchanged(Direction::No));
  assert!(!again.created);
  assert_eq!(store.counts_for(&s).await.unwrap(), Counts::new(0, 1));
}

pub async fn changed_vote_moves_one_unit<S: VoteStore>(store: S) {
  let s = race();
  let id = voter(1);

  store.upsert(&s, &id, Direction::Yes).await.unwrap();
  let outcome = store.upsert(&s, &id, Direction::No).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::replaced(Direction::Yes));
  assert_eq!(store.get(&s, &id).await.unwrap(), Some(Direction::No));

  let counts = store.counts_for(&s).await.unwrap();
  assert_eq!(counts, Counts::new(0, 1));
  assert_eq!(counts.total(), 1);

  store.upsert(&s, &id, Direction::Yes).await.unwrap();
  assert_eq!(store.counts_for(&s).await.unwrap(), Counts::new(1, 0));
}

pub async fn subjects_and_identities_are_isolated<S: VoteStore>(store: S) {
  let (a, b) = (prop(1), prop(2));

  store.upsert(&a, &voter(1), Direction::Yes).await.unwrap();
  store.upsert(&b, &voter(1), Direction::No).await.unwrap();
  store.upsert(&a, &voter(2), Direction::No).await.unwrap();

  assert_eq!(store.get(&a, &voter(1)).await.unwrap(), Some(Direction::Yes));
  assert_eq!(store.get(&b, &voter(1)).await.unwrap(), Some(Direction::No));
  assert_eq!(store.get(&b, &voter(2)).await.unwrap(), None);
  assert_eq!(store.counts_for(&a).await.unwrap(), Counts::new(1, 1));
  assert_eq!(store.counts_for(&b).await.unwrap(), Counts::new(0, 1));
}

pub async fn five_voters_tally<S: VoteStore>(store: S) {
  let s = race();
  let ballots = [Direction::Yes, Direction::No, Direction::Yes, Direction::Yes, Direction::No];
  for (n, d) in ballots.into_iter().enumerate() {
    store.upsert(&s, &voter(n + 1), d).await.unwrap();
  }
  assert_eq!(store.counts_for(&s).await.unwrap(), Counts::new(3, 2));
}

pub async fn concurrent_voters_lose_nothing<S: VoteStore + Clone + 'static>(store: S) {
  const N: usize = 64;
  let mut tasks = JoinSet::new();
  for n in 0..N {
    let store = store.clone();
    tasks.spawn(async move {
      let direction = Direction::from(n % 3 != 0);
      store.upsert(&race(), &voter(n), direction).await.unwrap();
    });
  }
  while let Some(joined) = tasks.join_next().await {
    joined.unwrap();
  }

  let counts = store.counts_for(&race()).await.unwrap();
  assert_eq!(counts.total(), N as u64);
  assert_eq!(counts.no, (0..N).filter(|n| n % 3 == 0).count() as u64);
}

pub async fn subjects_register_once<S: VoteStore>(store: S) {
  let mut subject = Subject::new(prop(9), "Pole position in Suzuka?");
  subject.description = Some("Qualifying, Saturday".into());

  assert!(store.register_subject(subject.clone()).await.unwrap());

  let mut clash = Subject::new(prop(9), "Something else");
  clash.status = SubjectStatus::Closed;
  assert!(!store.register_subject(clash).await.unwrap());

  let fetched = store.get_subject(&prop(9)).await.unwrap().unwrap();
  assert_eq!(fetched.title, subject.title);
  assert_eq!(fetched.description, subject.description);
  assert_eq!(fetched.status, SubjectStatus::Active);

  assert_eq!(store.get_subject(&prop(10)).await.unwrap(), None);
  assert_eq!(store.list_subjects().await.unwrap().len(), 1);
}

pub async fn unknown_subject_counts_zero<S: VoteStore>(store: S) {
  assert_eq!(store.counts_for(&prop(404)).await.unwrap(), Counts::default());
}

pub async fn registered_keys_are_normalised<S: VoteStore>(store: S) {
  let padded = SubjectKey::Race { name: " British Grand Prix ".into(), date: race_date() };
  assert!(store.register_subject(Subject::new(padded, "Silverstone")).await.unwrap());

  let listed = store.list_subjects().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].key, race());
  assert!(store.get_subject(&race()).await.unwrap().is_some());

  let zero = Subject::new(SubjectKey::Proposition { id: 0 }, "Zero");
  assert!(store.register_subject(zero).await.is_err());
  assert_eq!(store.list_subjects().await.unwrap().len(), 1);
}
