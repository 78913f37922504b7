//! Integration tests for `SqliteStore`.

use chrono::{Duration, Utc};
use pitwall_core::{
  conformance,
  identity::Identity,
  service::{Ballot, VoteService},
  store::VoteStore,
  subject::{Subject, SubjectKey, SubjectStatus},
  vote::{Counts, Direction},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn hungary() -> SubjectKey { SubjectKey::race("Hungarian Grand Prix", "2025-08-03").unwrap() }

// ─── Contract ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn conforms() {
  conformance::run_all(store).await;
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subject_fields_roundtrip() {
  let s = store().await;
  let expires = Utc::now() + Duration::days(3);

  let mut subject = Subject::new(SubjectKey::proposition(12).unwrap(), "Points finish in Baku?");
  subject.description = Some("Top ten at the chequered flag".into());
  subject.status = SubjectStatus::Closed;
  subject.expires_at = Some(expires);
  s.register_subject(subject.clone()).await.unwrap();

  let fetched = s.get_subject(&subject.key).await.unwrap().unwrap();
  assert_eq!(fetched, subject);
}

#[tokio::test]
async fn list_subjects_is_ordered_by_key() {
  let s = store().await;
  for id in [3, 1, 2] {
    let key = SubjectKey::proposition(id).unwrap();
    s.register_subject(Subject::new(key, format!("#{id}"))).await.unwrap();
  }
  let titles: Vec<_> = s.list_subjects().await.unwrap().into_iter().map(|s| s.title).collect();
  assert_eq!(titles, ["#1", "#2", "#3"]);
}

#[tokio::test]
async fn padded_closed_race_stays_closed() {
  let svc = VoteService::new(std::sync::Arc::new(store().await));
  let date = chrono::NaiveDate::from_ymd_opt(2025, 5, 25).unwrap();

  let mut closed = Subject::new(SubjectKey::Race { name: "Monaco ".into(), date }, "Monaco");
  closed.status = SubjectStatus::Closed;
  svc.store().register_subject(closed).await.unwrap();

  let key = SubjectKey::race("Monaco ", "2025-05-25").unwrap();
  let listed = svc.store().list_subjects().await.unwrap();
  assert_eq!(listed[0].key, key);
  assert_eq!(listed[0].key.to_string(), "race:2025-05-25:Monaco");

  let ballot = Ballot {
    subject:   key.clone(),
    identity:  Identity::session("late").unwrap(),
    direction: Direction::Yes,
  };
  let err = svc.submit(ballot).await.unwrap_err();
  assert!(matches!(err, pitwall_core::Error::NotFound(_)));
  assert_eq!(svc.store().counts_for(&key).await.unwrap(), Counts::default());
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn summary_view_tracks_flips() {
  let s = store().await;
  let a = Identity::session("a").unwrap();
  let b = Identity::session("b").unwrap();

  s.upsert(&hungary(), &a, Direction::Yes).await.unwrap();
  s.upsert(&hungary(), &b, Direction::Yes).await.unwrap();
  s.upsert(&hungary(), &a, Direction::No).await.unwrap();
  assert_eq!(s.counts_for(&hungary()).await.unwrap(), Counts::new(1, 1));
}

#[tokio::test]
async fn email_identities_are_deduplicated() {
  let svc = VoteService::new(std::sync::Arc::new(store().await));
  let key = SubjectKey::proposition(4).unwrap();
  svc.store().register_subject(Subject::new(key.clone(), "Win in Austin?")).await.unwrap();

  let ballot = |email: &str, direction| Ballot {
    subject: key.clone(),
    identity: Identity::email(email).unwrap(),
    direction,
  };

  svc.submit(ballot("fan@example.com", Direction::Yes)).await.unwrap();
  let dup = svc.submit(ballot("FAN@example.com", Direction::Yes)).await;
  assert!(matches!(dup, Err(pitwall_core::Error::DuplicateVote)));

  let sub = svc.submit(ballot("fan@example.com", Direction::No)).await.unwrap();
  assert_eq!(sub.aggregate.total, 1);
  assert_eq!(sub.aggregate.no, 1);
}

fn temp_db(tag: &str) -> std::path::PathBuf {
  std::env::temp_dir().join(format!(
    "pitwall-{tag}-{}-{}.db",
    std::process::id(),
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
  ))
}

fn remove_db(path: &std::path::Path) {
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}

#[tokio::test]
async fn votes_survive_reopen() {
  let path = temp_db("reopen");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.upsert(&hungary(), &Identity::session("x").unwrap(), Direction::No).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.counts_for(&hungary()).await.unwrap(), Counts::new(0, 1));
  assert_eq!(
    s.get(&hungary(), &Identity::session("x").unwrap()).await.unwrap(),
    Some(Direction::No)
  );

  drop(s);
  remove_db(&path);
}

// ─── Locking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn locked_database_asks_for_retry() {
  let path = temp_db("busy");
  let s = SqliteStore::open(&path).await.unwrap();
  s.set_busy_timeout(std::time::Duration::from_millis(20)).await.unwrap();

  let blocker = rusqlite::Connection::open(&path).unwrap();
  blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();

  let who = Identity::session("pit").unwrap();
  let err = s.upsert(&hungary(), &who, Direction::Yes).await.unwrap_err();
  assert!(err.is_busy(), "{err}");
  assert!(matches!(pitwall_core::Error::from(err), pitwall_core::Error::ConflictRetry));

  let svc = VoteService::new(std::sync::Arc::new(s.clone()));
  let ballot = Ballot { subject: hungary(), identity: who.clone(), direction: Direction::Yes };
  let err = svc.submit(ballot.clone()).await.unwrap_err();
  assert!(matches!(err, pitwall_core::Error::StoreUnavailable(_)));

  blocker.execute_batch("ROLLBACK;").unwrap();
  let sub = svc.submit(ballot).await.unwrap();
  assert_eq!(sub.aggregate.total, 1);

  drop((svc, s, blocker));
  remove_db(&path);
}
