//! Subject: a votable proposition or event instance.
//!
//! Subjects are created out-of-band (seed data or an admin insert) and are
//! never created by the voting flow. Only their aggregate counters change
//! while they are active.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// Natural or surrogate identifier of a subject.
///
/// Race predictions are keyed by race name plus ISO date; propositions by a
/// numeric id. Both encode to a single canonical string (see [`Display`]).
///
/// Deserialised keys pass through the same constructors as request input,
/// so a seed file cannot introduce a key no request could produce.
///
/// [`Display`]: fmt::Display
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", try_from = "RawSubjectKey")]
pub enum SubjectKey {
  Race { name: String, date: NaiveDate },
  Proposition { id: i64 },
}

/// Unvalidated wire form of [`SubjectKey`].
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawSubjectKey {
  Race { name: String, date: NaiveDate },
  Proposition { id: i64 },
}

impl TryFrom<RawSubjectKey> for SubjectKey {
  type Error = Error;

  fn try_from(raw: RawSubjectKey) -> Result<Self> {
    match raw {
      RawSubjectKey::Race { name, date } => Self::race_on(&name, date),
      RawSubjectKey::Proposition { id } => Self::proposition(id),
    }
  }
}

impl SubjectKey {
  /// Build a race key from raw request fields.
  pub fn race(name: &str, date: &str) -> Result<Self> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
      .map_err(|_| Error::validation(format!("invalid race date: {date:?}")))?;
    Self::race_on(name, date)
  }

  fn race_on(name: &str, date: NaiveDate) -> Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::validation("race name must not be empty"));
    }
    Ok(Self::Race { name: name.to_owned(), date })
  }

  /// Re-run construction-time validation on a key built directly from its
  /// variant fields. Race names are trimmed; non-positive ids are rejected.
  pub fn normalized(self) -> Result<Self> {
    match self {
      Self::Race { name, date } => Self::race_on(&name, date),
      Self::Proposition { id } => Self::proposition(id),
    }
  }

  pub fn proposition(id: i64) -> Result<Self> {
    if id <= 0 {
      return Err(Error::validation(format!("invalid prediction id: {id}")));
    }
    Ok(Self::Proposition { id })
  }

  /// Whether a vote on this key requires a registered [`Subject`].
  ///
  /// Race predictions are open by default; propositions must exist.
  pub fn requires_registration(&self) -> bool {
    matches!(self, Self::Proposition { .. })
  }
}

impl fmt::Display for SubjectKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Race { name, date } => write!(f, "race:{}:{name}", date.format("%Y-%m-%d")),
      Self::Proposition { id } => write!(f, "proposition:{id}"),
    }
  }
}

impl FromStr for SubjectKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let bad = || Error::validation(format!("invalid subject key: {s:?}"));
    match s.split_once(':') {
      Some(("race", rest)) => {
        let (date, name) = rest.split_once(':').ok_or_else(bad)?;
        Self::race(name, date)
      }
      Some(("proposition", id)) => Self::proposition(id.parse().map_err(|_| bad())?),
      _ => Err(bad()),
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle of a subject: `active → closed → resolved`, never reversing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
  #[default]
  Active,
  Closed,
  Resolved,
}

impl SubjectStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Closed => "closed",
      Self::Resolved => "resolved",
    }
  }

  /// Move to `to`, rejecting any transition that goes backwards.
  pub fn advance(self, to: Self) -> Result<Self> {
    if to < self {
      return Err(Error::validation(format!(
        "cannot move subject from {} back to {}",
        self.as_str(),
        to.as_str()
      )));
    }
    Ok(to)
  }
}

impl FromStr for SubjectStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "active" => Ok(Self::Active),
      "closed" => Ok(Self::Closed),
      "resolved" => Ok(Self::Resolved),
      other => Err(Error::validation(format!("unknown subject status: {other:?}"))),
    }
  }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub key:         SubjectKey,
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub status:      SubjectStatus,
  #[serde(default)]
  pub expires_at:  Option<DateTime<Utc>>,
  #[serde(default = "Utc::now")]
  pub created_at:  DateTime<Utc>,
}

impl Subject {
  /// Normalise the key before the subject is stored.
  pub fn normalized(mut self) -> Result<Self> {
    self.key = self.key.normalized()?;
    Ok(self)
  }

  pub fn new(key: SubjectKey, title: impl Into<String>) -> Self {
    Self {
      key,
      title: title.into(),
      description: None,
      status: SubjectStatus::Active,
      expires_at: None,
      created_at: Utc::now(),
    }
  }

  /// Votes are accepted only while active and not past expiry.
  pub fn is_open(&self, now: DateTime<Utc>) -> bool {
    self.status == SubjectStatus::Active && self.expires_at.is_none_or(|at| now < at)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[test]
  fn key_text_encoding_is_reversible() {
    let race = SubjectKey::race("Monaco Grand Prix", "2025-05-25").unwrap();
    assert_eq!(race.to_string(), "race:2025-05-25:Monaco Grand Prix");
    assert_eq!("race:2025-05-25:Monaco Grand Prix".parse::<SubjectKey>().unwrap(), race);

    let prop = SubjectKey::proposition(7).unwrap();
    assert_eq!(prop.to_string(), "proposition:7");
    assert_eq!("proposition:7".parse::<SubjectKey>().unwrap(), prop);
  }

  #[test]
  fn race_name_may_contain_colons() {
    let key: SubjectKey = "race:2025-03-16:Round 1: Australia".parse().unwrap();
    assert_eq!(key, SubjectKey::race("Round 1: Australia", "2025-03-16").unwrap());
  }

  #[test]
  fn malformed_keys_are_rejected() {
    assert!(SubjectKey::race("", "2025-05-25").is_err());
    assert!(SubjectKey::race("Monaco", "25/05/2025").is_err());
    assert!(SubjectKey::proposition(0).is_err());
    assert!("poll:3".parse::<SubjectKey>().is_err());
    assert!("proposition:abc".parse::<SubjectKey>().is_err());
  }

  #[test]
  fn deserialised_keys_are_validated() {
    let key: SubjectKey =
      serde_json::from_str(r#"{"kind":"race","name":"Monaco ","date":"2025-05-25"}"#).unwrap();
    assert_eq!(key, SubjectKey::race("Monaco", "2025-05-25").unwrap());

    assert!(serde_json::from_str::<SubjectKey>(r#"{"kind":"proposition","id":0}"#).is_err());
    assert!(serde_json::from_str::<SubjectKey>(r#"{"kind":"proposition","id":-4}"#).is_err());
    assert!(
      serde_json::from_str::<SubjectKey>(r#"{"kind":"race","name":"  ","date":"2025-05-25"}"#)
        .is_err()
    );
  }

  #[test]
  fn directly_built_keys_normalise() {
    let raw = SubjectKey::Race {
      name: " Monaco ".into(),
      date: NaiveDate::from_ymd_opt(2025, 5, 25).unwrap(),
    };
    let key = raw.normalized().unwrap();
    assert_eq!(key.to_string(), "race:2025-05-25:Monaco");
    assert_eq!(key.to_string().parse::<SubjectKey>().unwrap(), key);
    assert!(SubjectKey::Proposition { id: 0 }.normalized().is_err());
  }

  #[test]
  fn status_never_moves_backwards() {
    let closed = SubjectStatus::Active.advance(SubjectStatus::Closed).unwrap();
    assert_eq!(closed.advance(SubjectStatus::Resolved).unwrap(), SubjectStatus::Resolved);
    assert!(SubjectStatus::Resolved.advance(SubjectStatus::Active).is_err());
    assert!(SubjectStatus::Closed.advance(SubjectStatus::Active).is_err());
  }

  #[test]
  fn open_requires_active_and_unexpired() {
    let now = Utc::now();
    let mut s = Subject::new(SubjectKey::proposition(1).unwrap(), "Podium in Monza?");
    assert!(s.is_open(now));

    s.expires_at = Some(now - Duration::minutes(1));
    assert!(!s.is_open(now));

    s.expires_at = Some(now + Duration::minutes(1));
    s.status = SubjectStatus::Closed;
    assert!(!s.is_open(now));
  }
}
