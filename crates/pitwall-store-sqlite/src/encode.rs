//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, subject keys in their canonical
//! text form, and directions as `1` (yes) / `0` (no).

use chrono::{DateTime, Utc};
use pitwall_core::{
  subject::{Subject, SubjectKey, SubjectStatus},
  vote::Direction,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Direction ───────────────────────────────────────────────────────────────

pub fn encode_direction(d: Direction) -> bool { d.is_yes() }

pub fn decode_direction(yes: bool) -> Direction { Direction::from(yes) }

// ─── Subject ─────────────────────────────────────────────────────────────────

/// A subject row as read from SQLite, before parsing.
pub struct RawSubject {
  pub subject_key: String,
  pub title:       String,
  pub description: Option<String>,
  pub status:      String,
  pub expires_at:  Option<String>,
  pub created_at:  String,
}

pub const SUBJECT_COLUMNS: &str =
  "subject_key, title, description, status, expires_at, created_at";

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawSubject {
      subject_key: row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      status:      row.get(3)?,
      expires_at:  row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      key:         self.subject_key.parse::<SubjectKey>()?,
      title:       self.title,
      description: self.description,
      status:      self.status.parse::<SubjectStatus>()?,
      expires_at:  self.expires_at.as_deref().map(decode_dt).transpose()?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_roundtrip_through_text() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert!(decode_dt("yesterday").is_err());
  }

  #[test]
  fn raw_subject_with_bad_status_is_rejected() {
    let raw = RawSubject {
      subject_key: "proposition:1".into(),
      title:       "t".into(),
      description: None,
      status:      "archived".into(),
      expires_at:  None,
      created_at:  encode_dt(Utc::now()),
    };
    assert!(raw.into_subject().is_err());
  }
}
