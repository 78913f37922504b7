//! Votes and the write outcome reported by stores.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, identity::Identity, subject::SubjectKey};

/// The binary vote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Yes,
  No,
}

impl Direction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Yes => "yes",
      Self::No => "no",
    }
  }

  pub fn is_yes(self) -> bool { self == Self::Yes }
}

impl From<bool> for Direction {
  fn from(yes: bool) -> Self { if yes { Self::Yes } else { Self::No } }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Direction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "yes" => Ok(Self::Yes),
      "no" => Ok(Self::No),
      other => Err(Error::validation(format!("vote must be \"yes\" or \"no\", got {other:?}"))),
    }
  }
}

/// The current, latest choice of one identity for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub subject:    SubjectKey,
  pub identity:   Identity,
  pub direction:  Direction,
  pub updated_at: DateTime<Utc>,
}

/// Raw per-subject tallies as reported by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
  pub yes: u64,
  pub no:  u64,
}

impl Counts {
  pub fn new(yes: u64, no: u64) -> Self { Self { yes, no } }

  /// Saturates at `u64::MAX`.
  pub fn total(self) -> u64 { self.yes.saturating_add(self.no) }

  /// Count one vote in `direction`.
  pub fn add(&mut self, direction: Direction) {
    match direction {
      Direction::Yes => self.yes = self.yes.saturating_add(1),
      Direction::No => self.no = self.no.saturating_add(1),
    }
  }

  /// Move one vote from `from` to the opposite bucket.
  pub fn flip(&mut self, from: Direction) {
    match from {
      Direction::Yes => {
        self.yes = self.yes.saturating_sub(1);
        self.no = self.no.saturating_add(1);
      }
      Direction::No => {
        self.no = self.no.saturating_sub(1);
        self.yes = self.yes.saturating_add(1);
      }
    }
  }

  /// Sum two tallies, or `None` if either bucket or the combined total
  /// would exceed `u64::MAX`.
  pub fn checked_add(self, rhs: Self) -> Option<Self> {
    let sum = Self { yes: self.yes.checked_add(rhs.yes)?, no: self.no.checked_add(rhs.no)? };
    sum.yes.checked_add(sum.no)?;
    Some(sum)
  }
}

impl std::ops::Add for Counts {
  type Output = Self;

  /// Saturating; see [`Counts::checked_add`] for the fallible form.
  fn add(self, rhs: Self) -> Self {
    Self { yes: self.yes.saturating_add(rhs.yes), no: self.no.saturating_add(rhs.no) }
  }
}

/// What an [`upsert`](crate::store::VoteStore::upsert) did.
///
/// When `previous` equals the submitted direction the store performed no
/// write; the caller treats that as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
  pub created:  bool,
  pub previous: Option<Direction>,
}

impl UpsertOutcome {
  pub fn created() -> Self { Self { created: true, previous: None } }

  pub fn replaced(previous: Direction) -> Self { Self { created: false, previous: Some(previous) } }

  pub fn is_unchanged(&self, direction: Direction) -> bool { self.previous == Some(direction) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direction_parses_only_yes_and_no() {
    assert_eq!("yes".parse::<Direction>().unwrap(), Direction::Yes);
    assert_eq!("no".parse::<Direction>().unwrap(), Direction::No);
    assert!("YES".parse::<Direction>().is_err());
    assert!("maybe".parse::<Direction>().is_err());
  }

  #[test]
  fn flip_moves_exactly_one_vote() {
    let mut c = Counts::new(3, 1);
    c.flip(Direction::Yes);
    assert_eq!(c, Counts::new(2, 2));
    assert_eq!(c.total(), 4);
  }

  #[test]
  fn counting_saturates_at_the_top() {
    let mut c = Counts::new(u64::MAX, 0);
    c.add(Direction::Yes);
    assert_eq!(c, Counts::new(u64::MAX, 0));
    c.flip(Direction::No);
    assert_eq!(c.yes, u64::MAX);
    assert_eq!((c + Counts::new(1, 1)).total(), u64::MAX);
    assert_eq!(Counts::new(u64::MAX, 0).checked_add(Counts::new(0, 1)), None);
    assert_eq!(Counts::new(1, 2).checked_add(Counts::new(3, 4)), Some(Counts::new(4, 6)));
  }
}
