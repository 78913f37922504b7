//! The aggregation engine: counts in, percentages out.
//!
//! Pure and deterministic. Percentages round half-up using integer
//! arithmetic so that `2/3` is always `67` and never depends on float
//! representation.

use serde::{Deserialize, Serialize};

use crate::vote::Counts;

/// Win probability reported for a subject nobody has voted on yet.
pub const NEUTRAL_PRIOR: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
  pub total:           u64,
  pub yes:             u64,
  pub no:              u64,
  /// Share of `yes` votes as a whole percentage, rounded half-up.
  pub win_probability: u32,
}

impl Aggregate {
  /// Share of `yes` votes with one decimal place, rounded half-up.
  pub fn yes_percentage(&self) -> f64 {
    if self.total == 0 {
      return f64::from(NEUTRAL_PRIOR);
    }
    round_half_up(self.yes, self.total, 1000) as f64 / 10.0
  }
}

impl From<Counts> for Aggregate {
  fn from(c: Counts) -> Self { aggregate(c.yes, c.no) }
}

pub fn aggregate(yes: u64, no: u64) -> Aggregate {
  let total = yes.saturating_add(no);
  let win_probability = if total == 0 {
    NEUTRAL_PRIOR
  } else {
    round_half_up(yes, total, 100) as u32
  };
  Aggregate { total, yes, no, win_probability }
}

/// `round(scale * num / den)` with halves rounded up. `den` must be non-zero.
fn round_half_up(num: u64, den: u64, scale: u64) -> u64 {
  let (num, den, scale) = (u128::from(num), u128::from(den), u128::from(scale));
  ((2 * scale * num + den) / (2 * den)) as u64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_is_sum_of_buckets() {
    for yes in 0..20 {
      for no in 0..20 {
        assert_eq!(aggregate(yes, no).total, yes + no);
      }
    }
  }

  #[test]
  fn huge_counts_do_not_overflow() {
    let a = aggregate(u64::MAX, u64::MAX);
    assert_eq!(a.total, u64::MAX);
    assert_eq!(aggregate(u64::MAX, 0).win_probability, 100);
  }

  #[test]
  fn no_votes_is_neutral() {
    let a = aggregate(0, 0);
    assert_eq!(a.win_probability, 50);
    assert_eq!(a.total, 0);
    assert_eq!(a.yes_percentage(), 50.0);
  }

  #[test]
  fn unanimous_extremes() {
    assert_eq!(aggregate(1, 0).win_probability, 100);
    assert_eq!(aggregate(0, 1).win_probability, 0);
  }

  #[test]
  fn rounds_half_up() {
    assert_eq!(aggregate(2, 1).win_probability, 67);
    assert_eq!(aggregate(1, 2).win_probability, 33);
    assert_eq!(aggregate(1, 3).win_probability, 25);
    // 1/8 = 12.5 → 13
    assert_eq!(aggregate(1, 7).win_probability, 13);
    assert_eq!(aggregate(3, 2).win_probability, 60);
  }

  #[test]
  fn yes_percentage_keeps_one_decimal() {
    assert_eq!(aggregate(2, 1).yes_percentage(), 66.7);
    assert_eq!(aggregate(1, 2).yes_percentage(), 33.3);
    assert_eq!(aggregate(1, 7).yes_percentage(), 12.5);
    assert_eq!(aggregate(1, 15).yes_percentage(), 6.3);
    assert_eq!(aggregate(4, 0).yes_percentage(), 100.0);
  }

  #[test]
  fn large_counts_do_not_overflow() {
    let a = aggregate(u64::MAX / 4, u64::MAX / 4);
    assert_eq!(a.win_probability, 50);
  }
}
