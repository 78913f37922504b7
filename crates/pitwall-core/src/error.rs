//! Error types for `pitwall-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or malformed.
  #[error("validation error: {0}")]
  Validation(String),

  /// The voter re-submitted the direction already on record.
  #[error("you have already voted this way")]
  DuplicateVote,

  /// The subject is unknown, or known but not open for voting.
  #[error("not found: {0}")]
  NotFound(String),

  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A concurrent writer held the record; the write may be retried once.
  #[error("write conflict, retry")]
  ConflictRetry,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn unavailable(msg: impl Into<String>) -> Self {
    let msg: String = msg.into();
    Self::StoreUnavailable(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
