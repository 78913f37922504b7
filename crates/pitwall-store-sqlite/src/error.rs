//! Error type for `pitwall-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pitwall_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// Whether another connection held the lock and the write can be retried.
  pub fn is_busy(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
        matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
      }
      _ => false,
    }
  }
}

impl From<Error> for pitwall_core::Error {
  fn from(e: Error) -> Self {
    if e.is_busy() {
      return pitwall_core::Error::ConflictRetry;
    }
    match e {
      Error::Core(inner) => inner,
      other => pitwall_core::Error::StoreUnavailable(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
