//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Re-submission of the vote already on record. Clients should show this
  /// as a notice rather than a failure.
  #[error("duplicate vote: {0}")]
  Duplicate(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store timed out")]
  Timeout,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn bad_request(msg: impl Into<String>) -> Self { Self::BadRequest(msg.into()) }

  fn code(&self) -> &'static str {
    match self {
      ApiError::BadRequest(_) => "validation",
      ApiError::Duplicate(_) => "duplicate_vote",
      ApiError::NotFound(_) => "not_found",
      ApiError::Timeout | ApiError::Internal(_) => "internal",
    }
  }
}

impl From<pitwall_core::Error> for ApiError {
  fn from(e: pitwall_core::Error) -> Self {
    use pitwall_core::Error as E;
    match e {
      E::Validation(m) => ApiError::BadRequest(m),
      E::DuplicateVote => ApiError::Duplicate(E::DuplicateVote.to_string()),
      E::NotFound(m) => ApiError::NotFound(m),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let code = self.code();
    let (status, message) = match &self {
      ApiError::BadRequest(m) | ApiError::Duplicate(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Timeout | ApiError::Internal(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
      }
    };
    (status, Json(json!({ "success": false, "error": message, "code": code }))).into_response()
  }
}
