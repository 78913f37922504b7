//! JSON HTTP API for pitwall predictions.
//!
//! Exposes an axum [`Router`] backed by any [`VoteStore`]. Two wire
//! protocols share one [`VoteService`]: session-keyed race predictions
//! ([`race`]) and email-keyed propositions ([`proposition`]). Both adapt
//! their request shapes to the canonical ballot and back.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(pitwall_api::api_router(service, Duration::from_secs(5)))
//! ```

pub mod error;
pub mod proposition;
pub mod race;
pub mod session;

use std::{future::Future, time::Duration};

use axum::{Router, routing::get};
use pitwall_core::{service::VoteService, store::VoteStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub service:       VoteService<S>,
  /// Upper bound on any single call into the store.
  pub store_timeout: Duration,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { service: self.service.clone(), store_timeout: self.store_timeout }
  }
}

impl<S> ApiState<S> {
  /// Await `fut`, failing with [`ApiError::Timeout`] after `store_timeout`.
  ///
  /// Timing out drops `fut` but does not cancel work already handed to a
  /// backend thread. A submission that times out after its upsert was
  /// dispatched may still commit, so the client sees a 500 for a vote that
  /// was recorded and a retry of the same ballot is answered as a duplicate.
  async fn bounded<T>(
    &self,
    fut: impl Future<Output = pitwall_core::Result<T>>,
  ) -> Result<T, ApiError> {
    match tokio::time::timeout(self.store_timeout, fut).await {
      Ok(result) => Ok(result?),
      Err(_) => Err(ApiError::Timeout),
    }
  }
}

/// Treat absent and blank strings alike.
fn present(s: Option<String>) -> Option<String> { s.filter(|s| !s.trim().is_empty()) }

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: VoteService<S>, store_timeout: Duration) -> Router<()>
where
  S: VoteStore + 'static,
{
  Router::new()
    // Race predictions
    .route("/predictions", get(race::stats::<S>).post(race::submit::<S>))
    // Propositions
    .route(
      "/predictions/vote",
      get(proposition::current::<S>).post(proposition::submit::<S>),
    )
    .route("/predictions/list", get(proposition::list::<S>))
    // Identity
    .route("/session", get(session::issue))
    .with_state(ApiState { service, store_timeout })
}

// ─── Integration tests ────────────────────────────────────────────────────────
