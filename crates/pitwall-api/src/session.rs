//! Handler for `GET /session`: mints an opaque voter token.
//!
//! The token is not remembered server-side. Clients keep it (for example in
//! local storage) and send it back as `userSession`.

use axum::Json;
use pitwall_core::identity::Identity;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
  pub user_session: String,
}

/// `GET /session`
pub async fn issue() -> Json<SessionResponse> {
  Json(SessionResponse { user_session: Identity::generate().to_string() })
}
