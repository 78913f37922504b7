//! Session-keyed race predictions (race name + ISO date).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/predictions` | `?raceName&raceDate[&userSession]` |
//! | `POST` | `/predictions` | Body: [`VoteBody`] |

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
};
use pitwall_core::{
  aggregate::Aggregate,
  identity::Identity,
  service::Ballot,
  store::VoteStore,
  subject::SubjectKey,
  vote::Direction,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, present};

/// The `stats` object of every race response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceStats {
  pub total_votes:     u64,
  pub yes_votes:       u64,
  pub no_votes:        u64,
  pub win_probability: u32,
}

impl From<Aggregate> for RaceStats {
  fn from(a: Aggregate) -> Self {
    Self {
      total_votes:     a.total,
      yes_votes:       a.yes,
      no_votes:        a.no,
      win_probability: a.win_probability,
    }
  }
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub race_name:    Option<String>,
  pub race_date:    Option<String>,
  pub prediction:   Option<bool>,
  pub user_session: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
  pub success:   bool,
  pub stats:     RaceStats,
  pub user_vote: bool,
}

/// `POST /predictions`
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError>
where
  S: VoteStore + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

  let (Some(name), Some(date), Some(prediction), Some(session)) = (
    present(body.race_name),
    present(body.race_date),
    body.prediction,
    present(body.user_session),
  ) else {
    return Err(ApiError::bad_request("Missing required fields"));
  };

  let ballot = Ballot {
    subject:   SubjectKey::race(&name, &date)?,
    identity:  Identity::session(&session)?,
    direction: Direction::from(prediction),
  };

  let submission = state.bounded(state.service.submit(ballot)).await?;
  Ok(Json(VoteResponse {
    success:   true,
    stats:     submission.aggregate.into(),
    user_vote: submission.direction.is_yes(),
  }))
}

// ─── Read ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
  pub race_name:    Option<String>,
  pub race_date:    Option<String>,
  pub user_session: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
  pub stats:     RaceStats,
  pub user_vote: Option<bool>,
}

/// `GET /predictions?raceName=<name>&raceDate=<YYYY-MM-DD>[&userSession=<token>]`
pub async fn stats<S>(
  State(state): State<ApiState<S>>,
  query: Result<Query<StatsParams>, QueryRejection>,
) -> Result<Json<StatsResponse>, ApiError>
where
  S: VoteStore + 'static,
{
  let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

  let (Some(name), Some(date)) = (present(params.race_name), present(params.race_date)) else {
    return Err(ApiError::bad_request("Missing raceName or raceDate"));
  };

  let key = SubjectKey::race(&name, &date)?;
  let identity = present(params.user_session)
    .map(|s| Identity::session(&s))
    .transpose()?;

  let tally = state.bounded(state.service.tally(&key, identity.as_ref())).await?;
  Ok(Json(StatsResponse {
    stats:     tally.aggregate.into(),
    user_vote: tally.user_vote.map(Direction::is_yes),
  }))
}
