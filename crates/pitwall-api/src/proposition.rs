//! Email-keyed yes/no propositions with numeric ids.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/predictions/vote` | Body: [`VoteBody`]; 404 for unknown or closed ids |
//! | `GET`  | `/predictions/vote` | `?predictionId&userIdentifier` |
//! | `GET`  | `/predictions/list` | Every registered proposition with its counts |

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
};
use chrono::{DateTime, Utc};
use pitwall_core::{
  aggregate::Aggregate,
  identity::Identity,
  service::Ballot,
  store::VoteStore,
  subject::{Subject, SubjectKey, SubjectStatus},
  vote::Direction,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, present};

/// A proposition with its live counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropositionView {
  pub id:             i64,
  pub title:          String,
  pub description:    Option<String>,
  pub status:         SubjectStatus,
  pub expires_at:     Option<DateTime<Utc>>,
  pub created_at:     DateTime<Utc>,
  pub yes_votes:      u64,
  pub no_votes:       u64,
  pub total_votes:    u64,
  pub yes_percentage: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_vote:      Option<Direction>,
}

impl PropositionView {
  /// `None` for subjects that are not propositions.
  pub fn new(subject: Subject, aggregate: Aggregate, user_vote: Option<Direction>) -> Option<Self> {
    let SubjectKey::Proposition { id } = subject.key else {
      return None;
    };
    Some(Self {
      id,
      title: subject.title,
      description: subject.description,
      status: subject.status,
      expires_at: subject.expires_at,
      created_at: subject.created_at,
      yes_votes: aggregate.yes,
      no_votes: aggregate.no,
      total_votes: aggregate.total,
      yes_percentage: aggregate.yes_percentage(),
      user_vote,
    })
  }
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    T,
}

impl<T> Envelope<T> {
  fn ok(data: T) -> Json<Self> { Json(Self { success: true, data }) }
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub prediction_id: Option<i64>,
  pub vote:          Option<String>,
  pub user_name:     Option<String>,
  pub user_email:    Option<String>,
}

/// `POST /predictions/vote`
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<Envelope<PropositionView>>, ApiError>
where
  S: VoteStore + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

  let (Some(id), Some(vote), Some(_name), Some(email)) = (
    body.prediction_id,
    present(body.vote),
    present(body.user_name),
    present(body.user_email),
  ) else {
    return Err(ApiError::bad_request("Missing required fields"));
  };

  let direction: Direction = vote
    .parse()
    .map_err(|_| ApiError::bad_request("Invalid vote value"))?;
  let identity = Identity::email(&email).map_err(|_| ApiError::bad_request("Invalid email format"))?;
  let subject = SubjectKey::proposition(id)?;

  let submission = state
    .bounded(state.service.submit(Ballot { subject, identity, direction }))
    .await?;

  let view = submission
    .subject
    .and_then(|s| PropositionView::new(s, submission.aggregate, Some(submission.direction)))
    .ok_or_else(|| ApiError::NotFound(format!("prediction {id} not found")))?;
  Ok(Envelope::ok(view))
}

// ─── Read ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteParams {
  pub prediction_id:   Option<i64>,
  pub user_identifier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrentVote {
  pub vote: Option<Direction>,
}

/// `GET /predictions/vote?predictionId=<id>&userIdentifier=<email>`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
  query: Result<Query<VoteParams>, QueryRejection>,
) -> Result<Json<Envelope<CurrentVote>>, ApiError>
where
  S: VoteStore + 'static,
{
  let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

  let (Some(id), Some(who)) = (params.prediction_id, present(params.user_identifier)) else {
    return Err(ApiError::bad_request("Missing predictionId or userIdentifier"));
  };

  let key = SubjectKey::proposition(id)?;
  let identity = Identity::email(&who).map_err(|_| ApiError::bad_request("Invalid email format"))?;

  let vote = state.bounded(state.service.current_vote(&key, &identity)).await?;
  Ok(Envelope::ok(CurrentVote { vote }))
}

/// `GET /predictions/list`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Envelope<Vec<PropositionView>>>, ApiError>
where
  S: VoteStore + 'static,
{
  let rows = state.bounded(state.service.list()).await?;
  let views = rows
    .into_iter()
    .filter_map(|(subject, aggregate)| PropositionView::new(subject, aggregate, None))
    .collect();
  Ok(Envelope::ok(views))
}
