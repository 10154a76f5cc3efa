//! Handlers for community feedback.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches/:id/feedback` | Newest first |
//! | `POST` | `/matches/:id/feedback` | Body: [`NewFeedback`] without `match_id`; returns 201 |
//! | `POST` | `/feedback/:id/like` | Increment the like counter |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use league_core::{
  Error,
  feedback::{Feedback, NewFeedback},
  store::LeagueStore,
  upstream::{PaperSource, TextGenerator},
};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, Result},
  matches::require_match,
};

/// `GET /matches/:id/feedback`
pub async fn list<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(match_id): Path<Uuid>,
) -> Result<Json<Vec<Feedback>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let store = state.manager.store();
  require_match(store, match_id).await?;
  let feedback = store
    .list_feedback(match_id)
    .await
    .map_err(ApiError::from_backend)?;
  Ok(Json(feedback))
}

/// `POST /matches/:id/feedback`
///
/// A bare vote from an author who already voted on the match replaces the
/// earlier vote.
pub async fn submit<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(match_id): Path<Uuid>,
  Json(body): Json<NewFeedback>,
) -> Result<impl IntoResponse>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let input = NewFeedback { match_id, ..body };
  let stored = state
    .manager
    .store()
    .submit_feedback(input)
    .await
    .map_err(ApiError::from_backend)?;
  Ok((StatusCode::CREATED, Json(stored)))
}

/// `POST /feedback/:id/like`
pub async fn like<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Feedback>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let liked = state
    .manager
    .store()
    .like_feedback(id)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("feedback", id))?;
  Ok(Json(liked))
}
