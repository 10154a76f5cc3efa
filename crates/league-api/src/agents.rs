//! Handlers for `/agents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/agents` | Ordered by points, then wins |
//! | `POST` | `/agents` | Body: [`NewAgent`]; get-or-create on `(name, model)` |
//! | `GET`  | `/agents/:id` | Single agent |
//! | `GET`  | `/agents/:id/matches` | optional `status`, `limit`, `offset` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use league_core::{
  Error,
  agent::{Agent, NewAgent},
  lifecycle::MatchStatus,
  matches::{Match, MatchQuery},
  store::LeagueStore,
  upstream::{PaperSource, TextGenerator},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState, Page, Paging,
  error::{ApiError, Result},
  matches::page_of,
};

/// `GET /agents`
pub async fn list<S, G, P>(State(state): State<AppState<S, G, P>>) -> Result<Json<Vec<Agent>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let agents = state
    .manager
    .store()
    .list_agents()
    .await
    .map_err(ApiError::from_backend)?;
  Ok(Json(agents))
}

/// `POST /agents`: returns 201 + the agent. An existing `(name, model)` pair
/// is returned unchanged.
pub async fn register<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Json(body): Json<NewAgent>,
) -> Result<impl IntoResponse>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let agent = state
    .manager
    .store()
    .register_agent(body)
    .await
    .map_err(ApiError::from_backend)?;
  Ok((StatusCode::CREATED, Json(agent)))
}

/// `GET /agents/:id`
pub async fn get_one<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Agent>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let agent = state
    .manager
    .store()
    .get_agent(id)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("agent", id))?;
  Ok(Json(agent))
}

#[derive(Debug, Deserialize)]
pub struct MatchesParams {
  pub status: Option<MatchStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /agents/:id/matches[?status=...]`: matches where the agent is either
/// competitor, newest first.
pub async fn matches<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
  Query(params): Query<MatchesParams>,
) -> Result<Json<Page<Match>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let store = state.manager.store();
  if store.get_agent(id).await.map_err(ApiError::from_backend)?.is_none() {
    return Err(Error::not_found("agent", id).into());
  }
  let query = MatchQuery {
    status: params.status,
    agent_id: Some(id),
    ..Default::default()
  };
  let paging = Paging { limit: params.limit, offset: params.offset };
  Ok(Json(page_of(store, query, paging).await?))
}
