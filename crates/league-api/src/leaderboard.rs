//! Handlers for `/leaderboard` endpoints.
//!
//! Standings are replayed from completed matches on every request.

use axum::{
  Json,
  extract::{Query, State},
};
use league_arena::leaderboard::{
  self, AgentStanding, LeagueStats, PaperScope, PaperStanding,
};
use league_core::{
  standings::Discrepancy,
  store::LeagueStore,
  upstream::{PaperSource, TextGenerator},
};

use crate::{AppState, error::Result};

/// `GET /leaderboard/agents`
pub async fn agents<S, G, P>(
  State(state): State<AppState<S, G, P>>,
) -> Result<Json<Vec<AgentStanding>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(leaderboard::agent_standings(state.manager.store()).await?))
}

/// `GET /leaderboard/papers[?category=...][&subcategory=...][&year=...]`:
/// head-to-head matches only.
pub async fn papers<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Query(scope): Query<PaperScope>,
) -> Result<Json<Vec<PaperStanding>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(
    leaderboard::paper_standings(state.manager.store(), &scope).await?,
  ))
}

/// `GET /leaderboard/reconcile`: agents whose counters disagree with the
/// replay. Empty when the two views agree.
pub async fn reconcile<S, G, P>(
  State(state): State<AppState<S, G, P>>,
) -> Result<Json<Vec<Discrepancy>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(state.manager.reconcile().await?))
}

/// `GET /leaderboard/stats`
pub async fn stats<S, G, P>(State(state): State<AppState<S, G, P>>) -> Result<Json<LeagueStats>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(leaderboard::league_stats(state.manager.store()).await?))
}
