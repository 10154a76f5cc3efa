//! JSON REST API for the paper evaluation league.
//!
//! Exposes an axum [`Router`] backed by a [`CompetitionManager`] over any
//! [`LeagueStore`] and [`TextGenerator`], plus a [`PaperSource`] for arXiv
//! ingestion. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", league_api::api_router(state))
//! ```

pub mod agents;
pub mod error;
pub mod feedback;
pub mod leaderboard;
pub mod matches;
pub mod papers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use league_arena::CompetitionManager;
use league_core::{
  store::LeagueStore,
  upstream::{PaperSource, TextGenerator},
};
use serde::Serialize;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, G, P> {
  pub manager: Arc<CompetitionManager<S, G>>,
  pub source:  Arc<P>,
}

impl<S, G, P> AppState<S, G, P> {
  pub fn new(manager: CompetitionManager<S, G>, source: P) -> Self {
    Self { manager: Arc::new(manager), source: Arc::new(source) }
  }
}

impl<S, G, P> Clone for AppState<S, G, P> {
  fn clone(&self) -> Self {
    Self {
      manager: Arc::clone(&self.manager),
      source:  Arc::clone(&self.source),
    }
  }
}

// ─── Paging ───────────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Limit and offset for paged list endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paging {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl Paging {
  /// The effective limit, clamped to `1..=MAX_PAGE_SIZE`.
  pub fn limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> usize { self.offset.unwrap_or(0) }
}

/// One page of a listing together with the unpaged total.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items:  Vec<T>,
  pub total:  u64,
  pub limit:  usize,
  pub offset: usize,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G, P>(state: AppState<S, G, P>) -> Router<()>
where
  S: LeagueStore + 'static,
  G: TextGenerator + 'static,
  P: PaperSource + 'static,
{
  Router::new()
    // Papers
    .route("/papers", get(papers::list::<S, G, P>).post(papers::create::<S, G, P>))
    .route("/papers/import", post(papers::import::<S, G, P>))
    .route("/papers/ingest", post(papers::ingest::<S, G, P>))
    .route("/papers/{id}", get(papers::get_one::<S, G, P>))
    .route("/papers/{id}/enrich", post(papers::enrich::<S, G, P>))
    // Agents
    .route("/agents", get(agents::list::<S, G, P>).post(agents::register::<S, G, P>))
    .route("/agents/{id}", get(agents::get_one::<S, G, P>))
    .route("/agents/{id}/matches", get(agents::matches::<S, G, P>))
    // Matches
    .route("/matches", get(matches::list::<S, G, P>).post(matches::create::<S, G, P>))
    .route("/matches/export", get(matches::export::<S, G, P>))
    .route("/matches/generate", post(matches::generate::<S, G, P>))
    .route("/matches/run-pending", post(matches::run_pending::<S, G, P>))
    .route("/matches/{id}", get(matches::get_one::<S, G, P>))
    .route("/matches/{id}/run", post(matches::run::<S, G, P>))
    .route("/matches/{id}/reviews", get(matches::reviews::<S, G, P>))
    .route("/matches/{id}/evaluation", get(matches::evaluation::<S, G, P>))
    // Feedback
    .route(
      "/matches/{id}/feedback",
      get(feedback::list::<S, G, P>).post(feedback::submit::<S, G, P>),
    )
    .route("/feedback/{id}/like", post(feedback::like::<S, G, P>))
    // Leaderboard
    .route("/leaderboard/agents", get(leaderboard::agents::<S, G, P>))
    .route("/leaderboard/papers", get(leaderboard::papers::<S, G, P>))
    .route("/leaderboard/reconcile", get(leaderboard::reconcile::<S, G, P>))
    .route("/leaderboard/stats", get(leaderboard::stats::<S, G, P>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
