//! Handlers for `/matches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches` | optional `status`, `agent_id`, `paper_id`, `limit`, `offset` |
//! | `POST` | `/matches` | Body: [`NewMatch`]; returns 201 + pending match |
//! | `GET`  | `/matches/export` | YAML `{ matches: [...] }` of completed matches |
//! | `POST` | `/matches/generate` | Body: [`GenerateRequest`] |
//! | `POST` | `/matches/run-pending` | `?limit=`; runs oldest pending matches first |
//! | `GET`  | `/matches/:id` | Single match |
//! | `POST` | `/matches/:id/run` | Run to completion |
//! | `GET`  | `/matches/:id/reviews` | Both reviews, in recording order |
//! | `GET`  | `/matches/:id/evaluation` | The judge's evaluation |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use league_arena::{GenerateRequest, RunSummary};
use league_codec::interchange::{MatchDocument, MatchesDocument, to_yaml};
use league_core::{
  Error,
  evaluation::Evaluation,
  lifecycle::MatchStatus,
  matches::{Match, MatchQuery, NewMatch},
  review::Review,
  store::LeagueStore,
  upstream::{PaperSource, TextGenerator},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState, Page, Paging,
  error::{ApiError, Result},
};

/// Run `query` with `paging` applied and count the unpaged total.
pub(crate) async fn page_of<S: LeagueStore>(
  store: &S,
  query: MatchQuery,
  paging: Paging,
) -> Result<Page<Match>> {
  let total = store
    .count_matches(&query)
    .await
    .map_err(ApiError::from_backend)?;
  let paged = MatchQuery {
    limit: Some(paging.limit()),
    offset: Some(paging.offset()),
    ..query
  };
  let items = store
    .list_matches(&paged)
    .await
    .map_err(ApiError::from_backend)?;
  Ok(Page { items, total, limit: paging.limit(), offset: paging.offset() })
}

pub(crate) async fn require_match<S: LeagueStore>(store: &S, id: Uuid) -> Result<Match> {
  store
    .get_match(id)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("match", id).into())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:   Option<MatchStatus>,
  pub agent_id: Option<Uuid>,
  pub paper_id: Option<Uuid>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// `GET /matches[?status=...][&agent_id=...][&paper_id=...]`, newest first.
pub async fn list<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Match>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let query = MatchQuery {
    status: params.status,
    agent_id: params.agent_id,
    paper_id: params.paper_id,
    ..Default::default()
  };
  let paging = Paging { limit: params.limit, offset: params.offset };
  Ok(Json(page_of(state.manager.store(), query, paging).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /matches/:id`
pub async fn get_one<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Match>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(require_match(state.manager.store(), id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /matches`: returns 201 + the new `pending` match.
pub async fn create<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Json(body): Json<NewMatch>,
) -> Result<impl IntoResponse>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let created = state
    .manager
    .store()
    .create_match(body)
    .await
    .map_err(ApiError::from_backend)?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /matches/generate`: returns 201 + the created matches.
pub async fn generate<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Json(body): Json<GenerateRequest>,
) -> Result<impl IntoResponse>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let created = state.manager.generate_matches(&body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Run ──────────────────────────────────────────────────────────────────────

/// `POST /matches/:id/run`
///
/// A match that already left `pending` is returned as stored. A failed run
/// leaves the match in `error` and reports the cause.
pub async fn run<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Match>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(state.manager.run_match(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RunPendingParams {
  pub limit: Option<usize>,
}

/// `POST /matches/run-pending[?limit=N]`: one summary per attempted match.
pub async fn run_pending<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Query(params): Query<RunPendingParams>,
) -> Result<Json<Vec<RunSummary>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let limit = Paging { limit: params.limit, offset: None }.limit();
  Ok(Json(state.manager.run_pending(limit).await?))
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// `GET /matches/:id/reviews`
pub async fn reviews<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let store = state.manager.store();
  require_match(store, id).await?;
  let reviews = store
    .list_reviews(id)
    .await
    .map_err(ApiError::from_backend)?;
  Ok(Json(reviews))
}

/// `GET /matches/:id/evaluation`: 404 until the match is judged.
pub async fn evaluation<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Evaluation>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let store = state.manager.store();
  require_match(store, id).await?;
  let evaluation = store
    .get_evaluation(id)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("evaluation", id))?;
  Ok(Json(evaluation))
}

// ─── Export ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExportParams {
  pub category:    Option<String>,
  pub subcategory: Option<String>,
  pub year:        Option<i32>,
}

/// `GET /matches/export`: completed matches as a YAML matches document,
/// oldest first.
pub async fn export<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let store = state.manager.store();
  let query = MatchQuery {
    category: params.category,
    subcategory: params.subcategory,
    year: params.year,
    oldest_first: true,
    ..MatchQuery::completed()
  };
  let records = store
    .match_records(&query)
    .await
    .map_err(ApiError::from_backend)?;
  let agents = store
    .list_agents()
    .await
    .map_err(ApiError::from_backend)?;

  let doc = MatchesDocument {
    matches: records
      .iter()
      .map(|r| MatchDocument::from_record(r, &agents))
      .collect(),
  };
  let yaml = to_yaml(&doc).map_err(ApiError::from_backend)?;
  Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml))
}
