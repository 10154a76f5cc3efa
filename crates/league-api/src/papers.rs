//! Handlers for `/papers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/papers` | optional `category`, `subcategory`, `year`, `limit`, `offset` |
//! | `POST` | `/papers` | Body: [`NewPaper`]; returns 201 + stored paper |
//! | `GET`  | `/papers/:id` | Single paper |
//! | `POST` | `/papers/import` | YAML `{ papers: [...] }` body; `?category&subcategory&year` required |
//! | `POST` | `/papers/ingest` | Body: [`IngestBody`]; newest arXiv entries of a category |
//! | `POST` | `/papers/:id/enrich` | Fetch and attach arXiv details |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Datelike as _, Utc};
use league_codec::interchange::parse_papers;
use league_core::{
  Error,
  paper::{NewPaper, Paper, PaperQuery},
  store::LeagueStore,
  upstream::{ArxivQuery, PaperSource, TextGenerator},
};
use league_providers::extract_arxiv_id;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, Paging, error::{ApiError, Result}};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category:    Option<String>,
  pub subcategory: Option<String>,
  pub year:        Option<i32>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// `GET /papers[?category=...][&subcategory=...][&year=...]`
pub async fn list<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Paper>>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let paging = Paging { limit: params.limit, offset: params.offset };
  let query = PaperQuery {
    category:    params.category,
    subcategory: params.subcategory,
    year:        params.year,
    limit:       Some(paging.limit()),
    offset:      Some(paging.offset()),
  };
  let papers = state
    .manager
    .store()
    .list_papers(&query)
    .await
    .map_err(ApiError::from_backend)?;
  Ok(Json(papers))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /papers/:id`
pub async fn get_one<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Paper>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  Ok(Json(require_paper(state.manager.store(), id).await?))
}

pub(crate) async fn require_paper<S: LeagueStore>(store: &S, id: Uuid) -> Result<Paper> {
  store
    .get_paper(id)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("paper", id).into())
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /papers`: returns 201 + the stored [`Paper`].
pub async fn create<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Json(body): Json<NewPaper>,
) -> Result<impl IntoResponse>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let paper = state
    .manager
    .store()
    .add_paper(body)
    .await
    .map_err(ApiError::from_backend)?;
  Ok((StatusCode::CREATED, Json(paper)))
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportParams {
  pub category:    String,
  pub subcategory: String,
  pub year:        i32,
}

/// Outcome of a batch import or ingest.
#[derive(Debug, Serialize)]
pub struct ImportReport {
  pub added:   Vec<Paper>,
  /// Papers already present (same arXiv id).
  pub skipped: usize,
}

/// `POST /papers/import?category=...&subcategory=...&year=...`: body is a
/// YAML papers document.
pub async fn import<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Query(params): Query<ImportParams>,
  body: String,
) -> Result<Json<ImportReport>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let doc = parse_papers(&body).map_err(ApiError::from_backend)?;
  let papers = doc
    .papers
    .into_iter()
    .map(|p| p.into_new_paper(&params.category, &params.subcategory, params.year));

  let report = add_all(state.manager.store(), papers).await?;
  info!(
    added = report.added.len(),
    skipped = report.skipped,
    category = %params.category,
    subcategory = %params.subcategory,
    "imported papers"
  );
  Ok(Json(report))
}

/// Add each paper, counting arXiv id conflicts as skipped.
pub(crate) async fn add_all<S: LeagueStore>(
  store: &S,
  papers: impl IntoIterator<Item = NewPaper>,
) -> Result<ImportReport> {
  let mut report = ImportReport { added: Vec::new(), skipped: 0 };
  for paper in papers {
    match store.add_paper(paper).await.map_err(Into::<Error>::into) {
      Ok(p) => report.added.push(p),
      Err(Error::Conflict(_)) => report.skipped += 1,
      Err(e) => return Err(e.into()),
    }
  }
  Ok(report)
}

// ─── Ingest ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /papers/ingest`.
#[derive(Debug, Deserialize)]
pub struct IngestBody {
  /// arXiv search parameters; `category` is an arXiv category such as
  /// `cs.LG`.
  #[serde(flatten)]
  pub query:           ArxivQuery,
  /// League category to file papers under. Defaults to the arXiv archive
  /// (`cs` for `cs.LG`).
  pub league_category: Option<String>,
  /// Defaults to the arXiv subject class (`LG` for `cs.LG`).
  pub subcategory:     Option<String>,
}

/// Split an arXiv category into archive and subject class.
fn league_scope(arxiv_category: &str) -> (&str, &str) {
  arxiv_category
    .split_once('.')
    .unwrap_or((arxiv_category, "general"))
}

/// `POST /papers/ingest`: add the newest entries of an arXiv category,
/// skipping ids already stored.
pub async fn ingest<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Json(body): Json<IngestBody>,
) -> Result<Json<ImportReport>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  if body.query.category.trim().is_empty() {
    return Err(ApiError::BadRequest("category is required".into()));
  }
  let store = state.manager.store();
  let entries = state
    .source
    .search(&body.query)
    .await
    .map_err(ApiError::from_backend)?;

  let (archive, class) = league_scope(&body.query.category);
  let category = body.league_category.as_deref().unwrap_or(archive);
  let subcategory = body.subcategory.as_deref().unwrap_or(class);
  let this_year = Utc::now().year();

  let mut fresh = Vec::with_capacity(entries.len());
  let mut known = 0;
  for entry in entries {
    let exists = store
      .find_paper_by_arxiv_id(&entry.details.arxiv_id)
      .await
      .map_err(ApiError::from_backend)?
      .is_some();
    if exists {
      known += 1;
    } else {
      fresh.push(entry.into_new_paper(category, subcategory, this_year));
    }
  }

  let mut report = add_all(store, fresh).await?;
  report.skipped += known;
  info!(
    arxiv_category = %body.query.category,
    added = report.added.len(),
    skipped = report.skipped,
    "ingested papers"
  );
  Ok(Json(report))
}

// ─── Enrich ───────────────────────────────────────────────────────────────────

/// `POST /papers/:id/enrich`: look the paper up on arXiv and store the
/// details.
///
/// The arXiv id is the paper's own, or else extracted from its URL.
pub async fn enrich<S, G, P>(
  State(state): State<AppState<S, G, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Paper>>
where
  S: LeagueStore,
  G: TextGenerator,
  P: PaperSource,
{
  let store = state.manager.store();
  let paper = require_paper(store, id).await?;
  let arxiv_id = paper
    .arxiv_id
    .clone()
    .or_else(|| extract_arxiv_id(&paper.url))
    .ok_or_else(|| {
      ApiError::BadRequest(format!("paper {id} has no recognisable arXiv id"))
    })?;

  let entry = state
    .source
    .fetch_entry(&arxiv_id)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("arxiv entry", &arxiv_id))?;

  let updated = store
    .set_arxiv_details(id, entry.details)
    .await
    .map_err(ApiError::from_backend)?
    .ok_or_else(|| Error::not_found("paper", id))?;
  info!(paper_id = %id, %arxiv_id, "paper enriched");
  Ok(Json(updated))
}
