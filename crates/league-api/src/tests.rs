//! Router tests driven with `oneshot` against an in-memory store.

use std::{collections::VecDeque, sync::Mutex};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{TimeZone as _, Utc};
use league_arena::{CompetitionManager, JudgeConfig};
use league_codec::interchange::parse_matches;
use league_core::{
  agent::RetryPolicy,
  paper::{ArxivDetails, ArxivEntry},
  upstream::{ArxivQuery, GenerationRequest, PaperSource, TextGenerator},
};
use league_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, api_router};

// ─── Fakes ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fake upstream: {0}")]
struct FakeError(&'static str);

impl From<FakeError> for league_core::Error {
  fn from(e: FakeError) -> Self { league_core::Error::Upstream(e.to_string()) }
}

/// Canned replies in order; fails once they run out.
struct Canned(Mutex<VecDeque<String>>);

impl TextGenerator for Canned {
  type Error = FakeError;

  async fn generate(&self, _request: &GenerationRequest) -> Result<String, FakeError> {
    self
      .0
      .lock()
      .unwrap()
      .pop_front()
      .ok_or(FakeError("no reply left"))
  }
}

/// A fixed arXiv feed.
struct Feed(Vec<ArxivEntry>);

impl PaperSource for Feed {
  type Error = FakeError;

  async fn fetch_entry(&self, arxiv_id: &str) -> Result<Option<ArxivEntry>, FakeError> {
    Ok(self.0.iter().find(|e| e.details.arxiv_id == arxiv_id).cloned())
  }

  async fn search(&self, query: &ArxivQuery) -> Result<Vec<ArxivEntry>, FakeError> {
    Ok(
      self
        .0
        .iter()
        .filter(|e| e.details.categories.contains(&query.category))
        .take(query.max_results as usize)
        .cloned()
        .collect(),
    )
  }
}

fn entry(arxiv_id: &str, title: &str) -> ArxivEntry {
  ArxivEntry {
    title:         title.into(),
    abstract_text: "We study scaling.".into(),
    authors:       vec!["R. Searcher".into()],
    details:       ArxivDetails {
      arxiv_id: arxiv_id.into(),
      categories: vec!["cs.LG".into()],
      primary_category: Some("cs.LG".into()),
      published: Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).single(),
      abstract_url: Some(format!("http://arxiv.org/abs/{arxiv_id}v1")),
      ..Default::default()
    },
  }
}

// ─── Harness ──────────────────────────────────────────────────────────────────

type TestState = AppState<SqliteStore, Canned, Feed>;

const NO_RETRY: RetryPolicy = RetryPolicy { max_attempts: 1, delay_ms: 0 };

async fn make_state(replies: Vec<String>) -> TestState {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let manager = CompetitionManager::new(store, Canned(Mutex::new(replies.into())))
    .with_judge(JudgeConfig { retry: NO_RETRY, ..JudgeConfig::default() });
  let feed = Feed(vec![
    entry("2305.00001", "Scaling Laws Revisited"),
    entry("2305.00002", "Sparse Experts"),
  ]);
  AppState::new(manager, feed)
}

async fn send(state: &TestState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn send_text(state: &TestState, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/yaml")
    .body(Body::from(body.to_string()))
    .unwrap();
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn paper_body(title: &str, arxiv_id: Option<&str>) -> Value {
  json!({
    "title": title,
    "abstract": "We propose a method.",
    "authors": ["A. Author"],
    "category": "cs",
    "subcategory": "LG",
    "year": 2024,
    "url": "",
    "arxiv_id": arxiv_id,
  })
}

async fn create_paper(state: &TestState, title: &str) -> String {
  let (status, paper) = send(state, "POST", "/papers", Some(paper_body(title, None))).await;
  assert_eq!(status, StatusCode::CREATED);
  paper["paper_id"].as_str().unwrap().to_owned()
}

async fn register(state: &TestState, name: &str) -> String {
  let body = json!({
    "name": name,
    "model": "gpt-4",
    "provider": "openai",
    "settings": {
      "temperature": 0.3,
      "max_tokens": 2000,
      "retry": { "max_attempts": 1, "delay_ms": 0 }
    }
  });
  let (status, agent) = send(state, "POST", "/agents", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  agent["agent_id"].as_str().unwrap().to_owned()
}

/// A paper, two agents and a pending match between them.
async fn seeded(state: &TestState) -> (String, String, String) {
  let paper_id = create_paper(state, "Sparse Mixtures").await;
  let alpha = register(state, "alpha").await;
  let beta = register(state, "beta").await;
  let (status, m) = send(
    state,
    "POST",
    "/matches",
    Some(json!({ "paper_id": paper_id, "agent1_id": alpha, "agent2_id": beta })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{m}");
  (m["match_id"].as_str().unwrap().to_owned(), alpha, beta)
}

fn review(rating: i32) -> String {
  format!(
    "Summary:\nSolid work.\n\nStrengths:\n- Clear\n\nWeaknesses:\n- Narrow\n\nQuestions:\n- \
     Why?\n\nRating: {rating}\nConfidence: high"
  )
}

fn verdict(winner: &str) -> String {
  let mut text = String::new();
  for criterion in [
    "Technical Correctness",
    "Depth of Analysis",
    "Constructive Feedback",
    "Clarity",
    "Fairness",
  ] {
    text.push_str(&format!("{criterion}:\nalpha: 8\nbeta: 6\n\n"));
  }
  text.push_str(&format!("Winner: {winner}\nReasoning:\nalpha was more specific."));
  text
}

fn full_match(winner: &str) -> Vec<String> { vec![review(7), review(5), verdict(winner)] }

// ── Papers ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn paper_create_then_fetch() {
  let state = make_state(vec![]).await;
  let id = create_paper(&state, "Attention Revisited").await;

  let (status, paper) = send(&state, "GET", &format!("/papers/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(paper["title"], "Attention Revisited");
  assert_eq!(paper["abstract"], "We propose a method.");
}

#[tokio::test]
async fn unknown_paper_is_404_with_code() {
  let state = make_state(vec![]).await;
  let uri = format!("/papers/{}", uuid::Uuid::new_v4());
  let (status, body) = send(&state, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "not_found");
  assert!(body["error"].as_str().unwrap().contains("paper"));
}

#[tokio::test]
async fn invalid_paper_is_400() {
  let state = make_state(vec![]).await;
  let mut body = paper_body("Old", None);
  body["year"] = json!(1850);
  let (status, err) = send(&state, "POST", "/papers", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["code"], "validation");
}

#[tokio::test]
async fn duplicate_arxiv_id_is_409() {
  let state = make_state(vec![]).await;
  let body = paper_body("First", Some("2401.00001"));
  assert_eq!(send(&state, "POST", "/papers", Some(body.clone())).await.0, StatusCode::CREATED);

  let (status, err) = send(&state, "POST", "/papers", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(err["code"], "conflict");
}

#[tokio::test]
async fn list_papers_filters_by_subcategory() {
  let state = make_state(vec![]).await;
  create_paper(&state, "One").await;
  let mut other = paper_body("Two", None);
  other["subcategory"] = json!("CL");
  send(&state, "POST", "/papers", Some(other)).await;

  let (status, papers) = send(&state, "GET", "/papers?subcategory=CL", None).await;
  assert_eq!(status, StatusCode::OK);
  let papers = papers.as_array().unwrap();
  assert_eq!(papers.len(), 1);
  assert_eq!(papers[0]["title"], "Two");
}

#[tokio::test]
async fn yaml_import_skips_known_arxiv_ids() {
  let state = make_state(vec![]).await;
  let doc = "papers:\n  - title: Graph Nets\n    abstract: Message passing.\n    arxiv_id: \
             '2402.00001'\n    keywords: graphs, gnn\n  - title: Diffusion\n    abstract: \
             Denoising.\n";
  let uri = "/papers/import?category=cs&subcategory=LG&year=2024";

  let (status, body) = send_text(&state, "POST", uri, doc).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  let report: Value = serde_json::from_str(&body).unwrap();
  assert_eq!(report["added"].as_array().unwrap().len(), 2);
  assert_eq!(report["added"][0]["keywords"], json!(["graphs", "gnn"]));

  let (_, body) = send_text(&state, "POST", uri, doc).await;
  let report: Value = serde_json::from_str(&body).unwrap();
  assert_eq!(report["added"].as_array().unwrap().len(), 1);
  assert_eq!(report["skipped"], 1);
}

#[tokio::test]
async fn malformed_yaml_is_400() {
  let state = make_state(vec![]).await;
  let uri = "/papers/import?category=cs&subcategory=LG&year=2024";
  let (status, _) = send_text(&state, "POST", uri, "papers: [unclosed").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ingest_files_entries_and_skips_repeats() {
  let state = make_state(vec![]).await;
  let body = json!({ "category": "cs.LG", "max_results": 5 });

  let (status, report) = send(&state, "POST", "/papers/ingest", Some(body.clone())).await;
  assert_eq!(status, StatusCode::OK, "{report}");
  let added = report["added"].as_array().unwrap();
  assert_eq!(added.len(), 2);
  assert_eq!(added[0]["category"], "cs");
  assert_eq!(added[0]["subcategory"], "LG");
  assert_eq!(added[0]["year"], 2023);

  let (_, report) = send(&state, "POST", "/papers/ingest", Some(body)).await;
  assert!(report["added"].as_array().unwrap().is_empty());
  assert_eq!(report["skipped"], 2);
}

#[tokio::test]
async fn enrich_extracts_id_from_url() {
  let state = make_state(vec![]).await;
  let mut body = paper_body("Scaling Laws Revisited", None);
  body["url"] = json!("https://arxiv.org/abs/2305.00001");
  let (_, paper) = send(&state, "POST", "/papers", Some(body)).await;
  let id = paper["paper_id"].as_str().unwrap();

  let (status, enriched) = send(&state, "POST", &format!("/papers/{id}/enrich"), None).await;
  assert_eq!(status, StatusCode::OK, "{enriched}");
  assert_eq!(enriched["arxiv_details"]["arxiv_id"], "2305.00001");
  assert_eq!(enriched["arxiv_details"]["primary_category"], "cs.LG");
}

#[tokio::test]
async fn enrich_without_arxiv_id_is_400() {
  let state = make_state(vec![]).await;
  let id = create_paper(&state, "Offline").await;
  let (status, _) = send(&state, "POST", &format!("/papers/{id}/enrich"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Agents ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registering_twice_returns_same_agent() {
  let state = make_state(vec![]).await;
  let first = register(&state, "alpha").await;
  let second = register(&state, "alpha").await;
  assert_eq!(first, second);

  let (_, agents) = send(&state, "GET", "/agents", None).await;
  assert_eq!(agents.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn agent_matches_are_paged() {
  let state = make_state(vec![]).await;
  let (_, alpha, _) = seeded(&state).await;

  let (status, page) = send(&state, "GET", &format!("/agents/{alpha}/matches?limit=5"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["total"], 1);
  assert_eq!(page["limit"], 5);
  assert_eq!(page["items"][0]["status"], "pending");

  let uri = format!("/agents/{}/matches", uuid::Uuid::new_v4());
  assert_eq!(send(&state, "GET", &uri, None).await.0, StatusCode::NOT_FOUND);
}

// ── Matches ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn run_completes_match_and_updates_standings() {
  let state = make_state(full_match("alpha")).await;
  let (match_id, alpha, _) = seeded(&state).await;

  let (status, m) = send(&state, "POST", &format!("/matches/{match_id}/run"), None).await;
  assert_eq!(status, StatusCode::OK, "{m}");
  assert_eq!(m["status"], "completed");
  assert_eq!(m["winner_id"], alpha.as_str());

  let (_, reviews) = send(&state, "GET", &format!("/matches/{match_id}/reviews"), None).await;
  let reviews = reviews.as_array().unwrap();
  assert_eq!(reviews.len(), 2);
  assert_eq!(reviews[0]["rating"], 7);

  let (status, eval) = send(&state, "GET", &format!("/matches/{match_id}/evaluation"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(eval["winner_id"], alpha.as_str());

  let (_, board) = send(&state, "GET", "/leaderboard/agents", None).await;
  assert_eq!(board[0]["name"], "alpha");
  assert_eq!(board[0]["points"], 3);
  assert_eq!(board[1]["points"], 0);

  let (_, discrepancies) = send(&state, "GET", "/leaderboard/reconcile", None).await;
  assert_eq!(discrepancies, json!([]));
}

#[tokio::test]
async fn running_twice_is_idempotent() {
  let state = make_state(full_match("beta")).await;
  let (match_id, ..) = seeded(&state).await;
  let uri = format!("/matches/{match_id}/run");

  let (_, first) = send(&state, "POST", &uri, None).await;
  let (status, second) = send(&state, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first, second);
}

#[tokio::test]
async fn upstream_failure_is_502_and_marks_error() {
  let state = make_state(vec![]).await;
  let (match_id, ..) = seeded(&state).await;

  let (status, err) = send(&state, "POST", &format!("/matches/{match_id}/run"), None).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(err["code"], "upstream_failure");

  let (_, m) = send(&state, "GET", &format!("/matches/{match_id}"), None).await;
  assert_eq!(m["status"], "error");
  assert!(m["error"].as_str().unwrap().contains("no reply left"));
}

#[tokio::test]
async fn evaluation_of_pending_match_is_404() {
  let state = make_state(vec![]).await;
  let (match_id, ..) = seeded(&state).await;
  let (status, _) = send(&state, "GET", &format!("/matches/{match_id}/evaluation"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn match_against_itself_is_400() {
  let state = make_state(vec![]).await;
  let paper_id = create_paper(&state, "Solo").await;
  let alpha = register(&state, "alpha").await;
  let (status, _) = send(
    &state,
    "POST",
    "/matches",
    Some(json!({ "paper_id": paper_id, "agent1_id": alpha, "agent2_id": alpha })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_then_run_pending() {
  let mut replies = full_match("alpha");
  replies.extend(full_match("Draw"));
  let state = make_state(replies).await;
  create_paper(&state, "One").await;
  create_paper(&state, "Two").await;
  register(&state, "alpha").await;
  register(&state, "beta").await;

  let (status, created) = send(&state, "POST", "/matches/generate", Some(json!({ "limit": 5 }))).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  assert_eq!(created.as_array().unwrap().len(), 2);

  let (status, summaries) = send(&state, "POST", "/matches/run-pending?limit=10", None).await;
  assert_eq!(status, StatusCode::OK);
  let summaries = summaries.as_array().unwrap();
  assert_eq!(summaries.len(), 2);
  assert!(summaries.iter().all(|s| s["status"] == "completed"));

  let (_, page) = send(&state, "GET", "/matches?status=completed", None).await;
  assert_eq!(page["total"], 2);

  let (_, stats) = send(&state, "GET", "/leaderboard/stats", None).await;
  assert_eq!(stats["papers"], 2);
  assert_eq!(stats["matches"]["completed"], 2);
  assert_eq!(stats["most_active"]["matches_played"], 2);
}

#[tokio::test]
async fn export_writes_completed_matches_as_yaml() {
  let state = make_state(full_match("alpha")).await;
  let (match_id, ..) = seeded(&state).await;
  send(&state, "POST", &format!("/matches/{match_id}/run"), None).await;

  let (status, yaml) = send_text(&state, "GET", "/matches/export", "").await;
  assert_eq!(status, StatusCode::OK);
  let doc = parse_matches(&yaml).unwrap();
  assert_eq!(doc.matches.len(), 1);
  let exported = &doc.matches[0];
  assert_eq!(exported.id.to_string(), match_id);
  assert_eq!(exported.reviews[0].reviewer, "alpha");
  assert_eq!(exported.reviews[0].overall_score, 7);
  assert_eq!(
    exported.comparison.as_ref().unwrap().winner.as_deref(),
    Some("alpha")
  );
}

// ── Feedback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_submit_list_and_like() {
  let state = make_state(vec![]).await;
  let (match_id, ..) = seeded(&state).await;
  let uri = format!("/matches/{match_id}/feedback");

  let (status, first) = send(
    &state,
    "POST",
    &uri,
    Some(json!({ "author": "ana", "vote": "agree" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{first}");
  let (_, second) = send(
    &state,
    "POST",
    &uri,
    Some(json!({ "author": "bo", "comment": "Judge missed the ablation." })),
  )
  .await;

  let (_, listed) = send(&state, "GET", &uri, None).await;
  let listed = listed.as_array().unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0]["feedback_id"], second["feedback_id"]);

  let id = first["feedback_id"].as_str().unwrap();
  let (status, liked) = send(&state, "POST", &format!("/feedback/{id}/like"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(liked["likes"], 1);
}

#[tokio::test]
async fn empty_feedback_is_400_and_unknown_like_is_404() {
  let state = make_state(vec![]).await;
  let (match_id, ..) = seeded(&state).await;

  let (status, _) = send(
    &state,
    "POST",
    &format!("/matches/{match_id}/feedback"),
    Some(json!({ "author": "ana" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let uri = format!("/feedback/{}/like", uuid::Uuid::new_v4());
  assert_eq!(send(&state, "POST", &uri, None).await.0, StatusCode::NOT_FOUND);
}
