//! Competition manager tests against an in-memory store and a scripted
//! generator.

use std::{
  collections::VecDeque,
  fmt,
  sync::Mutex,
};

use league_core::{
  agent::{Agent, NewAgent, Provider, RetryPolicy},
  lifecycle::MatchStatus,
  matches::{Match, MatchQuery, NewMatch},
  paper::{NewPaper, Paper},
  store::LeagueStore,
  upstream::{GenerationRequest, TextGenerator},
};
use league_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  CompetitionManager, GenerateRequest, JudgeConfig, MatchMode,
  leaderboard::{PaperScope, agent_standings, league_stats, paper_standings},
};

// ─── Scripted generator ──────────────────────────────────────────────────────

#[derive(Debug)]
struct FakeError(String);

impl fmt::Display for FakeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl std::error::Error for FakeError {}

impl From<FakeError> for league_core::Error {
  fn from(e: FakeError) -> Self { league_core::Error::Upstream(e.0) }
}

/// Replies in order; an exhausted script fails every further call.
#[derive(Default)]
struct Scripted {
  replies:  Mutex<VecDeque<Result<String, String>>>,
  requests: Mutex<Vec<GenerationRequest>>,
}

impl Scripted {
  fn new<I: IntoIterator<Item = Result<String, String>>>(replies: I) -> Self {
    Self {
      replies:  Mutex::new(replies.into_iter().collect()),
      requests: Mutex::default(),
    }
  }

  fn calls(&self) -> usize { self.requests.lock().unwrap().len() }
}

impl TextGenerator for Scripted {
  type Error = FakeError;

  async fn generate(&self, request: &GenerationRequest) -> Result<String, FakeError> {
    self.requests.lock().unwrap().push(request.clone());
    let reply = self.replies.lock().unwrap().pop_front();
    reply
      .unwrap_or_else(|| Err("script exhausted".into()))
      .map_err(FakeError)
  }
}

fn review(rating: i32) -> Result<String, String> {
  Ok(format!(
    "Summary:\nA careful study.\n\nStrengths:\n- Clear\n- Novel\n\nWeaknesses:\n- Small \
     data\n\nQuestions:\n1. Does it scale?\n\nRating: {rating}\n\nConfidence: medium"
  ))
}

fn verdict(first: &str, second: &str, winner: &str) -> Result<String, String> {
  let mut text = String::new();
  for (criterion, a, b) in [
    ("Technical Correctness", 8, 6),
    ("Depth of Analysis", 7, 7),
    ("Constructive Feedback", 9, 5),
    ("Clarity", 8, 8),
    ("Fairness", 7, 6),
  ] {
    text.push_str(&format!("{criterion}:\n{first}: {a}\n{second}: {b}\n\n"));
  }
  text.push_str(&format!("Winner: {winner}\n\nReasoning:\nMore specific feedback."));
  Ok(text)
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

const FAST: RetryPolicy = RetryPolicy { max_attempts: 2, delay_ms: 0 };

fn paper(title: &str) -> NewPaper {
  NewPaper {
    title:         title.into(),
    abstract_text: "We propose a method.".into(),
    authors:       vec!["A. Author".into()],
    category:      "cs".into(),
    subcategory:   "LG".into(),
    year:          2024,
    url:           String::new(),
    arxiv_id:      None,
    keywords:      vec![],
    references:    vec![],
  }
}

async fn agent(store: &SqliteStore, name: &str) -> Agent {
  let mut input = NewAgent::new(name, "gpt-4", Provider::OpenAi);
  input.settings.retry = FAST;
  store.register_agent(input).await.unwrap()
}

struct Arena {
  manager: CompetitionManager<SqliteStore, Scripted>,
  paper:   Paper,
  alpha:   Agent,
  beta:    Agent,
}

async fn arena(replies: Vec<Result<String, String>>) -> Arena {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let paper = store.add_paper(paper("Sparse Mixtures")).await.unwrap();
  let alpha = agent(&store, "alpha").await;
  let beta = agent(&store, "beta").await;
  let manager = CompetitionManager::new(store, Scripted::new(replies)).with_judge(JudgeConfig {
    retry: FAST,
    ..JudgeConfig::default()
  });
  Arena { manager, paper, alpha, beta }
}

impl Arena {
  async fn pending(&self) -> Match {
    self
      .manager
      .store()
      .create_match(NewMatch {
        paper_id:          self.paper.paper_id,
        opponent_paper_id: None,
        agent1_id:         self.alpha.agent_id,
        agent2_id:         self.beta.agent_id,
        judge_id:          None,
      })
      .await
      .unwrap()
  }

  async fn agent(&self, id: Uuid) -> Agent {
    self.manager.store().get_agent(id).await.unwrap().unwrap()
  }

  fn generator(&self) -> &Scripted { self.manager.generator() }
}

// ─── run_match ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn winner_gets_three_points() {
  let a = arena(vec![review(8), review(5), verdict("alpha", "beta", "alpha")]).await;
  let m = a.pending().await;

  let done = a.manager.run_match(m.match_id).await.unwrap();
  assert_eq!(done.status, MatchStatus::Completed);
  assert_eq!(done.winner_id, Some(a.alpha.agent_id));

  let alpha = a.agent(a.alpha.agent_id).await;
  let beta = a.agent(a.beta.agent_id).await;
  assert_eq!((alpha.record.points, alpha.record.matches_won), (3, 1));
  assert_eq!((beta.record.points, beta.record.matches_lost), (0, 1));

  let evaluation = a
    .manager
    .store()
    .get_evaluation(m.match_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(evaluation.scores.constructive_feedback.first, 9);
  assert_eq!(evaluation.reasoning, "More specific feedback.");

  let reviews = a.manager.store().list_reviews(m.match_id).await.unwrap();
  assert_eq!(reviews.len(), 2);
  assert_eq!(reviews[0].agent_id, a.alpha.agent_id);
  assert_eq!(reviews[0].body.rating, 8);
  assert_eq!(reviews[0].body.strengths, vec!["Clear", "Novel"]);
}

#[tokio::test]
async fn unnamed_winner_is_a_draw() {
  let a = arena(vec![review(6), review(6), verdict("alpha", "beta", "draw")]).await;
  let m = a.pending().await;

  let done = a.manager.run_match(m.match_id).await.unwrap();
  assert_eq!(done.winner_id, None);
  for id in [a.alpha.agent_id, a.beta.agent_id] {
    let agent = a.agent(id).await;
    assert_eq!((agent.record.points, agent.record.matches_drawn), (1, 1));
  }
}

#[tokio::test]
async fn run_match_is_idempotent() {
  let a = arena(vec![review(8), review(5), verdict("alpha", "beta", "beta")]).await;
  let m = a.pending().await;

  let first = a.manager.run_match(m.match_id).await.unwrap();
  let calls = a.generator().calls();
  let second = a.manager.run_match(m.match_id).await.unwrap();

  assert_eq!(first, second);
  assert_eq!(a.generator().calls(), calls, "no further generation");
  let reviews = a.manager.store().list_reviews(m.match_id).await.unwrap();
  assert_eq!(reviews.len(), 2);
}

#[tokio::test]
async fn transient_failures_are_retried() {
  let a = arena(vec![
    Err("503".into()),
    review(7),
    review(4),
    verdict("alpha", "beta", "alpha"),
  ])
  .await;
  let m = a.pending().await;

  let done = a.manager.run_match(m.match_id).await.unwrap();
  assert_eq!(done.status, MatchStatus::Completed);
  assert_eq!(a.generator().calls(), 4);
}

#[tokio::test]
async fn exhausted_retries_mark_the_match_failed() {
  let a = arena(vec![review(7), Err("503".into()), Err("503".into())]).await;
  let m = a.pending().await;

  let err = a.manager.run_match(m.match_id).await.unwrap_err();
  assert!(matches!(err, league_core::Error::Upstream(_)));

  let stored = a.manager.store().get_match(m.match_id).await.unwrap().unwrap();
  assert_eq!(stored.status, MatchStatus::Error);
  assert_eq!(stored.error.as_deref(), Some(err.to_string().as_str()));
  assert!(stored.completed_at.is_some());

  // No resume: a failed match stays failed.
  let again = a.manager.run_match(m.match_id).await.unwrap();
  assert_eq!(again.status, MatchStatus::Error);
  assert_eq!(a.agent(a.alpha.agent_id).await.record.matches_played, 0);
}

#[tokio::test]
async fn missing_match_is_not_found() {
  let a = arena(vec![]).await;
  let err = a.manager.run_match(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, league_core::Error::NotFound { entity: "match", .. }));
}

#[tokio::test]
async fn default_judge_is_used_without_judge_agent() {
  let a = arena(vec![review(8), review(5), verdict("alpha", "beta", "alpha")]).await;
  let m = a.pending().await;
  a.manager.run_match(m.match_id).await.unwrap();

  let requests = a.generator().requests.lock().unwrap().clone();
  let judge = requests.last().unwrap();
  assert_eq!(judge.provider, Provider::OpenAi);
  assert_eq!(judge.model, "gpt-4");
  assert_eq!(judge.temperature, 0.2);
  assert!(judge.prompt.contains("alpha: [score]"));
}

#[tokio::test]
async fn head_to_head_reviews_each_paper() {
  let a = arena(vec![review(9), review(3), verdict("alpha", "beta", "alpha")]).await;
  let store = a.manager.store();
  let opponent = store.add_paper(paper("Dense Baselines")).await.unwrap();
  let m = store
    .create_match(NewMatch {
      paper_id:          a.paper.paper_id,
      opponent_paper_id: Some(opponent.paper_id),
      agent1_id:         a.alpha.agent_id,
      agent2_id:         a.beta.agent_id,
      judge_id:          None,
    })
    .await
    .unwrap();

  a.manager.run_match(m.match_id).await.unwrap();

  let reviews = store.list_reviews(m.match_id).await.unwrap();
  assert_eq!(reviews[1].paper_id, opponent.paper_id);

  let requests = a.generator().requests.lock().unwrap().clone();
  assert!(requests[0].prompt.contains("Sparse Mixtures"));
  assert!(requests[1].prompt.contains("Dense Baselines"));

  let papers = paper_standings(store, &PaperScope::default()).await.unwrap();
  assert_eq!(papers.len(), 2);
  assert_eq!(papers[0].standing.id, a.paper.paper_id);
  assert_eq!(papers[0].title, "Sparse Mixtures");
  assert_eq!(papers[0].average, 9.0);
}

// ─── Batches and reconciliation ──────────────────────────────────────────────

#[tokio::test]
async fn run_pending_reports_each_match() {
  let a = arena(vec![
    review(8),
    review(5),
    verdict("alpha", "beta", "alpha"),
    Err("bad gateway".into()),
    Err("bad gateway".into()),
  ])
  .await;
  let first = a.pending().await;
  let second = a.pending().await;

  let summaries = a.manager.run_pending(10).await.unwrap();
  assert_eq!(summaries.len(), 2);
  assert_eq!(summaries[0].match_id, first.match_id, "oldest first");
  assert_eq!(summaries[0].status, MatchStatus::Completed);
  assert_eq!(summaries[1].match_id, second.match_id);
  assert_eq!(summaries[1].status, MatchStatus::Error);
  assert!(summaries[1].error.is_some());

  let pending = MatchQuery { status: Some(MatchStatus::Pending), ..Default::default() };
  assert_eq!(a.manager.store().count_matches(&pending).await.unwrap(), 0);
}

#[tokio::test]
async fn replay_agrees_with_counters() {
  let a = arena(vec![
    review(8),
    review(5),
    verdict("alpha", "beta", "alpha"),
    review(6),
    review(6),
    verdict("alpha", "beta", "draw"),
    review(2),
    review(9),
    verdict("alpha", "beta", "beta"),
  ])
  .await;
  for _ in 0..3 {
    let m = a.pending().await;
    a.manager.run_match(m.match_id).await.unwrap();
  }

  assert!(a.manager.reconcile().await.unwrap().is_empty());

  let standings = agent_standings(a.manager.store()).await.unwrap();
  let total: i64 = standings.iter().map(|s| s.standing.points).sum();
  assert_eq!(total, 3 * 2 + 2);
  assert_eq!(standings[0].rank, 1);
  assert!(!standings[0].name.is_empty());
}

#[tokio::test]
async fn stats_summarise_the_league() {
  let a = arena(vec![review(8), review(5), verdict("alpha", "beta", "beta")]).await;
  let m = a.pending().await;
  a.pending().await;
  a.manager.run_match(m.match_id).await.unwrap();

  let stats = league_stats(a.manager.store()).await.unwrap();
  assert_eq!(stats.papers, 1);
  assert_eq!(stats.agents, 2);
  assert_eq!(stats.matches.total, 2);
  assert_eq!(stats.matches.completed, 1);
  assert_eq!(stats.matches.pending, 1);
  assert_eq!(stats.top_win_rate.unwrap().agent_id, a.beta.agent_id);
  assert_eq!(stats.most_active.unwrap().matches_played, 1);
}

// ─── Generation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_creates_pending_matches() {
  let a = arena(vec![]).await;
  let store = a.manager.store();
  store.add_paper(paper("Second")).await.unwrap();
  agent(store, "gamma").await;

  let created = a
    .manager
    .generate_matches(&GenerateRequest { limit: 5, seed: 2, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(created.len(), 2);
  assert!(created.iter().all(|m| m.status == MatchStatus::Pending));

  let h2h = a
    .manager
    .generate_matches(&GenerateRequest {
      mode: MatchMode::HeadToHead,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(h2h.len(), 1);
  assert!(h2h[0].is_head_to_head());
}
