//! The competition manager: runs matches end to end.

use league_codec::{
  parse_review, parse_verdict,
  prompt::{self, Entry},
};
use league_core::{
  Error, Result,
  agent::{Agent, Provider, RetryPolicy},
  evaluation::NewEvaluation,
  lifecycle::{MatchStatus, Resolution},
  matches::{Match, MatchQuery},
  paper::{Paper, PaperQuery},
  review::{NewReview, ReviewBody},
  standings::{Discrepancy, TieBreak, agent_outcome, rank, reconcile},
  store::LeagueStore,
  upstream::{GenerationRequest, TextGenerator},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  core_err,
  plan::{GenerateRequest, plan_matches},
  retry::with_retry,
};

// ─── Judge ───────────────────────────────────────────────────────────────────

/// The model used to judge matches that have no judge agent of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
  pub provider:    Provider,
  pub model:       String,
  pub temperature: f32,
  pub max_tokens:  u32,
  pub retry:       RetryPolicy,
}

impl Default for JudgeConfig {
  fn default() -> Self {
    Self {
      provider:    Provider::OpenAi,
      model:       "gpt-4".into(),
      temperature: 0.2,
      max_tokens:  1500,
      retry:       RetryPolicy::default(),
    }
  }
}

impl JudgeConfig {
  fn from_agent(agent: &Agent) -> Self {
    Self {
      provider:    agent.provider,
      model:       agent.model.clone(),
      temperature: agent.settings.temperature,
      max_tokens:  agent.settings.max_tokens,
      retry:       agent.settings.retry,
    }
  }
}

// ─── Run summaries ───────────────────────────────────────────────────────────

/// Per-match result of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
  pub match_id:  Uuid,
  pub status:    MatchStatus,
  pub winner_id: Option<Uuid>,
  pub error:     Option<String>,
}

impl From<&Match> for RunSummary {
  fn from(m: &Match) -> Self {
    Self {
      match_id:  m.match_id,
      status:    m.status,
      winner_id: m.winner_id,
      error:     m.error.clone(),
    }
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

pub struct CompetitionManager<S, G> {
  store:     S,
  generator: G,
  judge:     JudgeConfig,
}

impl<S, G> CompetitionManager<S, G>
where
  S: LeagueStore,
  G: TextGenerator,
{
  pub fn new(store: S, generator: G) -> Self {
    Self { store, generator, judge: JudgeConfig::default() }
  }

  pub fn with_judge(mut self, judge: JudgeConfig) -> Self {
    self.judge = judge;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn generator(&self) -> &G { &self.generator }

  pub fn judge(&self) -> &JudgeConfig { &self.judge }

  // ── Generation ────────────────────────────────────────────────────────────

  /// Create pending matches for up to `request.limit` papers, newest first.
  pub async fn generate_matches(&self, request: &GenerateRequest) -> Result<Vec<Match>> {
    let agents = self.store.list_agents().await.map_err(core_err)?;
    let papers = self
      .store
      .list_papers(&PaperQuery {
        category:    request.category.clone(),
        subcategory: request.subcategory.clone(),
        year:        request.year,
        limit:       Some(request.limit),
        offset:      None,
      })
      .await
      .map_err(core_err)?;

    let planned = plan_matches(&papers, &agents, request.mode, request.seed)?;
    let mut created = Vec::with_capacity(planned.len());
    for input in planned {
      created.push(self.store.create_match(input).await.map_err(core_err)?);
    }
    info!(count = created.len(), mode = ?request.mode, "generated matches");
    Ok(created)
  }

  // ── Running ───────────────────────────────────────────────────────────────

  /// Run one match to completion.
  ///
  /// A match that is no longer `pending`, or that another caller claims
  /// first, is returned as currently stored. Any failure after the claim
  /// moves the match to `error` and is returned.
  pub async fn run_match(&self, id: Uuid) -> Result<Match> {
    let m = self.require_match(id).await?;
    if m.status != MatchStatus::Pending {
      debug!(match_id = %id, status = %m.status, "match already started");
      return Ok(m);
    }
    if !self.store.claim_match(id).await.map_err(core_err)? {
      debug!(match_id = %id, "match claimed elsewhere");
      return self.require_match(id).await;
    }

    info!(match_id = %id, "match started");
    match self.play(&m).await {
      Ok(done) => {
        info!(match_id = %id, winner = ?done.winner_id, "match completed");
        Ok(done)
      }
      Err(e) => {
        error!(match_id = %id, error = %e, "match failed");
        if let Err(mark) = self.store.fail_match(id, e.to_string()).await {
          warn!(match_id = %id, error = %mark, "could not record match failure");
        }
        Err(e)
      }
    }
  }

  /// Run `ids` in order. One failure does not stop the batch.
  pub async fn run_matches(&self, ids: &[Uuid]) -> Vec<RunSummary> {
    let mut summaries = Vec::with_capacity(ids.len());
    for &id in ids {
      let summary = match self.run_match(id).await {
        Ok(m) => RunSummary::from(&m),
        Err(e) => RunSummary {
          match_id:  id,
          status:    MatchStatus::Error,
          winner_id: None,
          error:     Some(e.to_string()),
        },
      };
      summaries.push(summary);
    }
    summaries
  }

  /// Run up to `limit` pending matches, oldest first.
  pub async fn run_pending(&self, limit: usize) -> Result<Vec<RunSummary>> {
    let pending = self
      .store
      .list_matches(&MatchQuery {
        status: Some(MatchStatus::Pending),
        oldest_first: true,
        limit: Some(limit),
        ..Default::default()
      })
      .await
      .map_err(core_err)?;
    let ids: Vec<Uuid> = pending.iter().map(|m| m.match_id).collect();
    info!(count = ids.len(), "running pending matches");
    Ok(self.run_matches(&ids).await)
  }

  // ── Reconciliation ────────────────────────────────────────────────────────

  /// Agents whose stored counters disagree with a replay of every completed
  /// match.
  pub async fn reconcile(&self) -> Result<Vec<Discrepancy>> {
    let records = self
      .store
      .match_records(&MatchQuery::completed())
      .await
      .map_err(core_err)?;
    let standings = rank(
      records.iter().filter_map(agent_outcome),
      TieBreak::ScoreDifference,
    );
    let agents = self.store.list_agents().await.map_err(core_err)?;
    Ok(reconcile(&agents, &standings))
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn play(&self, m: &Match) -> Result<Match> {
    let paper = self.require_paper(m.paper_id).await?;
    let opponent = match m.opponent_paper_id {
      Some(id) => Some(self.require_paper(id).await?),
      None => None,
    };
    let second_paper = opponent.as_ref().unwrap_or(&paper);

    let agent1 = self.require_agent(m.agent1_id).await?;
    let agent2 = self.require_agent(m.agent2_id).await?;
    let judge = match m.judge_id {
      Some(id) => JudgeConfig::from_agent(&self.require_agent(id).await?),
      None => self.judge.clone(),
    };

    let body1 = self.review(&agent1, &paper).await?;
    let body2 = self.review(&agent2, second_paper).await?;

    let review1 = self
      .store
      .record_review(NewReview {
        match_id: m.match_id,
        agent_id: agent1.agent_id,
        paper_id: paper.paper_id,
        body:     body1,
      })
      .await
      .map_err(core_err)?;
    let review2 = self
      .store
      .record_review(NewReview {
        match_id: m.match_id,
        agent_id: agent2.agent_id,
        paper_id: second_paper.paper_id,
        body:     body2,
      })
      .await
      .map_err(core_err)?;

    let (label1, label2) = labels(&agent1, &agent2);
    let request = GenerationRequest {
      provider:    judge.provider,
      model:       judge.model.clone(),
      system:      prompt::JUDGE_SYSTEM.into(),
      prompt:      prompt::verdict_prompt(
        Entry { label: &label1, paper: &paper, review: &review1.body },
        Entry { label: &label2, paper: second_paper, review: &review2.body },
      ),
      temperature: judge.temperature,
      max_tokens:  judge.max_tokens,
    };
    let text = self.generate(&request, judge.retry, "judgement").await?;
    let verdict = parse_verdict(&text, &label1, &label2);

    let resolution = Resolution::for_match(m, verdict.winner);
    let evaluation = NewEvaluation {
      match_id:   m.match_id,
      review1_id: review1.review_id,
      review2_id: review2.review_id,
      winner_id:  resolution.winner_id,
      scores:     verdict.scores,
      reasoning:  verdict.reasoning,
    };
    self
      .store
      .complete_match(m.match_id, evaluation, resolution)
      .await
      .map_err(core_err)
  }

  async fn review(&self, agent: &Agent, paper: &Paper) -> Result<ReviewBody> {
    let request = GenerationRequest {
      provider:    agent.provider,
      model:       agent.model.clone(),
      system:      prompt::REVIEWER_SYSTEM.into(),
      prompt:      prompt::review_prompt(paper),
      temperature: agent.settings.temperature,
      max_tokens:  agent.settings.max_tokens,
    };
    let text = self
      .generate(&request, agent.settings.retry, "review")
      .await?;
    debug!(agent = %agent.name, paper_id = %paper.paper_id, "review generated");
    Ok(parse_review(&text))
  }

  async fn generate(
    &self,
    request: &GenerationRequest,
    retry: RetryPolicy,
    what: &str,
  ) -> Result<String> {
    with_retry(retry, what, || async {
      self.generator.generate(request).await.map_err(core_err)
    })
    .await
  }

  async fn require_match(&self, id: Uuid) -> Result<Match> {
    self
      .store
      .get_match(id)
      .await
      .map_err(core_err)?
      .ok_or_else(|| Error::not_found("match", id))
  }

  async fn require_paper(&self, id: Uuid) -> Result<Paper> {
    self
      .store
      .get_paper(id)
      .await
      .map_err(core_err)?
      .ok_or_else(|| Error::not_found("paper", id))
  }

  async fn require_agent(&self, id: Uuid) -> Result<Agent> {
    self
      .store
      .get_agent(id)
      .await
      .map_err(core_err)?
      .ok_or_else(|| Error::not_found("agent", id))
  }
}

/// Labels the judge uses for the two reviews. Agents sharing a name are told
/// apart by model.
fn labels(first: &Agent, second: &Agent) -> (String, String) {
  if first.name.eq_ignore_ascii_case(&second.name) {
    (
      format!("{} ({})", first.name, first.model),
      format!("{} ({})", second.name, second.model),
    )
  } else {
    (first.name.clone(), second.name.clone())
  }
}

