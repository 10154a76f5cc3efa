//! Server assembly for the paper evaluation league.
//!
//! Configuration loading, start-up agent registration, the top-level router,
//! and the offline helpers behind the `import`, `export` and `rank`
//! subcommands.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::{Json, Router, routing::get};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use league_api::{AppState, api_router};
use league_arena::JudgeConfig;
use league_codec::interchange::{MatchDocument, MatchesDocument, parse_papers, to_yaml};
use league_core::{
  Error, Result,
  agent::{Agent, GenerationSettings, NewAgent, Provider, RetryPolicy},
  matches::MatchQuery,
  standings::{Standing, TieBreak, rank},
  store::LeagueStore,
  upstream::{PaperSource, TextGenerator},
};
use league_providers::{Endpoint, UpstreamConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `league.toml` layered
/// with `LEAGUE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub request_timeout_secs: u64,
  pub openai:               ProviderConfig,
  pub anthropic:            ProviderConfig,
  pub arxiv_base_url:       Option<String>,
  /// Judge for matches without a judge agent.
  pub judge:                JudgeConfig,
  /// Agents registered (get-or-create) at start-up.
  pub agents:               Vec<AgentConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".into(),
      port:                 8080,
      store_path:           PathBuf::from("league.db"),
      request_timeout_secs: 30,
      openai:               ProviderConfig::default(),
      anthropic:            ProviderConfig::default(),
      arxiv_base_url:       None,
      judge:                JudgeConfig::default(),
      agents:               Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
  pub api_key:  Option<String>,
  /// Overrides the provider's public endpoint.
  pub base_url: Option<String>,
}

impl ProviderConfig {
  fn endpoint(&self, default_base_url: &str) -> Endpoint {
    Endpoint {
      base_url: self
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url.to_owned()),
      api_key:  self.api_key.clone(),
    }
  }
}

/// One agent to register at start-up. Unset generation settings take the
/// agent defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
  pub name:           String,
  pub model:          String,
  pub provider:       Provider,
  pub temperature:    Option<f32>,
  pub max_tokens:     Option<u32>,
  pub max_retries:    Option<u32>,
  pub retry_delay_ms: Option<u64>,
}

impl AgentConfig {
  pub fn to_new_agent(&self) -> NewAgent {
    let defaults = GenerationSettings::default();
    NewAgent {
      name:     self.name.clone(),
      model:    self.model.clone(),
      provider: self.provider,
      settings: GenerationSettings {
        temperature: self.temperature.unwrap_or(defaults.temperature),
        max_tokens:  self.max_tokens.unwrap_or(defaults.max_tokens),
        retry:       RetryPolicy {
          max_attempts: self.max_retries.unwrap_or(defaults.retry.max_attempts),
          delay_ms:     self.retry_delay_ms.unwrap_or(defaults.retry.delay_ms),
        },
      },
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `LEAGUE_*` environment variables.
  /// Nested keys use `__`, e.g. `LEAGUE_OPENAI__API_KEY`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(
        Environment::with_prefix("LEAGUE")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn upstream(&self) -> UpstreamConfig {
    let defaults = UpstreamConfig::default();
    UpstreamConfig {
      openai:         self.openai.endpoint(&defaults.openai.base_url),
      anthropic:      self.anthropic.endpoint(&defaults.anthropic.base_url),
      arxiv_base_url: self
        .arxiv_base_url
        .clone()
        .unwrap_or(defaults.arxiv_base_url),
      timeout:        Duration::from_secs(self.request_timeout_secs),
    }
  }
}

// ─── Start-up ─────────────────────────────────────────────────────────────────

/// Get-or-create every configured agent.
pub async fn register_agents<S: LeagueStore>(
  store: &S,
  agents: &[AgentConfig],
) -> Result<Vec<Agent>> {
  let mut registered = Vec::with_capacity(agents.len());
  for config in agents {
    let agent = store
      .register_agent(config.to_new_agent())
      .await
      .map_err(Into::<Error>::into)?;
    info!(
      agent_id = %agent.agent_id,
      name = %agent.name,
      model = %agent.model,
      provider = %agent.provider,
      "agent registered"
    );
    registered.push(agent);
  }
  Ok(registered)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// `/health` plus the JSON API under `/api`, with request tracing.
pub fn app<S, G, P>(state: AppState<S, G, P>) -> Router
where
  S: LeagueStore + 'static,
  G: TextGenerator + 'static,
  P: PaperSource + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ─── Offline commands ─────────────────────────────────────────────────────────

/// Add every paper of a YAML papers document. Returns `(added, skipped)`;
/// papers whose arXiv id is already stored are skipped.
pub async fn import_papers<S: LeagueStore>(
  store: &S,
  yaml: &str,
  category: &str,
  subcategory: &str,
  year: i32,
) -> Result<(usize, usize)> {
  let doc = parse_papers(yaml)?;
  let (mut added, mut skipped) = (0, 0);
  for paper in doc.papers {
    let input = paper.into_new_paper(category, subcategory, year);
    match store.add_paper(input).await.map_err(Into::<Error>::into) {
      Ok(_) => added += 1,
      Err(Error::Conflict(_)) => skipped += 1,
      Err(e) => return Err(e),
    }
  }
  Ok((added, skipped))
}

/// Completed matches as a YAML matches document, oldest first.
pub async fn export_matches<S: LeagueStore>(store: &S) -> Result<String> {
  let query = MatchQuery { oldest_first: true, ..MatchQuery::completed() };
  let records = store
    .match_records(&query)
    .await
    .map_err(Into::<Error>::into)?;
  let agents = store.list_agents().await.map_err(Into::<Error>::into)?;
  let doc = MatchesDocument {
    matches: records
      .iter()
      .map(|r| MatchDocument::from_record(r, &agents))
      .collect(),
  };
  Ok(to_yaml(&doc)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RankBy {
  /// Reviewing agents, by name.
  Reviewers,
  /// Papers of head-to-head matches, by id.
  Papers,
}

/// A leaderboard line for an exported matches document.
#[derive(Debug, Clone, PartialEq)]
pub struct RankRow {
  pub rank:    usize,
  pub name:    String,
  pub points:  i64,
  pub wins:    i64,
  pub draws:   i64,
  pub losses:  i64,
  pub matches: i64,
  pub average: f64,
}

fn rows<Id: ToString>(standings: Vec<Standing<Id>>) -> Vec<RankRow> {
  standings
    .into_iter()
    .enumerate()
    .map(|(i, s)| RankRow {
      rank:    i + 1,
      name:    s.id.to_string(),
      points:  s.points,
      wins:    s.wins,
      draws:   s.draws,
      losses:  s.losses,
      matches: s.matches,
      average: s.average_score(),
    })
    .collect()
}

/// Rank a matches document without a database.
pub fn rank_document(doc: &MatchesDocument, by: RankBy) -> Vec<RankRow> {
  match by {
    RankBy::Reviewers => rows(rank(
      doc.matches.iter().filter_map(MatchDocument::reviewer_outcome),
      TieBreak::ScoreDifference,
    )),
    RankBy::Papers => rows(rank(
      doc.matches.iter().filter_map(MatchDocument::paper_outcome),
      TieBreak::AverageScore,
    )),
  }
}

pub fn render_table(rows: &[RankRow]) -> String {
  let width = rows
    .iter()
    .map(|r| r.name.chars().count())
    .max()
    .unwrap_or(0)
    .max(4);
  let mut out = format!(
    "{:>4}  {:<width$}  {:>6}  {:>3}  {:>3}  {:>3}  {:>7}  {:>7}\n",
    "#", "name", "points", "W", "D", "L", "matches", "avg"
  );
  for r in rows {
    out.push_str(&format!(
      "{:>4}  {:<width$}  {:>6}  {:>3}  {:>3}  {:>3}  {:>7}  {:>7.2}\n",
      r.rank, r.name, r.points, r.wins, r.draws, r.losses, r.matches, r.average
    ));
  }
  out
}
