//! Replayed leaderboards and league statistics.

use std::collections::HashMap;

use league_core::{
  Result,
  agent::Agent,
  lifecycle::MatchStatus,
  matches::MatchQuery,
  paper::PaperQuery,
  standings::{Standing, TieBreak, agent_outcome, paper_outcome, rank},
  store::LeagueStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core_err;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStanding {
  pub rank:     usize,
  pub name:     String,
  pub model:    String,
  #[serde(flatten)]
  pub standing: Standing<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperStanding {
  pub rank:     usize,
  pub title:    String,
  #[serde(flatten)]
  pub standing: Standing<Uuid>,
  pub average:  f64,
}

/// Which papers a paper leaderboard covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperScope {
  #[serde(default)]
  pub category:    Option<String>,
  #[serde(default)]
  pub subcategory: Option<String>,
  #[serde(default)]
  pub year:        Option<i32>,
}

/// Agent standings replayed from every completed match.
pub async fn agent_standings<S: LeagueStore>(store: &S) -> Result<Vec<AgentStanding>> {
  let records = store
    .match_records(&MatchQuery::completed())
    .await
    .map_err(core_err)?;
  let agents: HashMap<Uuid, Agent> = store
    .list_agents()
    .await
    .map_err(core_err)?
    .into_iter()
    .map(|a| (a.agent_id, a))
    .collect();

  let standings = rank(
    records.iter().filter_map(agent_outcome),
    TieBreak::ScoreDifference,
  );
  Ok(
    standings
      .into_iter()
      .enumerate()
      .map(|(i, standing)| {
        let agent = agents.get(&standing.id);
        AgentStanding {
          rank: i + 1,
          name: agent.map(|a| a.name.clone()).unwrap_or_default(),
          model: agent.map(|a| a.model.clone()).unwrap_or_default(),
          standing,
        }
      })
      .collect(),
  )
}

/// Paper standings for completed head-to-head matches inside `scope`.
pub async fn paper_standings<S: LeagueStore>(
  store: &S,
  scope: &PaperScope,
) -> Result<Vec<PaperStanding>> {
  let query = MatchQuery {
    category: scope.category.clone(),
    subcategory: scope.subcategory.clone(),
    year: scope.year,
    head_to_head: Some(true),
    ..MatchQuery::completed()
  };
  let records = store
    .match_records(&query)
    .await
    .map_err(core_err)?;
  let titles: HashMap<Uuid, String> = store
    .list_papers(&PaperQuery {
      category: scope.category.clone(),
      subcategory: scope.subcategory.clone(),
      year: scope.year,
      ..Default::default()
    })
    .await
    .map_err(core_err)?
    .into_iter()
    .map(|p| (p.paper_id, p.title))
    .collect();

  let standings = rank(
    records.iter().filter_map(paper_outcome),
    TieBreak::AverageScore,
  );
  Ok(
    standings
      .into_iter()
      .enumerate()
      .map(|(i, standing)| PaperStanding {
        rank: i + 1,
        title: titles.get(&standing.id).cloned().unwrap_or_default(),
        average: standing.average_score(),
        standing,
      })
      .collect(),
  )
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTotals {
  pub total:       u64,
  pub pending:     u64,
  pub in_progress: u64,
  pub completed:   u64,
  pub error:       u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentHighlight {
  pub agent_id:       Uuid,
  pub name:           String,
  pub matches_played: i64,
  pub win_rate:       f64,
}

impl From<&Agent> for AgentHighlight {
  fn from(a: &Agent) -> Self {
    Self {
      agent_id:       a.agent_id,
      name:           a.name.clone(),
      matches_played: a.record.matches_played,
      win_rate:       a.record.win_rate(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueStats {
  pub papers:       usize,
  pub agents:       usize,
  pub matches:      MatchTotals,
  /// Highest win rate among agents that have played.
  pub top_win_rate: Option<AgentHighlight>,
  pub most_active:  Option<AgentHighlight>,
}

pub async fn league_stats<S: LeagueStore>(store: &S) -> Result<LeagueStats> {
  let count = |status: Option<MatchStatus>| {
    let query = MatchQuery { status, ..Default::default() };
    async move {
      store
        .count_matches(&query)
        .await
        .map_err(core_err)
    }
  };
  let matches = MatchTotals {
    total:       count(None).await?,
    pending:     count(Some(MatchStatus::Pending)).await?,
    in_progress: count(Some(MatchStatus::InProgress)).await?,
    completed:   count(Some(MatchStatus::Completed)).await?,
    error:       count(Some(MatchStatus::Error)).await?,
  };

  let papers = store
    .list_papers(&PaperQuery::default())
    .await
    .map_err(core_err)?
    .len();
  let agents = store
    .list_agents()
    .await
    .map_err(core_err)?;

  let played = || agents.iter().filter(|a| a.record.matches_played > 0);
  let top_win_rate = played()
    .max_by(|x, y| {
      x.record
        .win_rate()
        .total_cmp(&y.record.win_rate())
        .then_with(|| y.name.cmp(&x.name))
    })
    .map(AgentHighlight::from);
  let most_active = played()
    .max_by(|x, y| {
      x.record
        .matches_played
        .cmp(&y.record.matches_played)
        .then_with(|| y.name.cmp(&x.name))
    })
    .map(AgentHighlight::from);

  Ok(LeagueStats {
    papers,
    agents: agents.len(),
    matches,
    top_win_rate,
    most_active,
  })
}
