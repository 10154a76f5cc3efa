//! Match planning: which agents review which papers.

use league_core::{
  Error, Result,
  agent::Agent,
  matches::NewMatch,
  paper::Paper,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
  /// Both agents review the same paper.
  #[default]
  Single,
  /// Each agent reviews one of two papers from the same
  /// category, subcategory and year.
  HeadToHead,
}

/// Input to [`crate::CompetitionManager::generate_matches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
  #[serde(default)]
  pub category:    Option<String>,
  #[serde(default)]
  pub subcategory: Option<String>,
  #[serde(default)]
  pub year:        Option<i32>,
  /// Maximum number of papers to draw.
  #[serde(default = "default_limit")]
  pub limit:       usize,
  #[serde(default)]
  pub mode:        MatchMode,
  /// Offset into the agent pair rotation.
  #[serde(default)]
  pub seed:        u64,
}

fn default_limit() -> usize { 10 }

impl Default for GenerateRequest {
  fn default() -> Self {
    Self {
      category:    None,
      subcategory: None,
      year:        None,
      limit:       default_limit(),
      mode:        MatchMode::default(),
      seed:        0,
    }
  }
}

/// Every unordered pair of distinct agents, in input order.
pub fn agent_pairs(agents: &[Agent]) -> Vec<(Uuid, Uuid)> {
  agents
    .iter()
    .enumerate()
    .flat_map(|(i, a)| agents[i + 1..].iter().map(move |b| (a.agent_id, b.agent_id)))
    .collect()
}

/// Plan matches for `papers`, assigning agent pairs round-robin starting at
/// `seed`.
///
/// In head-to-head mode consecutive papers of the same
/// (category, subcategory, year) group are paired; a group's odd paper out is
/// left unmatched.
pub fn plan_matches(
  papers: &[Paper],
  agents: &[Agent],
  mode: MatchMode,
  seed: u64,
) -> Result<Vec<NewMatch>> {
  let pairs = agent_pairs(agents);
  if pairs.is_empty() {
    return Err(Error::Validation(
      "at least two registered agents are needed to generate matches".into(),
    ));
  }
  let start = (seed % pairs.len() as u64) as usize;
  let pair = |n: usize| pairs[(start + n) % pairs.len()];

  let paper_pairs: Vec<(Uuid, Option<Uuid>)> = match mode {
    MatchMode::Single => papers.iter().map(|p| (p.paper_id, None)).collect(),
    MatchMode::HeadToHead => {
      let mut groups: Vec<Vec<&Paper>> = Vec::new();
      for paper in papers {
        let group = groups.iter_mut().find(|g| {
          let first = g[0];
          first.category == paper.category
            && first.subcategory == paper.subcategory
            && first.year == paper.year
        });
        match group {
          Some(g) => g.push(paper),
          None => groups.push(vec![paper]),
        }
      }
      groups
        .iter()
        .flat_map(|g| g.chunks_exact(2))
        .map(|two| (two[0].paper_id, Some(two[1].paper_id)))
        .collect()
    }
  };

  Ok(
    paper_pairs
      .into_iter()
      .enumerate()
      .map(|(n, (paper_id, opponent_paper_id))| {
        let (agent1_id, agent2_id) = pair(n);
        NewMatch {
          paper_id,
          opponent_paper_id,
          agent1_id,
          agent2_id,
          judge_id: None,
        }
      })
      .collect(),
  )
}
