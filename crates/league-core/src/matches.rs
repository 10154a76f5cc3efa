//! Matches: a unit of competition between two reviewing agents.
//!
//! A match covers either one paper reviewed by both agents, or two papers
//! (head-to-head) where agent 1 reviews the paper and agent 2 reviews the
//! opponent paper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, lifecycle::MatchStatus};

/// One of the two competing positions in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
  First,
  Second,
}

impl Side {
  pub fn other(self) -> Self {
    match self {
      Self::First => Self::Second,
      Self::Second => Self::First,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
  pub match_id:          Uuid,
  pub paper_id:          Uuid,
  /// Present only for head-to-head matches.
  pub opponent_paper_id: Option<Uuid>,
  pub agent1_id:         Uuid,
  pub agent2_id:         Uuid,
  pub judge_id:          Option<Uuid>,
  pub status:            MatchStatus,
  /// The winning agent; `None` is a draw (or an unresolved match).
  pub winner_id:         Option<Uuid>,
  pub error:             Option<String>,
  pub created_at:        DateTime<Utc>,
  pub completed_at:      Option<DateTime<Utc>>,
}

impl Match {
  pub fn is_head_to_head(&self) -> bool { self.opponent_paper_id.is_some() }

  pub fn agent_id(&self, side: Side) -> Uuid {
    match side {
      Side::First => self.agent1_id,
      Side::Second => self.agent2_id,
    }
  }

  /// The paper reviewed by the agent on `side`.
  pub fn paper_for(&self, side: Side) -> Uuid {
    match side {
      Side::First => self.paper_id,
      Side::Second => self.opponent_paper_id.unwrap_or(self.paper_id),
    }
  }

  pub fn side_of(&self, agent_id: Uuid) -> Option<Side> {
    if agent_id == self.agent1_id {
      Some(Side::First)
    } else if agent_id == self.agent2_id {
      Some(Side::Second)
    } else {
      None
    }
  }

  pub fn winning_side(&self) -> Option<Side> { self.winner_id.and_then(|w| self.side_of(w)) }
}

/// Input to [`crate::store::LeagueStore::create_match`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
  pub paper_id:          Uuid,
  #[serde(default)]
  pub opponent_paper_id: Option<Uuid>,
  pub agent1_id:         Uuid,
  pub agent2_id:         Uuid,
  #[serde(default)]
  pub judge_id:          Option<Uuid>,
}

impl NewMatch {
  /// Competing agents must differ from each other and from the judge; the two
  /// papers of a head-to-head match must differ.
  pub fn validate(&self) -> Result<()> {
    if self.agent1_id == self.agent2_id {
      return Err(Error::Validation("competing agents must be distinct".into()));
    }
    if self
      .judge_id
      .is_some_and(|judge| judge == self.agent1_id || judge == self.agent2_id)
    {
      return Err(Error::Validation(
        "the judge must not be one of the competing agents".into(),
      ));
    }
    if self.opponent_paper_id == Some(self.paper_id) {
      return Err(Error::Validation(
        "a head-to-head match needs two distinct papers".into(),
      ));
    }
    Ok(())
  }
}

/// Parameters for [`crate::store::LeagueStore::list_matches`].
///
/// The paper scope fields (`category`, `subcategory`, `year`) filter on the
/// match's primary paper.
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
  pub status:       Option<MatchStatus>,
  /// Matches where the agent is either competitor.
  pub agent_id:     Option<Uuid>,
  /// Matches where the paper is on either side.
  pub paper_id:     Option<Uuid>,
  pub category:     Option<String>,
  pub subcategory:  Option<String>,
  pub year:         Option<i32>,
  pub head_to_head: Option<bool>,
  /// Order by creation time ascending instead of newest first.
  pub oldest_first: bool,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

impl MatchQuery {
  pub fn completed() -> Self {
    Self { status: Some(MatchStatus::Completed), ..Self::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_match() -> NewMatch {
    NewMatch {
      paper_id:          Uuid::new_v4(),
      opponent_paper_id: None,
      agent1_id:         Uuid::new_v4(),
      agent2_id:         Uuid::new_v4(),
      judge_id:          None,
    }
  }

  #[test]
  fn distinct_agents_are_valid() {
    assert!(new_match().validate().is_ok());
  }

  #[test]
  fn same_agent_twice_is_rejected() {
    let mut m = new_match();
    m.agent2_id = m.agent1_id;
    assert!(matches!(m.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn judge_cannot_compete() {
    let mut m = new_match();
    m.judge_id = Some(m.agent2_id);
    assert!(matches!(m.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn head_to_head_needs_two_papers() {
    let mut m = new_match();
    m.opponent_paper_id = Some(m.paper_id);
    assert!(m.validate().is_err());
  }

  #[test]
  fn second_side_reviews_opponent_paper() {
    let opponent = Uuid::new_v4();
    let nm = new_match();
    let m = Match {
      match_id:          Uuid::new_v4(),
      paper_id:          nm.paper_id,
      opponent_paper_id: Some(opponent),
      agent1_id:         nm.agent1_id,
      agent2_id:         nm.agent2_id,
      judge_id:          None,
      status:            MatchStatus::Pending,
      winner_id:         Some(nm.agent2_id),
      error:             None,
      created_at:        Utc::now(),
      completed_at:      None,
    };
    assert_eq!(m.paper_for(Side::First), nm.paper_id);
    assert_eq!(m.paper_for(Side::Second), opponent);
    assert_eq!(m.winning_side(), Some(Side::Second));
    assert_eq!(m.side_of(Uuid::new_v4()), None);
  }
}
