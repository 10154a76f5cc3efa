//! Ranking aggregation.
//!
//! Standings are never stored. They are folded on demand from completed match
//! records, so the match log stays canonical and agent counters on
//! [`Agent::record`](crate::agent::Agent) are only an incremental projection
//! checked by [`reconcile`].

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  agent::{Agent, AgentRecord},
  matches::Side,
  store::MatchRecord,
};

pub const POINTS_WIN: i64 = 3;
pub const POINTS_DRAW: i64 = 1;
pub const POINTS_LOSS: i64 = 0;

// ─── Input ───────────────────────────────────────────────────────────────────

/// One completed match reduced to what ranking needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<Id> {
  pub participants: [Id; 2],
  /// `None`, or an id that is not a participant, counts as a draw.
  pub winner:       Option<Id>,
  pub scores:       [f64; 2],
}

/// The third sort key, applied after points and wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
  /// Mean per-match score. Used for papers.
  AverageScore,
  /// Σ own score − opponent score. Used for agents.
  ScoreDifference,
}

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing<Id> {
  pub id:          Id,
  pub points:      i64,
  pub wins:        i64,
  pub draws:       i64,
  pub losses:      i64,
  pub matches:     i64,
  pub total_score: f64,
  pub score_diff:  f64,
}

impl<Id> Standing<Id> {
  fn new(id: Id) -> Self {
    Self {
      id,
      points: 0,
      wins: 0,
      draws: 0,
      losses: 0,
      matches: 0,
      total_score: 0.0,
      score_diff: 0.0,
    }
  }

  pub fn average_score(&self) -> f64 {
    if self.matches == 0 {
      0.0
    } else {
      self.total_score / self.matches as f64
    }
  }

  fn tie_value(&self, tie_break: TieBreak) -> f64 {
    match tie_break {
      TieBreak::AverageScore => self.average_score(),
      TieBreak::ScoreDifference => self.score_diff,
    }
  }

  /// The counters an agent should carry if it had played exactly these
  /// matches.
  pub fn as_record(&self) -> AgentRecord {
    AgentRecord {
      matches_played: self.matches,
      matches_won:    self.wins,
      matches_drawn:  self.draws,
      matches_lost:   self.losses,
      points:         self.points,
    }
  }
}

// ─── Fold ────────────────────────────────────────────────────────────────────

/// Fold outcomes into a total ordering.
///
/// Sorted descending by points, then wins, then `tie_break`; then ascending by
/// match count and finally by id. Outcomes pairing a participant with itself
/// are ignored.
pub fn rank<Id, I>(outcomes: I, tie_break: TieBreak) -> Vec<Standing<Id>>
where
  Id: Ord + Clone,
  I: IntoIterator<Item = Outcome<Id>>,
{
  let mut table: BTreeMap<Id, Standing<Id>> = BTreeMap::new();

  for Outcome { participants, winner, scores } in outcomes {
    if participants[0] == participants[1] {
      continue;
    }
    let winner = winner.filter(|w| participants.contains(w));

    for (i, id) in participants.into_iter().enumerate() {
      let (own, opponent) = (scores[i], scores[1 - i]);
      let entry = table
        .entry(id.clone())
        .or_insert_with(|| Standing::new(id.clone()));

      entry.matches += 1;
      entry.total_score += own;
      entry.score_diff += own - opponent;
      match &winner {
        Some(w) if *w == id => {
          entry.wins += 1;
          entry.points += POINTS_WIN;
        }
        Some(_) => {
          entry.losses += 1;
          entry.points += POINTS_LOSS;
        }
        None => {
          entry.draws += 1;
          entry.points += POINTS_DRAW;
        }
      }
    }
  }

  let mut standings: Vec<_> = table.into_values().collect();
  standings.sort_by(|x, y| compare(x, y, tie_break));
  standings
}

fn compare<Id: Ord>(x: &Standing<Id>, y: &Standing<Id>, tie_break: TieBreak) -> Ordering {
  y.points
    .cmp(&x.points)
    .then_with(|| y.wins.cmp(&x.wins))
    .then_with(|| y.tie_value(tie_break).total_cmp(&x.tie_value(tie_break)))
    .then_with(|| x.matches.cmp(&y.matches))
    .then_with(|| x.id.cmp(&y.id))
}

// ─── Match records → outcomes ────────────────────────────────────────────────

/// The agent view of a completed match: the two competitors, scored by the sum
/// of the judge's five criterion scores for their review. `None` when the
/// match has no evaluation.
pub fn agent_outcome(record: &MatchRecord) -> Option<Outcome<Uuid>> {
  let evaluation = record.evaluation.as_ref()?;
  let m = &record.r#match;
  Some(Outcome {
    participants: [m.agent1_id, m.agent2_id],
    winner:       evaluation.winner_id,
    scores:       [
      f64::from(evaluation.scores.total(Side::First)),
      f64::from(evaluation.scores.total(Side::Second)),
    ],
  })
}

/// The paper view of a completed two-paper match: each paper scored by the
/// rating its reviewer gave it, the winner being the paper on the winning
/// agent's side. `None` for single-paper matches.
pub fn paper_outcome(record: &MatchRecord) -> Option<Outcome<Uuid>> {
  let m = &record.r#match;
  let opponent = m.opponent_paper_id?;
  let rating = |side: Side| {
    record
      .reviews
      .iter()
      .find(|r| r.agent_id == m.agent_id(side))
      .map(|r| f64::from(r.body.rating))
      .unwrap_or(0.0)
  };
  Some(Outcome {
    participants: [m.paper_id, opponent],
    winner:       m.winning_side().map(|side| m.paper_for(side)),
    scores:       [rating(Side::First), rating(Side::Second)],
  })
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
  pub agent_id: Uuid,
  pub name:     String,
  pub recorded: AgentRecord,
  pub replayed: AgentRecord,
}

/// Compare each agent's stored counters with the replayed standings.
pub fn reconcile(agents: &[Agent], standings: &[Standing<Uuid>]) -> Vec<Discrepancy> {
  let replayed: BTreeMap<Uuid, AgentRecord> =
    standings.iter().map(|s| (s.id, s.as_record())).collect();

  agents
    .iter()
    .filter_map(|agent| {
      let replay = replayed.get(&agent.agent_id).copied().unwrap_or_default();
      (replay != agent.record).then(|| Discrepancy {
        agent_id: agent.agent_id,
        name:     agent.name.clone(),
        recorded: agent.record,
        replayed: replay,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn outcome(a: u32, b: u32, winner: Option<u32>, scores: [f64; 2]) -> Outcome<u32> {
    Outcome { participants: [a, b], winner, scores }
  }

  #[test]
  fn points_sum_matches_decisive_and_drawn_counts() {
    let outcomes = vec![
      outcome(1, 2, Some(1), [40.0, 30.0]),
      outcome(2, 3, None, [20.0, 20.0]),
      outcome(3, 1, Some(3), [45.0, 10.0]),
      outcome(1, 2, None, [25.0, 25.0]),
    ];
    let standings = rank(outcomes, TieBreak::ScoreDifference);
    let total: i64 = standings.iter().map(|s| s.points).sum();
    assert_eq!(total, 3 * 2 + 2 * 2);
  }

  #[test]
  fn win_and_draw_examples() {
    let standings = rank(
      vec![outcome(1, 2, Some(1), [1.0, 0.0])],
      TieBreak::ScoreDifference,
    );
    assert_eq!(standings[0].id, 1);
    assert_eq!((standings[0].points, standings[0].wins), (3, 1));
    assert_eq!((standings[1].points, standings[1].losses), (0, 1));

    let standings = rank(vec![outcome(1, 2, None, [1.0, 1.0])], TieBreak::ScoreDifference);
    assert!(standings.iter().all(|s| s.points == 1 && s.draws == 1));
  }

  #[test]
  fn fewer_matches_ranks_higher_on_equal_points_and_wins() {
    // 1: one win (3 pts, 1 match). 2: one win + one loss (3 pts, 2 matches).
    let outcomes = vec![
      outcome(1, 9, Some(1), [5.0, 5.0]),
      outcome(2, 8, Some(2), [5.0, 5.0]),
      outcome(2, 7, Some(7), [5.0, 5.0]),
    ];
    let standings = rank(outcomes, TieBreak::ScoreDifference);
    let pos = |id| standings.iter().position(|s| s.id == id).unwrap();
    assert!(pos(1) < pos(2));
  }

  #[test]
  fn average_score_breaks_ties_for_papers() {
    let outcomes = vec![
      outcome(1, 2, None, [8.0, 6.0]),
    ];
    let standings = rank(outcomes, TieBreak::AverageScore);
    assert_eq!(standings[0].id, 1);
    assert_eq!(standings[0].average_score(), 8.0);
  }

  #[test]
  fn unknown_winner_counts_as_draw() {
    let standings = rank(vec![outcome(1, 2, Some(5), [0.0, 0.0])], TieBreak::ScoreDifference);
    assert!(standings.iter().all(|s| s.draws == 1));
  }

  #[test]
  fn self_pairs_are_ignored() {
    assert!(rank(vec![outcome(4, 4, Some(4), [1.0, 1.0])], TieBreak::AverageScore).is_empty());
  }

  #[test]
  fn id_is_the_final_tie_break() {
    let standings = rank(vec![outcome(7, 3, None, [2.0, 2.0])], TieBreak::AverageScore);
    assert_eq!(standings.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 7]);
  }
}
