//! Judge evaluations: five criterion score pairs and a winner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matches::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
  TechnicalCorrectness,
  DepthOfAnalysis,
  ConstructiveFeedback,
  Clarity,
  Fairness,
}

impl Criterion {
  pub const ALL: [Criterion; 5] = [
    Self::TechnicalCorrectness,
    Self::DepthOfAnalysis,
    Self::ConstructiveFeedback,
    Self::Clarity,
    Self::Fairness,
  ];

  /// The header the judge writes before this criterion's two scores.
  pub fn header(self) -> &'static str {
    match self {
      Self::TechnicalCorrectness => "Technical Correctness",
      Self::DepthOfAnalysis => "Depth of Analysis",
      Self::ConstructiveFeedback => "Constructive Feedback",
      Self::Clarity => "Clarity",
      Self::Fairness => "Fairness",
    }
  }
}

/// Scores for the first and second review on one criterion, each 1–10
/// (0 when the judge omitted it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
  pub first:  u8,
  pub second: u8,
}

impl ScorePair {
  pub fn get(&self, side: Side) -> u8 {
    match side {
      Side::First => self.first,
      Side::Second => self.second,
    }
  }

  pub fn set(&mut self, side: Side, score: u8) {
    match side {
      Side::First => self.first = score,
      Side::Second => self.second = score,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScores {
  pub technical_correctness: ScorePair,
  pub depth_of_analysis:     ScorePair,
  pub constructive_feedback: ScorePair,
  pub clarity:               ScorePair,
  pub fairness:              ScorePair,
}

impl CriterionScores {
  pub fn get(&self, criterion: Criterion) -> ScorePair {
    match criterion {
      Criterion::TechnicalCorrectness => self.technical_correctness,
      Criterion::DepthOfAnalysis => self.depth_of_analysis,
      Criterion::ConstructiveFeedback => self.constructive_feedback,
      Criterion::Clarity => self.clarity,
      Criterion::Fairness => self.fairness,
    }
  }

  pub fn get_mut(&mut self, criterion: Criterion) -> &mut ScorePair {
    match criterion {
      Criterion::TechnicalCorrectness => &mut self.technical_correctness,
      Criterion::DepthOfAnalysis => &mut self.depth_of_analysis,
      Criterion::ConstructiveFeedback => &mut self.constructive_feedback,
      Criterion::Clarity => &mut self.clarity,
      Criterion::Fairness => &mut self.fairness,
    }
  }

  /// Sum of the five scores given to `side`.
  pub fn total(&self, side: Side) -> u32 {
    Criterion::ALL
      .iter()
      .map(|c| u32::from(self.get(*c).get(side)))
      .sum()
  }
}

/// The parsed output of a judge, before it is attached to a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
  pub scores:    CriterionScores,
  /// `None` is a draw.
  pub winner:    Option<Side>,
  pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
  pub evaluation_id: Uuid,
  pub match_id:      Uuid,
  pub review1_id:    Uuid,
  pub review2_id:    Uuid,
  pub winner_id:     Option<Uuid>,
  pub scores:        CriterionScores,
  pub reasoning:     String,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
  pub match_id:   Uuid,
  pub review1_id: Uuid,
  pub review2_id: Uuid,
  pub winner_id:  Option<Uuid>,
  pub scores:     CriterionScores,
  pub reasoning:  String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_sums_one_side() {
    let mut scores = CriterionScores::default();
    for (i, c) in Criterion::ALL.into_iter().enumerate() {
      scores.get_mut(c).set(Side::First, i as u8 + 1);
      scores.get_mut(c).set(Side::Second, 10);
    }
    assert_eq!(scores.total(Side::First), 15);
    assert_eq!(scores.total(Side::Second), 50);
  }
}
