//! Match status state machine and winner resolution.
//!
//! Transitions are monotonic:
//!
//! ```text
//! pending ──► in_progress ──► completed
//!    │             │
//!    └──────► error ◄┘
//! ```
//!
//! `completed` and `error` are terminal.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  agent::MatchResult,
  matches::{Match, Side},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
  Pending,
  InProgress,
  Completed,
  Error,
}

impl MatchStatus {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Error) }

  pub fn can_transition_to(self, next: Self) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::InProgress)
        | (Self::Pending, Self::Error)
        | (Self::InProgress, Self::Completed)
        | (Self::InProgress, Self::Error)
    )
  }

  /// Validate a transition, returning the new status.
  pub fn transition(self, next: Self) -> Result<Self> {
    if self.can_transition_to(next) {
      Ok(next)
    } else {
      Err(Error::InvalidTransition { from: self, to: next })
    }
  }
}

/// How a judged match resolves for its two competitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
  /// `None` means a draw.
  pub winner_id: Option<Uuid>,
  pub results:   [(Uuid, MatchResult); 2],
}

impl Resolution {
  /// Resolve `m` given the judged winning side (`None` = draw).
  pub fn for_match(m: &Match, winner: Option<Side>) -> Self {
    let (first, second) = (m.agent1_id, m.agent2_id);
    match winner {
      Some(Side::First) => Self {
        winner_id: Some(first),
        results:   [(first, MatchResult::Win), (second, MatchResult::Loss)],
      },
      Some(Side::Second) => Self {
        winner_id: Some(second),
        results:   [(first, MatchResult::Loss), (second, MatchResult::Win)],
      },
      None => Self {
        winner_id: None,
        results:   [(first, MatchResult::Draw), (second, MatchResult::Draw)],
      },
    }
  }
}
