//! Competition management for the paper evaluation league.
//!
//! [`CompetitionManager`] drives a match from `pending` to a terminal state:
//! two reviews, one judged verdict, and an atomic completion that updates the
//! agents' counters. [`leaderboard`] replays completed matches into standings.

pub mod leaderboard;
pub mod manager;
pub mod plan;
mod retry;

pub use manager::{CompetitionManager, JudgeConfig, RunSummary};
pub use plan::{GenerateRequest, MatchMode};

pub(crate) fn core_err<E: Into<league_core::Error>>(e: E) -> league_core::Error { e.into() }

#[cfg(test)]
mod tests;
