//! Agents: named configurations of a backing text-generation model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  standings::{POINTS_DRAW, POINTS_LOSS, POINTS_WIN},
};

// ─── Provider ────────────────────────────────────────────────────────────────

/// The third-party API an agent's model is served from.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
  OpenAi,
  Anthropic,
}

// ─── Generation settings ─────────────────────────────────────────────────────

/// Fixed-count, fixed-delay retry applied to a single upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub delay_ms:     u64,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { max_attempts: 3, delay_ms: 1000 } }
}

impl RetryPolicy {
  pub fn delay(&self) -> Duration { Duration::from_millis(self.delay_ms) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
  pub temperature: f32,
  pub max_tokens:  u32,
  #[serde(default)]
  pub retry:       RetryPolicy,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      temperature: 0.3,
      max_tokens:  2000,
      retry:       RetryPolicy::default(),
    }
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// The outcome of one match from a single participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
  Win,
  Draw,
  Loss,
}

impl MatchResult {
  pub fn points(self) -> i64 {
    match self {
      Self::Win => POINTS_WIN,
      Self::Draw => POINTS_DRAW,
      Self::Loss => POINTS_LOSS,
    }
  }
}

/// Cumulative counters, maintained incrementally as matches resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
  pub matches_played: i64,
  pub matches_won:    i64,
  pub matches_drawn:  i64,
  pub matches_lost:   i64,
  pub points:         i64,
}

impl AgentRecord {
  pub fn apply(&mut self, result: MatchResult) {
    self.matches_played += 1;
    self.points += result.points();
    match result {
      MatchResult::Win => self.matches_won += 1,
      MatchResult::Draw => self.matches_drawn += 1,
      MatchResult::Loss => self.matches_lost += 1,
    }
  }

  pub fn win_rate(&self) -> f64 {
    if self.matches_played == 0 {
      0.0
    } else {
      self.matches_won as f64 / self.matches_played as f64
    }
  }
}

// ─── Agent ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
  pub agent_id:   Uuid,
  pub name:       String,
  pub model:      String,
  pub provider:   Provider,
  pub settings:   GenerationSettings,
  pub record:     AgentRecord,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::LeagueStore::register_agent`]. Registration is
/// get-or-create on `(name, model)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
  pub name:     String,
  pub model:    String,
  pub provider: Provider,
  #[serde(default)]
  pub settings: GenerationSettings,
}

impl NewAgent {
  pub fn new(name: impl Into<String>, model: impl Into<String>, provider: Provider) -> Self {
    Self {
      name: name.into(),
      model: model.into(),
      provider,
      settings: GenerationSettings::default(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() || self.model.trim().is_empty() {
      return Err(Error::Validation("agent name and model are required".into()));
    }
    if self.settings.retry.max_attempts == 0 {
      return Err(Error::Validation("retry.max_attempts must be at least 1".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_apply_counts_points() {
    let mut r = AgentRecord::default();
    r.apply(MatchResult::Win);
    r.apply(MatchResult::Draw);
    r.apply(MatchResult::Loss);
    assert_eq!(r, AgentRecord {
      matches_played: 3,
      matches_won:    1,
      matches_drawn:  1,
      matches_lost:   1,
      points:         4,
    });
  }

  #[test]
  fn provider_parses_case_insensitively() {
    assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
    assert_eq!(Provider::Anthropic.as_ref(), "anthropic");
    assert!("gemini".parse::<Provider>().is_err());
  }

  #[test]
  fn zero_attempts_is_invalid() {
    let mut a = NewAgent::new("Reviewer", "gpt-4", Provider::OpenAi);
    a.settings.retry.max_attempts = 0;
    assert!(a.validate().is_err());
  }
}
