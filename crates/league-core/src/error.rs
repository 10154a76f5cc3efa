//! Error taxonomy shared by every league crate.
//!
//! Parse failures are not represented here: the review and evaluation parsers
//! fall back to defaults instead of failing.

use thiserror::Error;

use crate::lifecycle::MatchStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("invalid status transition: {from} -> {to}")]
  InvalidTransition { from: MatchStatus, to: MatchStatus },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("upstream failure: {0}")]
  Upstream(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }

  /// Machine-readable code carried in HTTP error bodies.
  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound { .. } => "not_found",
      Self::Validation(_) => "validation",
      Self::InvalidTransition { .. } => "invalid_transition",
      Self::Conflict(_) => "conflict",
      Self::Upstream(_) => "upstream_failure",
      Self::Storage(_) => "storage",
      Self::Serialization(_) => "serialization",
    }
  }

  /// Only upstream failures are retried, and only inside a single call.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::Upstream(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
