use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
pub enum ReviewConfidence {
  #[default]
  Low,
  Medium,
  High,
}

/// The structured content of a review, as produced by the review parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBody {
  pub summary:    String,
  pub strengths:  Vec<String>,
  pub weaknesses: Vec<String>,
  pub questions:  Vec<String>,
  pub rating:     i32,
  pub confidence: ReviewConfidence,
}

/// One agent's review of one paper within one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub review_id:  Uuid,
  pub match_id:   Uuid,
  pub agent_id:   Uuid,
  pub paper_id:   Uuid,
  #[serde(flatten)]
  pub body:       ReviewBody,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
  pub match_id: Uuid,
  pub agent_id: Uuid,
  pub paper_id: Uuid,
  pub body:     ReviewBody,
}
