//! Community feedback on matches and their reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_COMMENT_CHARS: usize = 1000;

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
#[strum(serialize_all = "lowercase")]
pub enum Vote {
  Agree,
  Disagree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
  pub feedback_id: Uuid,
  pub match_id:    Uuid,
  pub review_id:   Option<Uuid>,
  pub author:      Option<String>,
  pub vote:        Option<Vote>,
  pub comment:     Option<String>,
  pub likes:       i64,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
}

/// Input to [`crate::store::LeagueStore::submit_feedback`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewFeedback {
  #[serde(default)]
  pub match_id:  Uuid,
  #[serde(default)]
  pub review_id: Option<Uuid>,
  #[serde(default)]
  pub author:    Option<String>,
  #[serde(default)]
  pub vote:      Option<Vote>,
  #[serde(default)]
  pub comment:   Option<String>,
}

impl NewFeedback {
  pub fn validate(&self) -> Result<()> {
    if self.vote.is_none() && self.comment.is_none() {
      return Err(Error::Validation(
        "feedback needs a vote or a comment".into(),
      ));
    }
    if let Some(comment) = &self.comment {
      let len = comment.trim().chars().count();
      if len == 0 || len > MAX_COMMENT_CHARS {
        return Err(Error::Validation(format!(
          "comment must be 1-{MAX_COMMENT_CHARS} characters"
        )));
      }
    }
    Ok(())
  }

  /// A vote from a known author replaces that author's earlier vote on the
  /// same match.
  pub fn is_vote_update(&self) -> bool {
    self.vote.is_some() && self.comment.is_none() && self.author.is_some()
  }
}
