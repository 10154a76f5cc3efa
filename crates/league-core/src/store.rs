//! The `LeagueStore` trait.
//!
//! Implemented by storage backends (e.g. `league-store-sqlite`). The
//! competition manager and the HTTP layer depend on this abstraction only.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  agent::{Agent, NewAgent},
  evaluation::{Evaluation, NewEvaluation},
  feedback::{Feedback, NewFeedback},
  lifecycle::Resolution,
  matches::{Match, MatchQuery, NewMatch},
  paper::{ArxivDetails, NewPaper, Paper, PaperQuery},
  review::{NewReview, Review},
};

/// A match with everything recorded against it, as consumed by ranking and
/// export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
  #[serde(rename = "match")]
  pub r#match:    Match,
  pub reviews:    Vec<Review>,
  pub evaluation: Option<Evaluation>,
}

/// Abstraction over a league persistence backend.
///
/// Papers are never deleted and never modified except for their enrichment
/// details. Match status only moves forward; every status write is guarded by
/// the status it expects to replace.
pub trait LeagueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Papers ────────────────────────────────────────────────────────────

  /// Persist a new paper. A duplicate arXiv id is a conflict.
  fn add_paper(
    &self,
    input: NewPaper,
  ) -> impl Future<Output = Result<Paper, Self::Error>> + Send + '_;

  fn get_paper(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Paper>, Self::Error>> + Send + '_;

  fn find_paper_by_arxiv_id<'a>(
    &'a self,
    arxiv_id: &'a str,
  ) -> impl Future<Output = Result<Option<Paper>, Self::Error>> + Send + 'a;

  /// Papers matching `query`, newest first.
  fn list_papers<'a>(
    &'a self,
    query: &'a PaperQuery,
  ) -> impl Future<Output = Result<Vec<Paper>, Self::Error>> + Send + 'a;

  /// Attach enrichment details. Returns the updated paper, or `None` if the
  /// paper does not exist.
  fn set_arxiv_details(
    &self,
    id: Uuid,
    details: ArxivDetails,
  ) -> impl Future<Output = Result<Option<Paper>, Self::Error>> + Send + '_;

  // ── Agents ────────────────────────────────────────────────────────────

  /// Get-or-create on `(name, model)`. An existing agent is returned as is.
  fn register_agent(
    &self,
    input: NewAgent,
  ) -> impl Future<Output = Result<Agent, Self::Error>> + Send + '_;

  fn get_agent(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Agent>, Self::Error>> + Send + '_;

  /// All agents ordered by points, then wins, descending.
  fn list_agents(&self) -> impl Future<Output = Result<Vec<Agent>, Self::Error>> + Send + '_;

  // ── Matches ───────────────────────────────────────────────────────────

  /// Persist a new `pending` match. Referenced papers and agents must exist.
  fn create_match(
    &self,
    input: NewMatch,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  fn get_match(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  fn list_matches<'a>(
    &'a self,
    query: &'a MatchQuery,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + 'a;

  /// Number of matches matching `query`, ignoring its limit and offset.
  fn count_matches<'a>(
    &'a self,
    query: &'a MatchQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Move a match from `pending` to `in_progress`. Returns `false` if the
  /// match was not `pending`, i.e. someone else claimed it first.
  fn claim_match(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark a non-terminal match as `error` with `message` and stamp its
  /// completion time. Returns the updated match.
  fn fail_match(
    &self,
    id: Uuid,
    message: String,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  /// In one transaction: insert the evaluation, apply the resolution to both
  /// agents' counters, set the winner and move the match from `in_progress` to
  /// `completed`.
  fn complete_match(
    &self,
    id: Uuid,
    evaluation: NewEvaluation,
    resolution: Resolution,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  /// Matches matching `query` joined with their reviews and evaluation.
  fn match_records<'a>(
    &'a self,
    query: &'a MatchQuery,
  ) -> impl Future<Output = Result<Vec<MatchRecord>, Self::Error>> + Send + 'a;

  // ── Reviews and evaluations ───────────────────────────────────────────

  /// Persist a review. A second review by the same agent in the same match is
  /// a conflict.
  fn record_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  fn list_reviews(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  fn get_evaluation(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<Evaluation>, Self::Error>> + Send + '_;

  // ── Feedback ──────────────────────────────────────────────────────────

  /// Persist feedback. A plain vote from an author who already voted on the
  /// match replaces the earlier vote.
  fn submit_feedback(
    &self,
    input: NewFeedback,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  /// Feedback on a match, newest first.
  fn list_feedback(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Feedback>, Self::Error>> + Send + '_;

  /// Increment the like counter. Returns `None` if the feedback is unknown.
  fn like_feedback(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Feedback>, Self::Error>> + Send + '_;
}
