//! Encoding and decoding helpers between league domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision so they
//! sort lexically. Lists and settings are compact JSON. Enums use their strum
//! column names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use league_core::{
  agent::{Agent, AgentRecord},
  evaluation::{CriterionScores, Evaluation, ScorePair},
  feedback::Feedback,
  matches::Match,
  paper::Paper,
  review::{Review, ReviewBody},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn decode_enum<T: FromStr>(s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("{s:?} as {}", std::any::type_name::<T>())))
}

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

fn decode_score(n: i64) -> u8 { n.clamp(0, u8::MAX.into()) as u8 }

// ─── Column lists ────────────────────────────────────────────────────────────

pub const PAPER_COLUMNS: &str = "paper_id, title, abstract, authors, category, subcategory, year, \
                                 url, arxiv_id, keywords, reference_list, arxiv_details, \
                                 created_at";

pub const AGENT_COLUMNS: &str = "agent_id, name, model, provider, settings, matches_played, \
                                 matches_won, matches_drawn, matches_lost, points, created_at, \
                                 updated_at";

/// Prefixed with `m.` so it can be used in joins.
pub const MATCH_COLUMNS: &str = "m.match_id, m.paper_id, m.opponent_paper_id, m.agent1_id, \
                                 m.agent2_id, m.judge_id, m.status, m.winner_id, m.error, \
                                 m.created_at, m.completed_at";

pub const REVIEW_COLUMNS: &str = "review_id, match_id, agent_id, paper_id, summary, strengths, \
                                  weaknesses, questions, rating, confidence, created_at";

pub const EVALUATION_COLUMNS: &str = "evaluation_id, match_id, review1_id, review2_id, winner_id, \
                                      technical_correctness_1, technical_correctness_2, \
                                      depth_of_analysis_1, depth_of_analysis_2, \
                                      constructive_feedback_1, constructive_feedback_2, \
                                      clarity_1, clarity_2, fairness_1, fairness_2, reasoning, \
                                      created_at";

pub const FEEDBACK_COLUMNS: &str = "feedback_id, match_id, review_id, author, vote, comment, \
                                    likes, created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `papers` row.
pub struct RawPaper {
  pub paper_id:       String,
  pub title:          String,
  pub abstract_text:  String,
  pub authors:        String,
  pub category:       String,
  pub subcategory:    String,
  pub year:           i32,
  pub url:            String,
  pub arxiv_id:       Option<String>,
  pub keywords:       String,
  pub reference_list: String,
  pub arxiv_details:  Option<String>,
  pub created_at:     String,
}

impl RawPaper {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      paper_id:       row.get(0)?,
      title:          row.get(1)?,
      abstract_text:  row.get(2)?,
      authors:        row.get(3)?,
      category:       row.get(4)?,
      subcategory:    row.get(5)?,
      year:           row.get(6)?,
      url:            row.get(7)?,
      arxiv_id:       row.get(8)?,
      keywords:       row.get(9)?,
      reference_list: row.get(10)?,
      arxiv_details:  row.get(11)?,
      created_at:     row.get(12)?,
    })
  }

  pub fn into_paper(self) -> Result<Paper> {
    Ok(Paper {
      paper_id:      decode_uuid(&self.paper_id)?,
      title:         self.title,
      abstract_text: self.abstract_text,
      authors:       decode_list(&self.authors)?,
      category:      self.category,
      subcategory:   self.subcategory,
      year:          self.year,
      url:           self.url,
      arxiv_id:      self.arxiv_id,
      keywords:      decode_list(&self.keywords)?,
      references:    decode_list(&self.reference_list)?,
      arxiv_details: self
        .arxiv_details
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `agents` row.
pub struct RawAgent {
  pub agent_id:       String,
  pub name:           String,
  pub model:          String,
  pub provider:       String,
  pub settings:       String,
  pub matches_played: i64,
  pub matches_won:    i64,
  pub matches_drawn:  i64,
  pub matches_lost:   i64,
  pub points:         i64,
  pub created_at:     String,
  pub updated_at:     Option<String>,
}

impl RawAgent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      agent_id:       row.get(0)?,
      name:           row.get(1)?,
      model:          row.get(2)?,
      provider:       row.get(3)?,
      settings:       row.get(4)?,
      matches_played: row.get(5)?,
      matches_won:    row.get(6)?,
      matches_drawn:  row.get(7)?,
      matches_lost:   row.get(8)?,
      points:         row.get(9)?,
      created_at:     row.get(10)?,
      updated_at:     row.get(11)?,
    })
  }

  pub fn into_agent(self) -> Result<Agent> {
    Ok(Agent {
      agent_id:   decode_uuid(&self.agent_id)?,
      name:       self.name,
      model:      self.model,
      provider:   decode_enum(&self.provider)?,
      settings:   serde_json::from_str(&self.settings)?,
      record:     AgentRecord {
        matches_played: self.matches_played,
        matches_won:    self.matches_won,
        matches_drawn:  self.matches_drawn,
        matches_lost:   self.matches_lost,
        points:         self.points,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_opt_dt(self.updated_at)?,
    })
  }
}

/// Raw values read from a `matches` row (see [`MATCH_COLUMNS`]).
pub struct RawMatch {
  pub match_id:          String,
  pub paper_id:          String,
  pub opponent_paper_id: Option<String>,
  pub agent1_id:         String,
  pub agent2_id:         String,
  pub judge_id:          Option<String>,
  pub status:            String,
  pub winner_id:         Option<String>,
  pub error:             Option<String>,
  pub created_at:        String,
  pub completed_at:      Option<String>,
}

impl RawMatch {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:          row.get(0)?,
      paper_id:          row.get(1)?,
      opponent_paper_id: row.get(2)?,
      agent1_id:         row.get(3)?,
      agent2_id:         row.get(4)?,
      judge_id:          row.get(5)?,
      status:            row.get(6)?,
      winner_id:         row.get(7)?,
      error:             row.get(8)?,
      created_at:        row.get(9)?,
      completed_at:      row.get(10)?,
    })
  }

  pub fn into_match(self) -> Result<Match> {
    Ok(Match {
      match_id:          decode_uuid(&self.match_id)?,
      paper_id:          decode_uuid(&self.paper_id)?,
      opponent_paper_id: decode_opt_uuid(self.opponent_paper_id)?,
      agent1_id:         decode_uuid(&self.agent1_id)?,
      agent2_id:         decode_uuid(&self.agent2_id)?,
      judge_id:          decode_opt_uuid(self.judge_id)?,
      status:            decode_enum(&self.status)?,
      winner_id:         decode_opt_uuid(self.winner_id)?,
      error:             self.error,
      created_at:        decode_dt(&self.created_at)?,
      completed_at:      decode_opt_dt(self.completed_at)?,
    })
  }
}

/// Raw values read directly from a `reviews` row.
pub struct RawReview {
  pub review_id:  String,
  pub match_id:   String,
  pub agent_id:   String,
  pub paper_id:   String,
  pub summary:    String,
  pub strengths:  String,
  pub weaknesses: String,
  pub questions:  String,
  pub rating:     i32,
  pub confidence: String,
  pub created_at: String,
}

impl RawReview {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:  row.get(0)?,
      match_id:   row.get(1)?,
      agent_id:   row.get(2)?,
      paper_id:   row.get(3)?,
      summary:    row.get(4)?,
      strengths:  row.get(5)?,
      weaknesses: row.get(6)?,
      questions:  row.get(7)?,
      rating:     row.get(8)?,
      confidence: row.get(9)?,
      created_at: row.get(10)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:  decode_uuid(&self.review_id)?,
      match_id:   decode_uuid(&self.match_id)?,
      agent_id:   decode_uuid(&self.agent_id)?,
      paper_id:   decode_uuid(&self.paper_id)?,
      body:       ReviewBody {
        summary:    self.summary,
        strengths:  decode_list(&self.strengths)?,
        weaknesses: decode_list(&self.weaknesses)?,
        questions:  decode_list(&self.questions)?,
        rating:     self.rating,
        confidence: decode_enum(&self.confidence)?,
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `evaluations` row.
pub struct RawEvaluation {
  pub evaluation_id: String,
  pub match_id:      String,
  pub review1_id:    String,
  pub review2_id:    String,
  pub winner_id:     Option<String>,
  /// Criterion columns in [`EVALUATION_COLUMNS`] order.
  pub scores:        [i64; 10],
  pub reasoning:     String,
  pub created_at:    String,
}

impl RawEvaluation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let mut scores = [0i64; 10];
    for (i, score) in scores.iter_mut().enumerate() {
      *score = row.get(5 + i)?;
    }
    Ok(Self {
      evaluation_id: row.get(0)?,
      match_id: row.get(1)?,
      review1_id: row.get(2)?,
      review2_id: row.get(3)?,
      winner_id: row.get(4)?,
      scores,
      reasoning: row.get(15)?,
      created_at: row.get(16)?,
    })
  }

  pub fn into_evaluation(self) -> Result<Evaluation> {
    let pair = |i: usize| ScorePair {
      first:  decode_score(self.scores[i]),
      second: decode_score(self.scores[i + 1]),
    };
    Ok(Evaluation {
      evaluation_id: decode_uuid(&self.evaluation_id)?,
      match_id:      decode_uuid(&self.match_id)?,
      review1_id:    decode_uuid(&self.review1_id)?,
      review2_id:    decode_uuid(&self.review2_id)?,
      winner_id:     decode_opt_uuid(self.winner_id)?,
      scores:        CriterionScores {
        technical_correctness: pair(0),
        depth_of_analysis:     pair(2),
        constructive_feedback: pair(4),
        clarity:               pair(6),
        fairness:              pair(8),
      },
      reasoning:     self.reasoning,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Flatten scores into the ten criterion columns.
pub fn encode_scores(scores: &CriterionScores) -> [i64; 10] {
  let pairs = [
    scores.technical_correctness,
    scores.depth_of_analysis,
    scores.constructive_feedback,
    scores.clarity,
    scores.fairness,
  ];
  let mut out = [0i64; 10];
  for (i, pair) in pairs.iter().enumerate() {
    out[2 * i] = pair.first.into();
    out[2 * i + 1] = pair.second.into();
  }
  out
}

/// Raw values read directly from a `feedback` row.
pub struct RawFeedback {
  pub feedback_id: String,
  pub match_id:    String,
  pub review_id:   Option<String>,
  pub author:      Option<String>,
  pub vote:        Option<String>,
  pub comment:     Option<String>,
  pub likes:       i64,
  pub created_at:  String,
  pub updated_at:  Option<String>,
}

impl RawFeedback {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      feedback_id: row.get(0)?,
      match_id:    row.get(1)?,
      review_id:   row.get(2)?,
      author:      row.get(3)?,
      vote:        row.get(4)?,
      comment:     row.get(5)?,
      likes:       row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  pub fn into_feedback(self) -> Result<Feedback> {
    Ok(Feedback {
      feedback_id: decode_uuid(&self.feedback_id)?,
      match_id:    decode_uuid(&self.match_id)?,
      review_id:   decode_opt_uuid(self.review_id)?,
      author:      self.author,
      vote:        self.vote.as_deref().map(decode_enum).transpose()?,
      comment:     self.comment,
      likes:       self.likes,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_opt_dt(self.updated_at)?,
    })
  }
}
