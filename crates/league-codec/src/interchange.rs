//! YAML interchange documents.
//!
//! `{ papers: [...] }` is the import format for paper batches;
//! `{ matches: [...] }` is the export format for completed matches and can be
//! ranked offline without a database.

use chrono::{DateTime, Utc};
use league_core::{
  agent::Agent,
  matches::Side,
  paper::NewPaper,
  standings::Outcome,
  store::MatchRecord,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::Result;

// ─── Papers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PapersDocument {
  #[serde(default)]
  pub papers: Vec<PaperDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperDocument {
  pub title:         String,
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  #[serde(default, deserialize_with = "string_or_list")]
  pub authors:       Vec<String>,
  #[serde(default)]
  pub url:           String,
  #[serde(default)]
  pub arxiv_id:      Option<String>,
  #[serde(default, deserialize_with = "string_or_list")]
  pub keywords:      Vec<String>,
  #[serde(default, deserialize_with = "string_or_list")]
  pub references:    Vec<String>,
}

impl PaperDocument {
  pub fn into_new_paper(self, category: &str, subcategory: &str, year: i32) -> NewPaper {
    NewPaper {
      title: self.title,
      abstract_text: self.abstract_text,
      authors: self.authors,
      category: category.to_owned(),
      subcategory: subcategory.to_owned(),
      year,
      url: self.url,
      arxiv_id: self.arxiv_id,
      keywords: self.keywords,
      references: self.references,
    }
  }
}

/// Accept either `"a, b, c"` or `[a, b, c]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    One(String),
    Many(Vec<String>),
  }

  let items = match Option::<Raw>::deserialize(deserializer)? {
    None => Vec::new(),
    Some(Raw::One(s)) => s.split(',').map(str::to_owned).collect(),
    Some(Raw::Many(v)) => v,
  };
  Ok(
    items
      .into_iter()
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty())
      .collect(),
  )
}

pub fn parse_papers(input: &str) -> Result<PapersDocument> { Ok(serde_yaml::from_str(input)?) }

// ─── Matches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchesDocument {
  #[serde(default)]
  pub matches: Vec<MatchDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDocument {
  pub id:         Uuid,
  /// One id for a single-paper match, two for head-to-head.
  pub paper_ids:  Vec<Uuid>,
  pub status:     String,
  #[serde(default)]
  pub reviews:    Vec<ReviewDocument>,
  #[serde(default)]
  pub comparison: Option<Comparison>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
  /// Reviewing agent's display name.
  pub reviewer:      String,
  pub paper_id:      Uuid,
  pub overall_score: i32,
  #[serde(default)]
  pub analysis:      String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
  /// Winning reviewer's display name; absent for a draw.
  #[serde(default)]
  pub winner:    Option<String>,
  #[serde(default)]
  pub reasoning: String,
}

impl MatchDocument {
  /// Build the export form of a match. Agent names are resolved from
  /// `agents`; unknown agents are exported by id.
  pub fn from_record(record: &MatchRecord, agents: &[Agent]) -> Self {
    let m = &record.r#match;
    let name_of = |id: Uuid| {
      agents
        .iter()
        .find(|a| a.agent_id == id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| id.to_string())
    };

    let mut paper_ids = vec![m.paper_id];
    paper_ids.extend(m.opponent_paper_id);

    let reviews = [Side::First, Side::Second]
      .into_iter()
      .filter_map(|side| {
        let agent_id = m.agent_id(side);
        record.reviews.iter().find(|r| r.agent_id == agent_id)
      })
      .map(|r| ReviewDocument {
        reviewer:      name_of(r.agent_id),
        paper_id:      r.paper_id,
        overall_score: r.body.rating,
        analysis:      r.body.summary.clone(),
      })
      .collect();

    let comparison = record.evaluation.as_ref().map(|e| Comparison {
      winner:    e.winner_id.map(name_of),
      reasoning: e.reasoning.clone(),
    });

    Self {
      id: m.match_id,
      paper_ids,
      status: m.status.to_string(),
      reviews,
      comparison,
      created_at: m.created_at,
    }
  }

  fn winning_review(&self) -> Option<&ReviewDocument> {
    let winner = self.comparison.as_ref()?.winner.as_deref()?;
    self.reviews.iter().find(|r| r.reviewer == winner)
  }

  /// Reviewer view of the match. `None` unless it has two reviews and a
  /// comparison.
  pub fn reviewer_outcome(&self) -> Option<Outcome<String>> {
    let [a, b] = self.reviews.as_slice() else {
      return None;
    };
    let comparison = self.comparison.as_ref()?;
    Some(Outcome {
      participants: [a.reviewer.clone(), b.reviewer.clone()],
      winner:       comparison.winner.clone(),
      scores:       [f64::from(a.overall_score), f64::from(b.overall_score)],
    })
  }

  /// Paper view of a head-to-head match, scored by each paper's rating.
  pub fn paper_outcome(&self) -> Option<Outcome<Uuid>> {
    let [p1, p2] = self.paper_ids.as_slice() else {
      return None;
    };
    self.comparison.as_ref()?;
    let score = |paper: &Uuid| {
      self
        .reviews
        .iter()
        .find(|r| r.paper_id == *paper)
        .map(|r| f64::from(r.overall_score))
        .unwrap_or(0.0)
    };
    Some(Outcome {
      participants: [*p1, *p2],
      winner:       self.winning_review().map(|r| r.paper_id),
      scores:       [score(p1), score(p2)],
    })
  }
}

pub fn parse_matches(input: &str) -> Result<MatchesDocument> { Ok(serde_yaml::from_str(input)?) }

pub fn to_yaml<T: Serialize>(doc: &T) -> Result<String> { Ok(serde_yaml::to_string(doc)?) }
