//! Papers: the subjects of every match.
//!
//! A paper is immutable once stored. The only field written after creation is
//! [`Paper::arxiv_details`], filled in by an enrichment fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enrichment ──────────────────────────────────────────────────────────────

/// Metadata fetched from the arXiv query API after a paper is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArxivDetails {
  pub arxiv_id:         String,
  pub categories:       Vec<String>,
  pub primary_category: Option<String>,
  pub published:        Option<DateTime<Utc>>,
  pub updated:          Option<DateTime<Utc>>,
  pub pdf_url:          Option<String>,
  pub abstract_url:     Option<String>,
  pub doi:              Option<String>,
  pub journal_ref:      Option<String>,
}

/// A single entry of an arXiv Atom feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivEntry {
  pub title:         String,
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  pub authors:       Vec<String>,
  pub details:       ArxivDetails,
}

impl ArxivEntry {
  /// Convert into a [`NewPaper`] filed under `category`/`subcategory`.
  ///
  /// The year comes from the publication date, falling back to `fallback_year`.
  pub fn into_new_paper(
    self,
    category: &str,
    subcategory: &str,
    fallback_year: i32,
  ) -> NewPaper {
    use chrono::Datelike as _;

    let year = self
      .details
      .published
      .map(|p| p.year())
      .unwrap_or(fallback_year);
    let url = self
      .details
      .abstract_url
      .clone()
      .unwrap_or_else(|| format!("https://arxiv.org/abs/{}", self.details.arxiv_id));

    NewPaper {
      title: self.title,
      abstract_text: self.abstract_text,
      authors: self.authors,
      category: category.to_owned(),
      subcategory: subcategory.to_owned(),
      year,
      url,
      arxiv_id: Some(self.details.arxiv_id),
      keywords: Vec::new(),
      references: Vec::new(),
    }
  }
}

// ─── Paper ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
  pub paper_id:      Uuid,
  pub title:         String,
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  /// Author names in publication order.
  pub authors:       Vec<String>,
  pub category:      String,
  pub subcategory:   String,
  pub year:          i32,
  pub url:           String,
  pub arxiv_id:      Option<String>,
  pub keywords:      Vec<String>,
  pub references:    Vec<String>,
  pub arxiv_details: Option<ArxivDetails>,
  pub created_at:    DateTime<Utc>,
}

impl Paper {
  /// Authors joined for display in prompts.
  pub fn author_line(&self) -> String {
    if self.authors.is_empty() {
      "Unknown".to_owned()
    } else {
      self.authors.join(", ")
    }
  }
}

// ─── NewPaper ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LeagueStore::add_paper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaper {
  pub title:         String,
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  #[serde(default)]
  pub authors:       Vec<String>,
  pub category:      String,
  pub subcategory:   String,
  pub year:          i32,
  #[serde(default)]
  pub url:           String,
  #[serde(default)]
  pub arxiv_id:      Option<String>,
  #[serde(default)]
  pub keywords:      Vec<String>,
  #[serde(default)]
  pub references:    Vec<String>,
}

impl NewPaper {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("paper title must not be empty".into()));
    }
    if self.abstract_text.trim().is_empty() {
      return Err(Error::Validation("paper abstract must not be empty".into()));
    }
    if self.category.trim().is_empty() || self.subcategory.trim().is_empty() {
      return Err(Error::Validation(
        "paper category and subcategory are required".into(),
      ));
    }
    if !(1900..=2100).contains(&self.year) {
      return Err(Error::Validation(format!(
        "paper year {} is out of range",
        self.year
      )));
    }
    Ok(())
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::LeagueStore::list_papers`]. Results are
/// returned newest first.
#[derive(Debug, Clone, Default)]
pub struct PaperQuery {
  pub category:    Option<String>,
  pub subcategory: Option<String>,
  pub year:        Option<i32>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn new_paper() -> NewPaper {
    NewPaper {
      title:         "Attention Is All You Need".into(),
      abstract_text: "We propose the Transformer.".into(),
      authors:       vec!["Vaswani".into(), "Shazeer".into()],
      category:      "ai".into(),
      subcategory:   "nlp".into(),
      year:          2017,
      url:           "https://arxiv.org/abs/1706.03762".into(),
      arxiv_id:      Some("1706.03762".into()),
      keywords:      vec![],
      references:    vec![],
    }
  }

  #[test]
  fn valid_paper_passes() {
    assert!(new_paper().validate().is_ok());
  }

  #[test]
  fn blank_title_is_rejected() {
    let mut p = new_paper();
    p.title = "   ".into();
    assert!(matches!(p.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn year_out_of_range_is_rejected() {
    let mut p = new_paper();
    p.year = 42;
    assert!(matches!(p.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn arxiv_entry_takes_year_from_publication() {
    let entry = ArxivEntry {
      title:         "A paper".into(),
      abstract_text: "Abstract".into(),
      authors:       vec!["A. Author".into()],
      details:       ArxivDetails {
        arxiv_id: "2401.00001".into(),
        published: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
        ..Default::default()
      },
    };
    let paper = entry.into_new_paper("cs", "LG", 1999);
    assert_eq!(paper.year, 2024);
    assert_eq!(paper.url, "https://arxiv.org/abs/2401.00001");
    assert_eq!(paper.arxiv_id.as_deref(), Some("2401.00001"));
  }
}
