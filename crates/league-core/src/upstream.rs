//! Collaborator seams: text generation and paper metadata sources.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{agent::Provider, paper::ArxivEntry};

/// A single completion request routed to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
  pub provider:    Provider,
  pub model:       String,
  pub system:      String,
  pub prompt:      String,
  pub temperature: f32,
  pub max_tokens:  u32,
}

/// Produces free text for a prompt. Reviews and verdicts are both produced
/// through this trait.
pub trait TextGenerator: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  fn generate<'a>(
    &'a self,
    request: &'a GenerationRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

/// Parameters for a category search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxivQuery {
  pub category:    String,
  #[serde(default = "default_max_results")]
  pub max_results: u32,
  #[serde(default)]
  pub start:       u32,
}

fn default_max_results() -> u32 { 10 }

pub trait PaperSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Look up a single paper by arXiv id. `None` if the feed has no entry.
  fn fetch_entry<'a>(
    &'a self,
    arxiv_id: &'a str,
  ) -> impl Future<Output = Result<Option<ArxivEntry>, Self::Error>> + Send + 'a;

  /// Newest entries in a category.
  fn search<'a>(
    &'a self,
    query: &'a ArxivQuery,
  ) -> impl Future<Output = Result<Vec<ArxivEntry>, Self::Error>> + Send + 'a;
}
