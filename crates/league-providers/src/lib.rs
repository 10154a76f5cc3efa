//! HTTP collaborators for the paper evaluation league.
//!
//! [`Upstream`] implements both [`TextGenerator`] (routing each request to
//! OpenAI or Anthropic by its provider tag) and [`PaperSource`] (the arXiv
//! query API). Every call goes through one shared [`reqwest::Client`] with a
//! per-request timeout.

pub mod anthropic;
pub mod arxiv;
pub mod error;
pub mod openai;

use std::time::Duration;

use league_core::{
  agent::Provider,
  paper::ArxivEntry,
  upstream::{ArxivQuery, GenerationRequest, PaperSource, TextGenerator},
};
use reqwest::Client;
use serde::Deserialize;

pub use arxiv::extract_arxiv_id;
pub use error::{Error, Result};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Where to reach one generation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  pub base_url: String,
  pub api_key:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
  pub openai:         Endpoint,
  pub anthropic:      Endpoint,
  pub arxiv_base_url: String,
  pub timeout:        Duration,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      openai:         Endpoint {
        base_url: openai::DEFAULT_BASE_URL.into(),
        api_key:  None,
      },
      anthropic:      Endpoint {
        base_url: anthropic::DEFAULT_BASE_URL.into(),
        api_key:  None,
      },
      arxiv_base_url: arxiv::DEFAULT_BASE_URL.into(),
      timeout:        Duration::from_secs(30),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct Upstream {
  client: Client,
  config: UpstreamConfig,
}

impl Upstream {
  pub fn new(config: UpstreamConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("paper-league/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn endpoint(&self, provider: Provider) -> Result<(&str, &str)> {
    let endpoint = match provider {
      Provider::OpenAi => &self.config.openai,
      Provider::Anthropic => &self.config.anthropic,
    };
    let key = endpoint
      .api_key
      .as_deref()
      .filter(|k| !k.is_empty())
      .ok_or(Error::MissingApiKey(provider))?;
    Ok((endpoint.base_url.as_str(), key))
  }
}

impl TextGenerator for Upstream {
  type Error = Error;

  async fn generate(&self, request: &GenerationRequest) -> Result<String> {
    let (base_url, api_key) = self.endpoint(request.provider)?;
    tracing::debug!(
      provider = %request.provider,
      model = %request.model,
      "requesting completion"
    );
    match request.provider {
      Provider::OpenAi => openai::complete(&self.client, base_url, api_key, request).await,
      Provider::Anthropic => anthropic::complete(&self.client, base_url, api_key, request).await,
    }
  }
}

impl PaperSource for Upstream {
  type Error = Error;

  async fn fetch_entry(&self, arxiv_id: &str) -> Result<Option<ArxivEntry>> {
    arxiv::fetch_entry(&self.client, &self.config.arxiv_base_url, arxiv_id).await
  }

  async fn search(&self, query: &ArxivQuery) -> Result<Vec<ArxivEntry>> {
    arxiv::search(&self.client, &self.config.arxiv_base_url, query).await
  }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiError {
  error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// The `error.message` of a provider error body, or the body itself.
fn error_message(body: &str) -> String {
  serde_json::from_str::<ApiError>(body)
    .map(|e| e.error.message)
    .unwrap_or_else(|_| body.trim().to_owned())
}
