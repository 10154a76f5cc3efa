//! Anthropic messages API.

use league_core::upstream::GenerationRequest;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Result, error_message};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
  model:       &'a str,
  system:      &'a str,
  messages:    [Message<'a>; 1],
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
  content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
  Text { text: String },
  #[serde(other)]
  Other,
}

impl MessageResponse {
  /// Concatenate every text block in order.
  fn into_text(self) -> Option<String> {
    let text: String = self
      .content
      .into_iter()
      .filter_map(|block| match block {
        ContentBlock::Text { text } => Some(text),
        ContentBlock::Other => None,
      })
      .collect();
    (!text.trim().is_empty()).then_some(text)
  }
}

pub(crate) async fn complete(
  client: &Client,
  base_url: &str,
  api_key: &str,
  request: &GenerationRequest,
) -> Result<String> {
  let body = MessageRequest {
    model:       &request.model,
    system:      &request.system,
    messages:    [Message { role: "user", content: &request.prompt }],
    temperature: request.temperature,
    max_tokens:  request.max_tokens,
  };

  let resp = client
    .post(format!("{}/messages", base_url.trim_end_matches('/')))
    .header("x-api-key", api_key)
    .header("anthropic-version", API_VERSION)
    .json(&body)
    .send()
    .await?;

  let status = resp.status();
  if !status.is_success() {
    return Err(crate::Error::Status {
      service: "anthropic",
      status:  status.as_u16(),
      message: error_message(&resp.text().await.unwrap_or_default()),
    });
  }

  let parsed: MessageResponse = resp.json().await?;
  parsed
    .into_text()
    .ok_or(crate::Error::EmptyResponse("anthropic"))
}
