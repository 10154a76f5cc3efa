//! OpenAI chat completions.

use league_core::upstream::GenerationRequest;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Result, error_message};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  model:       &'a str,
  messages:    [Message<'a>; 2],
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

impl CompletionResponse {
  fn into_text(self) -> Option<String> {
    self
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .filter(|t| !t.trim().is_empty())
  }
}

pub(crate) async fn complete(
  client: &Client,
  base_url: &str,
  api_key: &str,
  request: &GenerationRequest,
) -> Result<String> {
  let body = CompletionRequest {
    model:       &request.model,
    messages:    [
      Message { role: "system", content: &request.system },
      Message { role: "user", content: &request.prompt },
    ],
    temperature: request.temperature,
    max_tokens:  request.max_tokens,
  };

  let resp = client
    .post(format!("{}/chat/completions", base_url.trim_end_matches('/')))
    .bearer_auth(api_key)
    .json(&body)
    .send()
    .await?;

  let status = resp.status();
  if !status.is_success() {
    return Err(crate::Error::Status {
      service: "openai",
      status:  status.as_u16(),
      message: error_message(&resp.text().await.unwrap_or_default()),
    });
  }

  let parsed: CompletionResponse = resp.json().await?;
  parsed
    .into_text()
    .ok_or(crate::Error::EmptyResponse("openai"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_choice_is_the_text() {
    let json = r#"{
      "id": "chatcmpl-1",
      "choices": [
        { "index": 0, "message": { "role": "assistant", "content": "Summary:\nGood." }, "finish_reason": "stop" },
        { "index": 1, "message": { "role": "assistant", "content": "ignored" }, "finish_reason": "stop" }
      ],
      "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    }"#;
    let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.into_text().as_deref(), Some("Summary:\nGood."));
  }

  #[test]
  fn null_or_blank_content_is_empty() {
    let json = r#"{ "choices": [ { "message": { "role": "assistant", "content": null } } ] }"#;
    let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
    assert!(parsed.into_text().is_none());

    let parsed: CompletionResponse = serde_json::from_str(r#"{ "choices": [] }"#).unwrap();
    assert!(parsed.into_text().is_none());
  }

  #[test]
  fn request_body_shape() {
    let request = GenerationRequest {
      provider:    league_core::agent::Provider::OpenAi,
      model:       "gpt-4".into(),
      system:      "You review papers.".into(),
      prompt:      "Review this.".into(),
      temperature: 0.2,
      max_tokens:  1500,
    };
    let body = CompletionRequest {
      model:       &request.model,
      messages:    [
        Message { role: "system", content: &request.system },
        Message { role: "user", content: &request.prompt },
      ],
      temperature: request.temperature,
      max_tokens:  request.max_tokens,
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["model"], "gpt-4");
    assert_eq!(value["messages"][0]["role"], "system");
    assert_eq!(value["messages"][1]["content"], "Review this.");
    assert_eq!(value["max_tokens"], 1500);
  }
}
