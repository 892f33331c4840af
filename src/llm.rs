//! Language-model seam and a minimal OpenAI-compatible client.
//!
//! Callers only need `complete(prompt) -> text`; the prompt already carries
//! the output-format instructions. Calls log the model name, latency and
//! response size, never contents or the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::error::{AppError, Result};

#[async_trait]
pub trait LanguageModel: Send + Sync {
  /// Model identifier for logs.
  fn name(&self) -> &str;

  /// Single-turn completion of a full prompt.
  async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub model: String,
  temperature: f32,
}

impl OpenAI {
  /// Construct the client if OPENAI_API_KEY is set; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.into());

    let client = match reqwest::Client::builder().timeout(Duration::from_secs(90)).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "edu_backend", error = %e, "Failed to build HTTP client for the language model");
        return None;
      }
    };

    Some(Self {
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model,
      temperature: 0.4,
    })
  }
}

#[async_trait]
impl LanguageModel for OpenAI {
  fn name(&self) -> &str {
    &self.model
  }

  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn complete(&self, prompt: &str) -> Result<String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: prompt.into() }],
      temperature: self.temperature,
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "edu-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| AppError::Llm(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(AppError::Llm(format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| AppError::Llm(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Model usage");
    }
    let text = body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Pull `error.message` out of an OpenAI-style error body.
pub(crate) fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
pub mod testing {
  //! Canned model used by handler tests.
  use super::*;
  use std::sync::Mutex;

  pub struct ScriptedModel {
    reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
  }

  impl ScriptedModel {
    pub fn replying(text: &str) -> Self {
      Self { reply: Ok(text.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(msg: &str) -> Self {
      Self { reply: Err(msg.to_string()), prompts: Mutex::new(Vec::new()) }
    }
  }

  #[async_trait]
  impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
      "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
      self.prompts.lock().unwrap().push(prompt.to_string());
      self.reply.clone().map_err(AppError::Llm)
    }
  }
}
