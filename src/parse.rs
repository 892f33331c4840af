//! Turning raw model text into typed values.
//!
//! The model is asked for bare JSON but often wraps it in a markdown fence.
//! We strip one fence layer, then parse in two steps so callers can tell
//! "not JSON at all" apart from "JSON, but not the shape we asked for".

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelOutputError {
  #[error("model output is not valid JSON: {0}")]
  NotJson(serde_json::Error),
  #[error("model output does not match the expected shape: {0}")]
  WrongShape(serde_json::Error),
}

impl ModelOutputError {
  /// Stable tag exposed to API clients.
  pub fn kind(&self) -> &'static str {
    match self {
      ModelOutputError::NotJson(_) => "model_output_not_json",
      ModelOutputError::WrongShape(_) => "model_output_wrong_shape",
    }
  }
}

const FENCE: &str = "```";

/// Remove at most one leading fence (with an optional language tag such as
/// `json`) and at most one trailing fence.
pub fn strip_code_fence(raw: &str) -> &str {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix(FENCE) {
    // A language tag runs until the end of the first line.
    s = match rest.find('\n') {
      Some(nl) if is_lang_tag(&rest[..nl]) => &rest[nl + 1..],
      None if is_lang_tag(rest) => "",
      _ => rest,
    };
    s = s.trim_start();
  }
  if let Some(rest) = s.strip_suffix(FENCE) {
    s = rest;
  }
  s.trim()
}

fn is_lang_tag(s: &str) -> bool {
  let s = s.trim();
  s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Strip fences, then deserialize into `T`.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, ModelOutputError> {
  let body = strip_code_fence(raw);
  let value: serde_json::Value = serde_json::from_str(body).map_err(ModelOutputError::NotJson)?;
  serde_json::from_value(value).map_err(ModelOutputError::WrongShape)
}
