//! Error type shared by every request path, and its mapping to HTTP responses.
//!
//! Handlers return `Result<_, AppError>`; axum calls `into_response` at the
//! boundary so each failure becomes a status code plus a JSON `detail`.

use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::parse::ModelOutputError;

#[derive(Error, Debug)]
pub enum AppError {
  /// Request body missing, not JSON, or not the expected shape.
  #[error("{0}")]
  InvalidRequest(String),

  #[error("{0}")]
  Config(String),

  #[error("Index not initialized")]
  IndexUnavailable,

  #[error("retrieval error: {0}")]
  Retrieval(String),

  #[error("language model error: {0}")]
  Llm(String),

  #[error(transparent)]
  ModelOutput(#[from] ModelOutputError),

  #[error("render error: {0}")]
  Render(String),

  #[error("{0}")]
  SlideProvider(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::ModelOutput(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    AppError::InvalidRequest(rejection.body_text())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    let detail = self.to_string();
    if status.is_client_error() {
      warn!(target: "edu_backend", %status, error = %detail, "request rejected");
    } else {
      error!(target: "edu_backend", %status, error = %detail, "request failed");
    }

    let body = match &self {
      AppError::ModelOutput(e) => serde_json::json!({ "detail": detail, "kind": e.kind() }),
      _ => serde_json::json!({ "detail": detail }),
    };
    (status, Json(body)).into_response()
  }
}
