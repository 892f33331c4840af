//! HTTP request/response DTOs (serde ready).
//! Field names match what the frontend already sends (camelCase where it does).

use serde::{Deserialize, Serialize};

use crate::domain::{Activity, UnitSuggestion};

fn default_format() -> String {
  "pdf".into()
}

fn default_slides_count() -> u32 {
  5
}

fn default_language() -> String {
  "pt-BR".into()
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActivityRequest {
  pub disciplina: String,
  pub assunto: String,
  pub nivel: String,
  #[serde(default = "default_format")]
  pub format: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityOut {
  pub download_url: String,
  pub filename: String,
  pub content: Activity,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UnitSuggestionRequest {
  pub disciplina: String,
  #[serde(rename = "serieAno")]
  pub serie_ano: String,
}

#[derive(Debug, Serialize)]
pub struct UnitSuggestionsOut {
  pub sugestoes: Vec<UnitSuggestion>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LessonPlanRequest {
  pub disciplina: String,
  #[serde(rename = "serieAno")]
  pub serie_ano: String,
  pub unidade: String,
  pub descricao: String,
}

#[derive(Debug, Serialize)]
pub struct LessonPlanOut {
  pub conteudo: serde_json::Value,
}

/// Body of the lesson-plan PDF export: the plan object as returned earlier
/// (possibly edited by the professor).
#[derive(Debug, Deserialize)]
pub struct LessonPlanPdfRequest {
  pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct FileOut {
  pub filename: String,
  pub download_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SlideRequest {
  pub topic: String,
  #[serde(default = "default_slides_count")]
  pub slides_count: u32,
  #[serde(default = "default_language")]
  pub language: String,
  #[serde(default, rename = "serieAno")]
  pub serie_ano: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct SlidesOut {
  pub pptx_url: Option<String>,
  pub pdf_url: Option<String>,
  pub edit_url: Option<String>,
  pub presentation_id: Option<String>,
  /// Alias of `pptx_url` kept for older clients.
  pub download_url: Option<String>,
  /// Alias of `edit_url` kept for older clients.
  pub url: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
