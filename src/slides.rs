//! Presenton slide-generation adapter.
//!
//! One request per export format (PPTX and PDF), issued concurrently. A leg
//! that fails is logged and reported as `None`; only a double failure is an
//! error. Provider paths are made absolute against the configured base URL.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::{AppError, Result};
use crate::protocol::SlidesOut;

const GENERATE_PATH: &str = "/api/v1/ppt/presentation/generate";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
  Pptx,
  Pdf,
}

/// Presentation parameters shared by both export requests.
#[derive(Clone, Debug, Serialize)]
pub struct Deck {
  pub content: String,
  pub n_slides: u32,
  pub language: String,
  pub template: String,
  pub mood: String,
  pub author: String,
}

impl Deck {
  pub fn new(content: String, n_slides: u32, language: String, young_audience: bool) -> Self {
    Self {
      content,
      n_slides,
      language,
      template: "general".into(),
      mood: if young_audience { "fun" } else { "professional" }.into(),
      author: "Cultura Digital".into(),
    }
  }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  #[serde(flatten)]
  deck: &'a Deck,
  export_as: ExportFormat,
}

/// Subset of the provider's reply we use.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExportResult {
  #[serde(default, deserialize_with = "id_as_string")] pub presentation_id: Option<String>,
  #[serde(default)] pub path: Option<String>,
  #[serde(default)] pub edit_path: Option<String>,
}

#[derive(Clone)]
pub struct Presenton {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  timeout: Duration,
}

impl Presenton {
  pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Self {
    Self {
      client: reqwest::Client::new(),
      api_key,
      base_url: base_url.trim().trim_end_matches('/').to_string(),
      timeout,
    }
  }

  /// Request both exports concurrently and merge the results.
  #[instrument(level = "info", skip(self, deck), fields(n_slides = deck.n_slides, content_len = deck.content.len()))]
  pub async fn generate(&self, deck: &Deck) -> Result<SlidesOut> {
    let (pptx, pdf) = tokio::join!(
      self.export(deck, ExportFormat::Pptx),
      self.export(deck, ExportFormat::Pdf),
    );
    let out = aggregate(&self.base_url, pptx, pdf)?;
    info!(target: "slides", pptx = out.pptx_url.is_some(), pdf = out.pdf_url.is_some(), "Slides generated");
    Ok(out)
  }

  /// One export leg. Never fails: errors are logged and become `None`.
  async fn export(&self, deck: &Deck, format: ExportFormat) -> Option<ExportResult> {
    let url = format!("{}{}", self.base_url, GENERATE_PATH);
    info!(target: "slides", ?format, %url, "Calling slide provider");

    let res = self
      .client
      .post(&url)
      .timeout(self.timeout)
      .header(USER_AGENT, "edu-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&GenerateRequest { deck, export_as: format })
      .send()
      .await;

    let res = match res {
      Ok(r) => r,
      Err(e) => {
        error!(target: "slides", ?format, error = %e, "Slide provider request failed");
        return None;
      }
    };

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      error!(target: "slides", ?format, %status, body = %crate::util::trunc_for_log(&body, 300), "Slide provider returned an error");
      return None;
    }

    match res.json::<ExportResult>().await {
      Ok(r) => Some(r),
      Err(e) => {
        error!(target: "slides", ?format, error = %e, "Slide provider reply was not understood");
        None
      }
    }
  }
}

/// The provider has sent ids both as strings and as numbers.
fn id_as_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Ok(match serde_json::Value::deserialize(de)? {
    serde_json::Value::String(s) => Some(s),
    serde_json::Value::Number(n) => Some(n.to_string()),
    _ => None,
  })
}

/// Make a provider path absolute. Absolute http(s) URLs pass through.
pub fn absolute_url(base_url: &str, path: Option<&str>) -> Option<String> {
  let path = path.map(str::trim).filter(|p| !p.is_empty())?;
  if path.starts_with("http://") || path.starts_with("https://") {
    return Some(path.to_string());
  }
  let base = base_url.trim().trim_end_matches('/');
  if path.starts_with('/') {
    Some(format!("{base}{path}"))
  } else {
    Some(format!("{base}/{path}"))
  }
}

/// Merge both legs. Editing info prefers the PPTX leg.
pub fn aggregate(base_url: &str, pptx: Option<ExportResult>, pdf: Option<ExportResult>) -> Result<SlidesOut> {
  if pptx.is_none() && pdf.is_none() {
    return Err(AppError::SlideProvider("Failed to generate slides in any format".into()));
  }

  let pptx_url = pptx.as_ref().and_then(|r| absolute_url(base_url, r.path.as_deref()));
  let pdf_url = pdf.as_ref().and_then(|r| absolute_url(base_url, r.path.as_deref()));
  let edit_url = [&pptx, &pdf]
    .into_iter()
    .flatten()
    .find_map(|r| absolute_url(base_url, r.edit_path.as_deref()));
  let presentation_id = [&pptx, &pdf]
    .into_iter()
    .flatten()
    .find_map(|r| r.presentation_id.clone());

  Ok(SlidesOut {
    download_url: pptx_url.clone(),
    url: edit_url.clone(),
    pptx_url,
    pdf_url,
    edit_url,
    presentation_id,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{http::StatusCode, routing::post, Json, Router};

  const BASE: &str = "https://slides.example";

  fn result(id: &str, path: &str, edit: &str) -> ExportResult {
    ExportResult {
      presentation_id: Some(id.into()),
      path: Some(path.into()),
      edit_path: Some(edit.into()),
    }
  }

  #[test]
  fn absolute_url_variants() {
    assert_eq!(absolute_url(BASE, Some("/static/a.pptx")).unwrap(), "https://slides.example/static/a.pptx");
    assert_eq!(absolute_url("https://slides.example/ ", Some("static/a.pdf")).unwrap(), "https://slides.example/static/a.pdf");
    assert_eq!(absolute_url(BASE, Some("https://cdn.example/a.pdf")).unwrap(), "https://cdn.example/a.pdf");
    assert_eq!(absolute_url(BASE, Some("")), None);
    assert_eq!(absolute_url(BASE, None), None);
  }

  #[test]
  fn both_legs_populate_everything() {
    let out = aggregate(BASE, Some(result("p1", "/a.pptx", "/edit/p1")), Some(result("p2", "/a.pdf", "/edit/p2"))).unwrap();
    assert_eq!(out.pptx_url.as_deref(), Some("https://slides.example/a.pptx"));
    assert_eq!(out.pdf_url.as_deref(), Some("https://slides.example/a.pdf"));
    assert_eq!(out.edit_url.as_deref(), Some("https://slides.example/edit/p1"));
    assert_eq!(out.presentation_id.as_deref(), Some("p1"));
    assert_eq!(out.download_url, out.pptx_url);
    assert_eq!(out.url, out.edit_url);
  }

  #[test]
  fn only_pptx() {
    let out = aggregate(BASE, Some(result("p1", "/a.pptx", "/edit/p1")), None).unwrap();
    assert!(out.pptx_url.is_some());
    assert!(out.pdf_url.is_none());
    assert_eq!(out.download_url, out.pptx_url);
  }

  #[test]
  fn only_pdf() {
    let out = aggregate(BASE, None, Some(result("p2", "/a.pdf", "/edit/p2"))).unwrap();
    assert!(out.pptx_url.is_none());
    assert_eq!(out.pdf_url.as_deref(), Some("https://slides.example/a.pdf"));
    assert!(out.download_url.is_none());
    assert_eq!(out.presentation_id.as_deref(), Some("p2"));
    assert_eq!(out.edit_url.as_deref(), Some("https://slides.example/edit/p2"));
    assert_eq!(out.url, out.edit_url);
  }

  #[test]
  fn neither_leg_is_an_error() {
    let err = aggregate(BASE, None, None).unwrap_err();
    assert!(matches!(err, AppError::SlideProvider(_)));
  }

  #[test]
  fn payload_carries_export_format() {
    let deck = Deck::new("conteúdo".into(), 5, "pt-BR".into(), true);
    let v = serde_json::to_value(GenerateRequest { deck: &deck, export_as: ExportFormat::Pdf }).unwrap();
    assert_eq!(v["export_as"], "pdf");
    assert_eq!(v["mood"], "fun");
    assert_eq!(v["template"], "general");
    assert_eq!(v["n_slides"], 5);
  }

  #[test]
  fn numeric_presentation_id() {
    let r: ExportResult = serde_json::from_str(r#"{"presentation_id": 42, "path": "/a.pptx"}"#).unwrap();
    assert_eq!(r.presentation_id.as_deref(), Some("42"));
    let r: ExportResult = serde_json::from_str(r#"{"path": "/a.pptx"}"#).unwrap();
    assert!(r.presentation_id.is_none());
  }

  /// Stand-in provider: PPTX succeeds, PDF answers 500.
  async fn spawn_fake_provider() -> String {
    async fn generate(Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
      match body["export_as"].as_str() {
        Some("pptx") => (
          StatusCode::OK,
          Json(serde_json::json!({"presentation_id": "abc", "path": "/app_data/abc.pptx", "edit_path": "/presentation?id=abc"})),
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"detail": "boom"}))),
      }
    }
    let app = Router::new().route(GENERATE_PATH, post(generate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn partial_failure_keeps_the_successful_format() {
    let base = spawn_fake_provider().await;
    let provider = Presenton::new("key".into(), &base, Duration::from_secs(5));
    let deck = Deck::new("Sistema Solar".into(), 5, "pt-BR".into(), false);
    let out = provider.generate(&deck).await.unwrap();
    assert_eq!(out.pptx_url, Some(format!("{base}/app_data/abc.pptx")));
    assert_eq!(out.pdf_url, None);
    assert_eq!(out.url, Some(format!("{base}/presentation?id=abc")));
  }

  #[tokio::test]
  async fn unreachable_provider_fails_both_legs() {
    // Port 9 (discard) is not served locally.
    let provider = Presenton::new("key".into(), "http://127.0.0.1:9", Duration::from_secs(2));
    let deck = Deck::new("x".into(), 3, "pt-BR".into(), false);
    assert!(provider.generate(&deck).await.is_err());
  }
}
