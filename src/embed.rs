//! Embedding-based ranking on top of the corpus index.
//!
//! Lexical search proposes a candidate pool; the query and the candidates
//! are embedded through an OpenAI-compatible `/embeddings` endpoint and
//! ordered by cosine similarity. When embedding fails the lexical order is
//! kept, so retrieval never gets worse than the plain index.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::error::{AppError, Result};
use crate::llm::extract_openai_error;
use crate::retrieval::{CategoryFilter, CorpusIndex, Retriever};

/// Lexical candidates fetched per requested snippet.
const CANDIDATE_POOL: usize = 4;

#[async_trait]
pub trait Embedder: Send + Sync {
  /// One vector per input, in input order.
  async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Clone)]
pub struct ApiEmbedder {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  pub model: String,
}

impl ApiEmbedder {
  pub fn new(api_key: String, base_url: &str, model: String) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| AppError::Retrieval(format!("failed to build embeddings client: {e}")))?;
    Ok(Self {
      client,
      api_key,
      base_url: base_url.trim().trim_end_matches('/').to_string(),
      model,
    })
  }

  /// Enabled with OPENAI_API_KEY. EMBEDDING_MODEL=off disables it.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.into());
    let model = std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.into());
    if model.trim().is_empty() || model.eq_ignore_ascii_case("off") {
      info!(target: "retrieval", "Embedding ranking disabled by EMBEDDING_MODEL");
      return None;
    }
    match Self::new(api_key, &base_url, model) {
      Ok(e) => Some(e),
      Err(e) => {
        error!(target: "retrieval", error = %e, "Embedding ranking unavailable");
        None
      }
    }
  }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
  embedding: Vec<f32>,
  index: usize,
}

#[async_trait]
impl Embedder for ApiEmbedder {
  #[instrument(level = "debug", skip(self, texts), fields(model = %self.model, count = texts.len()))]
  async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let url = format!("{}/embeddings", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "edu-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&EmbeddingRequest { model: &self.model, input: texts })
      .send()
      .await
      .map_err(|e| AppError::Retrieval(format!("embedding request failed: {e}")))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(AppError::Retrieval(format!("embeddings HTTP {status}: {msg}")));
    }

    let mut body: EmbeddingResponse = res
      .json()
      .await
      .map_err(|e| AppError::Retrieval(format!("embedding reply not understood: {e}")))?;
    if body.data.len() != texts.len() {
      return Err(AppError::Retrieval(format!(
        "expected {} embeddings, got {}",
        texts.len(),
        body.data.len()
      )));
    }

    // The API may answer out of order.
    body.data.sort_by_key(|d| d.index);
    debug!(target: "retrieval", dim = body.data.first().map(|d| d.embedding.len()).unwrap_or(0), "Embeddings received");
    Ok(body.data.into_iter().map(|d| d.embedding).collect())
  }
}

/// Cosine similarity; 0.0 for empty, mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.is_empty() || a.len() != b.len() {
    return 0.0;
  }
  let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
  for (x, y) in a.iter().zip(b) {
    dot += x * y;
    na += x * x;
    nb += y * y;
  }
  let denom = na.sqrt() * nb.sqrt();
  if denom == 0.0 { 0.0 } else { dot / denom }
}

/// `CorpusIndex` whose lexical hits are re-ordered by embedding similarity.
pub struct RerankedIndex {
  index: CorpusIndex,
  embedder: Arc<dyn Embedder>,
}

impl RerankedIndex {
  pub fn new(index: CorpusIndex, embedder: Arc<dyn Embedder>) -> Self {
    Self { index, embedder }
  }

  async fn rerank(&self, query: &str, candidates: &[String], top_k: usize) -> Result<Vec<String>> {
    let mut texts: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
    texts.push(query);
    texts.extend(candidates.iter().map(String::as_str));

    let vectors = self.embedder.embed_batch(&texts).await?;
    let Some((q, docs)) = vectors.split_first() else {
      return Err(AppError::Retrieval("no query embedding returned".into()));
    };
    if docs.len() != candidates.len() {
      return Err(AppError::Retrieval(format!(
        "expected {} candidate embeddings, got {}",
        candidates.len(),
        docs.len()
      )));
    }

    let mut scored: Vec<(f32, usize)> = docs
      .iter()
      .enumerate()
      .map(|(i, v)| (cosine_similarity(q, v), i))
      .filter(|(s, _)| s.is_finite())
      .collect();
    // Stable sort keeps lexical order among equal scores.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scored.into_iter().take(top_k).map(|(_, i)| candidates[i].clone()).collect())
  }
}

#[async_trait]
impl Retriever for RerankedIndex {
  async fn retrieve(&self, query: &str, filter: &CategoryFilter, top_k: usize) -> Result<Vec<String>> {
    let mut candidates = self.index.search(query, filter, top_k.saturating_mul(CANDIDATE_POOL));
    if candidates.len() <= 1 {
      return Ok(candidates);
    }
    match self.rerank(query, &candidates, top_k).await {
      Ok(hits) => Ok(hits),
      Err(e) => {
        warn!(target: "retrieval", error = %e, "Embedding ranking failed; using lexical order");
        candidates.truncate(top_k);
        Ok(candidates)
      }
    }
  }
}
