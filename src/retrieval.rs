//! Curriculum retrieval: the `Retriever` seam, category filters, per-call-site
//! failure policy, and a small built-in corpus index.
//!
//! The built-in `CorpusIndex` reads `.txt`, `.md` and `.pdf` files from a
//! directory, tags each file with its curriculum category, splits it into
//! paragraph chunks and ranks chunks by term overlap with the query.
//! `embed::RerankedIndex` re-orders those hits by embedding similarity when
//! an embeddings endpoint is available.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::curriculum::{classify, Category};
use crate::error::{AppError, Result};
use crate::util::fold_accents;

/// Target chunk size in characters.
const TARGET_CHUNK_SIZE: usize = 1200;

/// Allowed categories, combined with OR. Empty means "any category".
#[derive(Clone, Debug, Default)]
pub struct CategoryFilter(Vec<Category>);

impl CategoryFilter {
  pub fn any_of(categories: &[Category]) -> Self {
    Self(categories.to_vec())
  }

  pub fn allows(&self, c: Category) -> bool {
    self.0.is_empty() || self.0.contains(&c)
  }
}

/// What a call site does when the index is missing or retrieval fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPolicy {
  /// Continue with empty context and log a warning.
  BestEffort,
  /// Fail the request.
  Required,
}

#[async_trait]
pub trait Retriever: Send + Sync {
  /// Up to `top_k` snippets, best match first.
  async fn retrieve(&self, query: &str, filter: &CategoryFilter, top_k: usize) -> Result<Vec<String>>;
}

/// Run one retrieval under `policy` and join the snippets with blank lines.
#[instrument(level = "info", skip(retriever, query, filter), fields(query_len = query.len()))]
pub async fn gather_context(
  retriever: Option<&dyn Retriever>,
  policy: RetrievalPolicy,
  site: &str,
  query: &str,
  filter: &CategoryFilter,
  top_k: usize,
) -> Result<String> {
  let Some(retriever) = retriever else {
    return match policy {
      RetrievalPolicy::Required => Err(AppError::IndexUnavailable),
      RetrievalPolicy::BestEffort => {
        warn!(target: "retrieval", %site, "Index not initialized; continuing without curriculum context");
        Ok(String::new())
      }
    };
  };

  match retriever.retrieve(query, filter, top_k).await {
    Ok(snippets) => {
      debug!(target: "retrieval", %site, hits = snippets.len(), "Retrieved curriculum context");
      Ok(snippets.join("\n\n"))
    }
    Err(e) => match policy {
      RetrievalPolicy::Required => Err(e),
      RetrievalPolicy::BestEffort => {
        warn!(target: "retrieval", %site, error = %e, "Retrieval failed; continuing without curriculum context");
        Ok(String::new())
      }
    },
  }
}

// ---------------------------------------------------------------------------
// Built-in corpus index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Chunk {
  category: Category,
  text: String,
  terms: HashSet<String>,
}

/// In-memory lexical index over a curriculum directory. Read-only after load.
#[derive(Debug, Default)]
pub struct CorpusIndex {
  chunks: Vec<Chunk>,
}

impl CorpusIndex {
  /// Load every supported file in `dir` (non-recursive, sorted by name).
  pub fn load(dir: &Path) -> Result<Self> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
      .filter_map(|e| e.ok().map(|e| e.path()))
      .filter(|p| p.is_file())
      .collect();
    paths.sort();

    let mut index = Self::default();
    for path in paths {
      let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
      let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
      let text = match ext.as_str() {
        "txt" | "md" => read_text(&path, &name)?,
        "pdf" => match extract_pdf_text(&path) {
          Ok(t) => t,
          Err(e) => {
            warn!(target: "retrieval", file = %name, error = %e, "Skipping unreadable PDF");
            continue;
          }
        },
        _ => continue,
      };
      let category = classify(&name);
      let before = index.chunks.len();
      index.add_document(category, &text);
      info!(target: "retrieval", file = %name, %category, kind = category.description(), chunks = index.chunks.len() - before, "Indexed curriculum document");
    }
    Ok(index)
  }

  pub fn add_document(&mut self, category: Category, text: &str) {
    for piece in chunk_paragraphs(text) {
      let terms = tokenize(&piece).collect();
      self.chunks.push(Chunk { category, text: piece, terms });
    }
  }

  pub fn len(&self) -> usize {
    self.chunks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  pub(crate) fn search(&self, query: &str, filter: &CategoryFilter, top_k: usize) -> Vec<String> {
    let q: HashSet<String> = tokenize(query).collect();
    if q.is_empty() || top_k == 0 {
      return Vec::new();
    }

    let mut scored: Vec<(f32, usize)> = self
      .chunks
      .iter()
      .enumerate()
      .filter(|(_, c)| filter.allows(c.category))
      .filter_map(|(i, c)| {
        let hits = q.iter().filter(|t| c.terms.contains(*t)).count();
        if hits == 0 {
          return None;
        }
        // Damp long chunks so they do not win on sheer vocabulary.
        let score = hits as f32 / (1.0 + (c.terms.len() as f32).ln());
        Some((score, i))
      })
      .collect();

    // Stable sort keeps load order among equal scores.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
      .into_iter()
      .take(top_k)
      .map(|(_, i)| self.chunks[i].text.clone())
      .collect()
  }
}

#[async_trait]
impl Retriever for CorpusIndex {
  async fn retrieve(&self, query: &str, filter: &CategoryFilter, top_k: usize) -> Result<Vec<String>> {
    Ok(self.search(query, filter, top_k))
  }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
  const STOPWORDS: &[&str] = &["para", "sobre", "com", "das", "dos", "que", "uma", "the", "and"];
  fold_accents(text)
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| t.chars().count() >= 3 && !STOPWORDS.contains(t))
    .map(str::to_string)
    .collect::<Vec<_>>()
    .into_iter()
}

/// Split on blank lines and merge short paragraphs up to `TARGET_CHUNK_SIZE`.
fn chunk_paragraphs(text: &str) -> Vec<String> {
  let mut chunks = Vec::new();
  let mut current = String::new();
  for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
    if !current.is_empty() && current.len() + 2 + para.len() > TARGET_CHUNK_SIZE {
      chunks.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push_str("\n\n");
    }
    current.push_str(para);
  }
  if !current.is_empty() {
    chunks.push(current);
  }
  chunks
}

/// UTF-8 if valid, otherwise Latin-1 (older curriculum exports are ISO-8859-1).
fn read_text(path: &Path, name: &str) -> Result<String> {
  let bytes = std::fs::read(path)?;
  match String::from_utf8(bytes) {
    Ok(text) => Ok(text),
    Err(e) => {
      warn!(target: "retrieval", file = %name, error = %e.utf8_error(), "Not UTF-8; decoding as Latin-1");
      Ok(e.into_bytes().into_iter().map(char::from).collect())
    }
  }
}

fn extract_pdf_text(path: &Path) -> Result<String> {
  use std::io::Cursor;

  let bytes = std::fs::read(path)?;
  let reader = oxidize_pdf::parser::reader::PdfReader::new(Cursor::new(bytes))
    .map_err(|e| AppError::Retrieval(format!("failed to parse PDF {}: {e}", path.display())))?;
  let doc = oxidize_pdf::parser::document::PdfDocument::new(reader);
  let page_count = doc
    .page_count()
    .map_err(|e| AppError::Retrieval(format!("failed to count pages of {}: {e}", path.display())))?;

  let mut all_text = String::new();
  for i in 0..page_count {
    match doc.extract_text_from_page(i) {
      Ok(extracted) => {
        if !all_text.is_empty() && !extracted.text.is_empty() {
          all_text.push_str("\n\n");
        }
        all_text.push_str(&extracted.text);
      }
      Err(e) => warn!(target: "retrieval", page = i, error = %e, "Skipping page with extraction error"),
    }
  }
  Ok(all_text)
}
