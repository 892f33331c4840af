//! Application state: settings plus the optional integrations built once at
//! startup (language model, curriculum retriever, slide provider).
//!
//! Everything here is read-only after construction and shared as
//! `Arc<AppState>`. Missing integrations are `None`; the request paths decide
//! how to degrade.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::embed::{ApiEmbedder, RerankedIndex};
use crate::llm::{LanguageModel, OpenAI};
use crate::retrieval::{CorpusIndex, Retriever};
use crate::slides::Presenton;

#[derive(Clone)]
pub struct AppState {
  pub settings: Settings,
  pub llm: Option<Arc<dyn LanguageModel>>,
  pub retriever: Option<Arc<dyn Retriever>>,
  pub slides: Option<Presenton>,
}

impl AppState {
  /// Build state from env: resolve settings, load the curriculum index,
  /// init the language model and slide provider clients.
  #[instrument(level = "info", skip_all)]
  pub fn from_env() -> Self {
    let settings = Settings::from_env();

    let llm: Option<Arc<dyn LanguageModel>> = match OpenAI::from_env() {
      Some(oa) => {
        info!(target: "edu_backend", base_url = %oa.base_url, model = %oa.model, "Language model enabled.");
        Some(Arc::new(oa))
      }
      None => {
        warn!(target: "edu_backend", "Language model disabled (no OPENAI_API_KEY). Generation routes will fail.");
        None
      }
    };

    let retriever = load_retriever(&settings);
    let slides = slide_provider(&settings);

    Self { settings, llm, retriever, slides }
  }

  /// State with explicit parts. Used by tests to inject canned integrations.
  #[cfg(test)]
  pub fn with_parts(
    settings: Settings,
    llm: Option<Arc<dyn LanguageModel>>,
    retriever: Option<Arc<dyn Retriever>>,
  ) -> Self {
    let slides = slide_provider(&settings);
    Self { settings, llm, retriever, slides }
  }
}

fn load_retriever(settings: &Settings) -> Option<Arc<dyn Retriever>> {
  let Some(dir) = settings.curriculum_dir.as_deref() else {
    warn!(target: "retrieval", "CURRICULUM_DIR not set; running without curriculum index");
    return None;
  };
  match CorpusIndex::load(dir) {
    Ok(index) if index.is_empty() => {
      warn!(target: "retrieval", dir = %dir.display(), "Curriculum directory has no indexable documents");
      None
    }
    Ok(index) => {
      info!(target: "retrieval", dir = %dir.display(), chunks = index.len(), "Curriculum index loaded");
      match ApiEmbedder::from_env() {
        Some(embedder) => {
          info!(target: "retrieval", model = %embedder.model, "Ranking curriculum hits by embeddings");
          Some(Arc::new(RerankedIndex::new(index, Arc::new(embedder))))
        }
        None => Some(Arc::new(index)),
      }
    }
    Err(e) => {
      warn!(target: "retrieval", dir = %dir.display(), error = %e, "Failed to load curriculum index");
      None
    }
  }
}

fn slide_provider(settings: &Settings) -> Option<Presenton> {
  let key = settings.presenton_api_key.clone()?;
  info!(target: "edu_backend", base_url = %settings.presenton_base_url, "Slide provider enabled.");
  Some(Presenton::new(
    key,
    &settings.presenton_base_url,
    Duration::from_secs(settings.slides_timeout_secs),
  ))
}
