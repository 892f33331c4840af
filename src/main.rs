//! Curriculum-grounded teaching material backend.
//!
//! - Axum HTTP API (activities, unit suggestions, lesson plans, slides)
//! - Curriculum retrieval over a local document directory
//! - Optional OpenAI-compatible language model and Presenton slide provider
//! - Generated PDF/DOCX files served from the output directory
//!
//! Important env variables (a `.env` file is honored):
//!   PORT               : u16 (default 3000)
//!   APP_CONFIG_PATH    : path to TOML config (prompts, retrieval policies)
//!   OPENAI_API_KEY     : enables the language model if present
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL       : default "gpt-4o-mini"
//!   PRESENTON_API_KEY  : enables slide generation if present
//!   PRESENTON_BASE_URL : default "https://api.presenton.ai"
//!   CURRICULUM_DIR     : directory of curriculum documents to index
//!   OUTPUT_DIR         : where generated documents are written (default "output")
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod config;
mod curriculum;
mod domain;
mod embed;
mod error;
mod llm;
mod logic;
mod parse;
mod prompts;
mod protocol;
mod render;
mod retrieval;
mod routes;
mod slides;
mod state;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  dotenvy::dotenv().ok();
  telemetry::init_tracing();

  // Shared, read-only application state (settings, model, index, slide client).
  let state = Arc::new(AppState::from_env());
  info!(target: "edu_backend", output_dir = %state.settings.output_dir.display(), "Serving generated files");

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "edu_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
