//! Router assembly: HTTP endpoints, generated-file serving, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
  extract::FromRequest,
  routing::{get, post},
  Router,
};
use tower::ServiceBuilder;
use tower_http::{
  cors::{Any, CorsLayer},
  services::ServeDir,
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::error::AppError;
use crate::state::AppState;

pub mod http;

/// `Json` extractor whose rejections (bad syntax, wrong shape, missing
/// content type) become a 422 with a JSON `detail`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Build the application router with:
/// - generation endpoints under `/api/...`
/// - generated documents served from the output dir at `/api/files/output`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  let files = ServeDir::new(&state.settings.output_dir);

  Router::new()
    .route("/api/health", get(http::http_health))
    .route("/api/activity/generate", post(http::http_generate_activity))
    .route("/api/units/suggest", post(http::http_suggest_units))
    .route("/api/units/lesson-plan", post(http::http_lesson_plan))
    .route("/api/units/lesson-plan/pdf", post(http::http_lesson_plan_pdf))
    .route("/api/slides/generate", post(http::http_generate_slides))
    .nest_service("/api/files/output", files)
    .with_state(state)
    .layer(
      ServiceBuilder::new()
        .layer(
          TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
    )
}
