//! Request orchestration shared by the HTTP handlers.
//!
//! Each operation follows the same pipeline: retrieval query → curriculum
//! context (under the call site's policy) → prompt → language model →
//! validated parse → render or delegate. Handlers stay thin wrappers.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::curriculum::Category;
use crate::domain::{Activity, DocFormat, LessonPlan, UnitSuggestions};
use crate::error::{AppError, Result};
use crate::llm::LanguageModel;
use crate::parse::parse_model_json;
use crate::prompts;
use crate::protocol::*;
use crate::render::{self, layout, DocumentLayout};
use crate::retrieval::{gather_context, CategoryFilter};
use crate::slides::Deck;
use crate::state::AppState;
use crate::util::trunc_for_log;

pub const ACTIVITIES_DIR: &str = "generated_activities";
pub const PLANS_DIR: &str = "generated_plans";
const FILES_ROUTE: &str = "/api/files/output";

const TOP_K: usize = 5;
const SLIDES_TOP_K: usize = 3;

async fn complete(state: &AppState, prompt: &str) -> Result<String> {
  let model: &dyn LanguageModel = state
    .llm
    .as_deref()
    .ok_or_else(|| AppError::Config("language model not configured".into()))?;
  let raw = model.complete(prompt).await?;
  debug!(target: "edu_backend", model = model.name(), reply_len = raw.len(), "Model replied");
  Ok(raw)
}

fn download_url(subdir: &str, filename: &str) -> String {
  format!("{FILES_ROUTE}/{subdir}/{filename}")
}

/// Render on the blocking pool into `<output_dir>/<subdir>`.
async fn render_file(state: &AppState, layout: DocumentLayout, format: DocFormat, subdir: &str, prefix: &'static str) -> Result<String> {
  let dir: PathBuf = state.settings.output_dir.join(subdir);
  tokio::task::spawn_blocking(move || render::render_to_file(&layout, format, &dir, prefix))
    .await
    .map_err(|e| AppError::Render(format!("render task failed: {e}")))?
}

#[instrument(level = "info", skip(state, req), fields(disciplina = %req.disciplina, nivel = %req.nivel, format = %req.format))]
pub async fn generate_activity(state: &AppState, req: &ActivityRequest) -> Result<ActivityOut> {
  let p = &state.settings.prompts;
  let context = gather_context(
    state.retriever.as_deref(),
    state.settings.retrieval.activity,
    "activity",
    &prompts::activity_query(p, req),
    &CategoryFilter::any_of(&[Category::Normativa, Category::Apoio]),
    TOP_K,
  )
  .await?;

  let raw = complete(state, &prompts::activity_prompt(p, req, &context)).await?;
  let activity = parse_model_json::<Activity>(&raw).inspect_err(|e| {
    warn!(target: "edu_backend", kind = e.kind(), raw = %trunc_for_log(&raw, 200), "Unusable activity output");
  })?;

  if activity.needs_support_text() && activity.content.trim().is_empty() {
    warn!(target: "edu_backend", "Activity refers to a support text but none was provided");
  }

  let format = DocFormat::from_request(&req.format);
  let filename = render_file(state, layout::activity(&activity), format, ACTIVITIES_DIR, "atividade").await?;
  info!(target: "edu_backend", %filename, questions = activity.questions.len(), "Activity generated");

  Ok(ActivityOut {
    download_url: download_url(ACTIVITIES_DIR, &filename),
    filename,
    content: activity,
  })
}

#[instrument(level = "info", skip(state, req), fields(disciplina = %req.disciplina, serie_ano = %req.serie_ano))]
pub async fn suggest_units(state: &AppState, req: &UnitSuggestionRequest) -> Result<UnitSuggestionsOut> {
  let p = &state.settings.prompts;
  let context = gather_context(
    state.retriever.as_deref(),
    state.settings.retrieval.units,
    "units",
    &prompts::units_query(p, req),
    &CategoryFilter::any_of(&[Category::Normativa, Category::Apoio]),
    TOP_K,
  )
  .await?;

  let raw = complete(state, &prompts::units_prompt(p, req, &context)).await?;
  let parsed = parse_model_json::<UnitSuggestions>(&raw)?;
  if parsed.sugestoes.len() != 4 {
    warn!(target: "edu_backend", got = parsed.sugestoes.len(), "Expected 4 unit suggestions");
  }
  Ok(UnitSuggestionsOut { sugestoes: parsed.sugestoes })
}

#[instrument(level = "info", skip(state, req), fields(disciplina = %req.disciplina, unidade = %req.unidade))]
pub async fn lesson_plan(state: &AppState, req: &LessonPlanRequest) -> Result<LessonPlanOut> {
  let p = &state.settings.prompts;
  let context = gather_context(
    state.retriever.as_deref(),
    state.settings.retrieval.lesson_plan,
    "lesson_plan",
    &prompts::lesson_plan_query(p, req),
    &CategoryFilter::any_of(&[Category::Normativa, Category::Apoio, Category::Legal, Category::Pedagogica]),
    TOP_K,
  )
  .await?;

  let raw = complete(state, &prompts::lesson_plan_prompt(p, req, &context)).await?;
  // Free-form: any object is a plan, returned as the model wrote it.
  let plan = parse_model_json::<serde_json::Map<String, serde_json::Value>>(&raw)?;
  info!(target: "edu_backend", sections = plan.len(), "Lesson plan generated");
  Ok(LessonPlanOut { conteudo: serde_json::Value::Object(plan) })
}

/// Render a (possibly hand-edited) plan. Never rejects the shape of `data`.
#[instrument(level = "info", skip(state, req), fields(keys = req.data.len()))]
pub async fn lesson_plan_pdf(state: &AppState, req: &LessonPlanPdfRequest) -> Result<FileOut> {
  let plan = LessonPlan::from_loose(&req.data);
  let filename = render_file(state, layout::lesson_plan(&plan), DocFormat::Pdf, PLANS_DIR, "plano").await?;
  Ok(FileOut { download_url: download_url(PLANS_DIR, &filename), filename })
}

#[instrument(level = "info", skip(state, req), fields(topic = %req.topic, slides_count = req.slides_count))]
pub async fn generate_slides(state: &AppState, req: &SlideRequest) -> Result<SlidesOut> {
  let provider = state
    .slides
    .as_ref()
    .ok_or_else(|| AppError::Config("PRESENTON_API_KEY not configured".into()))?;

  let content = match slide_content(state, req).await {
    Ok(c) if !c.trim().is_empty() => c,
    Ok(_) => fallback_slide_content(&req.topic),
    Err(e) => {
      warn!(target: "edu_backend", error = %e, "Slide content generation failed; using topic only");
      fallback_slide_content(&req.topic)
    }
  };

  let young = prompts::is_young_audience(req.serie_ano.as_deref());
  let deck = Deck::new(content, req.slides_count, req.language.clone(), young);
  provider.generate(&deck).await
}

async fn slide_content(state: &AppState, req: &SlideRequest) -> Result<String> {
  let context = gather_context(
    state.retriever.as_deref(),
    state.settings.retrieval.slides,
    "slides",
    &req.topic,
    &CategoryFilter::default(),
    SLIDES_TOP_K,
  )
  .await?;
  complete(state, &prompts::slides_prompt(&state.settings.prompts, req, &context)).await
}

fn fallback_slide_content(topic: &str) -> String {
  format!("Apresentação sobre {topic}")
}
