//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Request bodies go through `ApiJson`, so any unusable body is rejected
//! with 422 and a JSON `detail` before handler code runs.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::Result;
use crate::logic::*;
use crate::protocol::*;
use crate::routes::ApiJson;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(disciplina = %body.disciplina, format = %body.format))]
pub async fn http_generate_activity(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ActivityRequest>,
) -> Result<Json<ActivityOut>> {
  let out = generate_activity(&state, &body).await?;
  info!(target: "edu_backend", filename = %out.filename, "HTTP activity served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(disciplina = %body.disciplina, serie_ano = %body.serie_ano))]
pub async fn http_suggest_units(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<UnitSuggestionRequest>,
) -> Result<Json<UnitSuggestionsOut>> {
  let out = suggest_units(&state, &body).await?;
  info!(target: "edu_backend", count = out.sugestoes.len(), "HTTP unit suggestions served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(disciplina = %body.disciplina, unidade = %body.unidade))]
pub async fn http_lesson_plan(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<LessonPlanRequest>,
) -> Result<Json<LessonPlanOut>> {
  Ok(Json(lesson_plan(&state, &body).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_lesson_plan_pdf(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<LessonPlanPdfRequest>,
) -> Result<Json<FileOut>> {
  let out = lesson_plan_pdf(&state, &body).await?;
  info!(target: "edu_backend", filename = %out.filename, "HTTP lesson plan PDF served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_generate_slides(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<SlideRequest>,
) -> Result<Json<SlidesOut>> {
  Ok(Json(generate_slides(&state, &body).await?))
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
  };
  use tower::ServiceExt;

  use crate::config::Settings;
  use crate::llm::{testing::ScriptedModel, LanguageModel};
  use crate::retrieval::{CategoryFilter, Retriever};
  use crate::routes::build_router;

  struct FixedRetriever;

  #[async_trait]
  impl Retriever for FixedRetriever {
    async fn retrieve(&self, _: &str, _: &CategoryFilter, _: usize) -> crate::error::Result<Vec<String>> {
      Ok(vec!["EF06MA07 Compreender frações.".into(), "EF06MA08 Reconhecer frações.".into()])
    }
  }

  fn app(dir: &std::path::Path, reply: Option<&str>, with_index: bool) -> Router {
    let llm = reply.map(|r| Arc::new(ScriptedModel::replying(r)) as Arc<dyn LanguageModel>);
    let retriever = with_index.then(|| Arc::new(FixedRetriever) as Arc<dyn Retriever>);
    let state = AppState::with_parts(Settings::for_tests(dir.to_path_buf()), llm, retriever);
    build_router(Arc::new(state))
  }

  fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn health() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), None, false)
      .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["ok"], true);
  }

  #[tokio::test]
  async fn empty_body_is_unprocessable_on_every_route() {
    let dir = tempfile::tempdir().unwrap();
    for uri in [
      "/api/activity/generate",
      "/api/units/suggest",
      "/api/units/lesson-plan",
      "/api/units/lesson-plan/pdf",
      "/api/slides/generate",
    ] {
      let res = app(dir.path(), Some("{}"), true).oneshot(post_json(uri, "{}")).await.unwrap();
      assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
  }

  #[tokio::test]
  async fn unparsable_bodies_are_unprocessable_with_detail() {
    let dir = tempfile::tempdir().unwrap();
    for body in ["", "{not json", "[1, 2]"] {
      let res = app(dir.path(), Some("{}"), false)
        .oneshot(post_json("/api/units/suggest", body))
        .await
        .unwrap();
      assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body:?}");
      assert!(json_body(res).await["detail"].as_str().is_some_and(|d| !d.is_empty()));
    }

    let no_content_type = Request::builder()
      .method("POST")
      .uri("/api/units/suggest")
      .body(Body::from(r#"{"disciplina": "Arte", "serieAno": "3º ano"}"#))
      .unwrap();
    let res = app(dir.path(), Some("{}"), false).oneshot(no_content_type).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(res).await["detail"].is_string());
  }

  #[tokio::test]
  async fn missing_fields_report_a_json_detail() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), Some("{}"), false)
      .oneshot(post_json("/api/slides/generate", r#"{"slides_count": 3}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(res).await["detail"].as_str().unwrap().contains("topic"));
  }

  #[tokio::test]
  async fn suggest_returns_four_units() {
    let dir = tempfile::tempdir().unwrap();
    let reply = r#"```json
{"sugestoes": [
  {"nome": "Introdução à Lógica", "descricao": "Sequências e padrões."},
  {"nome": "Algoritmos no Cotidiano", "descricao": "Passo a passo de tarefas."},
  {"nome": "Cidadania Digital", "descricao": "Uso responsável da internet."},
  {"nome": "Projetos Criativos", "descricao": "Criação com blocos."}
]}
```"#;
    let res = app(dir.path(), Some(reply), false)
      .oneshot(post_json("/api/units/suggest", r#"{"disciplina": "Computação", "serieAno": "5º ano"}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let items = body["sugestoes"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[2]["nome"], "Cidadania Digital");
  }

  #[tokio::test]
  async fn activity_docx_is_written_and_served() {
    let dir = tempfile::tempdir().unwrap();
    let reply = r#"{
      "title": "Frações no dia a dia",
      "objective": "Reconhecer frações em situações cotidianas.",
      "bncc_skills": ["EF06MA07"],
      "content": "Maria dividiu uma pizza em 8 pedaços e comeu 3.",
      "questions": [
        {"enunciado": "Segundo o texto, quantos pedaços Maria comeu?",
         "alternativas": ["A) 2", "B) 3", "C) 5", "D) 8"], "correta": "B"}
      ]
    }"#;
    let router = app(dir.path(), Some(reply), true);
    let res = router
      .clone()
      .oneshot(post_json(
        "/api/activity/generate",
        r#"{"disciplina": "Matemática", "assunto": "Frações", "nivel": "6º ano", "format": "docx"}"#,
      ))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("atividade_") && filename.ends_with(".docx"));
    let uuid_part = filename.trim_start_matches("atividade_").trim_end_matches(".docx");
    assert!(uuid::Uuid::parse_str(uuid_part).is_ok());
    assert_eq!(body["download_url"], format!("/api/files/output/generated_activities/{filename}"));
    assert_eq!(body["content"]["questions"][0]["correta"], "B");
    assert!(dir.path().join("generated_activities").join(&filename).is_file());

    let res = router
      .oneshot(
        Request::builder()
          .uri(format!("/api/files/output/generated_activities/{filename}"))
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn activity_without_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), Some("{}"), false)
      .oneshot(post_json("/api/activity/generate", r#"{"disciplina": "Arte", "assunto": "Cores", "nivel": "2º ano"}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(res).await["detail"], "Index not initialized");
  }

  #[tokio::test]
  async fn prose_reply_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), Some("Claro! Aqui estão as unidades."), false)
      .oneshot(post_json("/api/units/suggest", r#"{"disciplina": "Geografia", "serieAno": "8º ano"}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(res).await["kind"], "model_output_not_json");
  }

  #[tokio::test]
  async fn wrong_shape_reply_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), Some(r#"{"unidades": []}"#), false)
      .oneshot(post_json("/api/units/suggest", r#"{"disciplina": "Geografia", "serieAno": "8º ano"}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(res).await["kind"], "model_output_wrong_shape");
  }

  #[tokio::test]
  async fn lesson_plan_pdf_accepts_empty_data() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), None, false)
      .oneshot(post_json("/api/units/lesson-plan/pdf", r#"{"data": {}}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("plano_") && filename.ends_with(".pdf"));
    assert!(std::fs::metadata(dir.path().join("generated_plans").join(filename)).unwrap().len() > 0);
  }

  #[tokio::test]
  async fn slides_without_key_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path(), Some("conteúdo"), false)
      .oneshot(post_json("/api/slides/generate", r#"{"topic": "Sistema Solar"}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(res).await["detail"], "PRESENTON_API_KEY not configured");
  }
}
