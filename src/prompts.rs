//! Prompt and retrieval-query builders, one per artifact.
//!
//! Templates live in `config::Prompts`; this module only decides what goes
//! into each placeholder.

use crate::config::Prompts;
use crate::protocol::{ActivityRequest, LessonPlanRequest, SlideRequest, UnitSuggestionRequest};
use crate::util::fill_template;

const YOUNG_GRADES: &[&str] = &[
  "1º ano", "2º ano", "3º ano", "4º ano", "5º ano",
  "1 ano", "2 ano", "3 ano", "4 ano", "5 ano",
  "fundamental i",
];

pub fn activity_query(p: &Prompts, req: &ActivityRequest) -> String {
  fill_template(
    &p.activity_query,
    &[("disciplina", req.disciplina.as_str()), ("assunto", req.assunto.as_str()), ("nivel", req.nivel.as_str())],
  )
}

pub fn activity_prompt(p: &Prompts, req: &ActivityRequest, context: &str) -> String {
  fill_template(
    &p.activity_template,
    &[
      ("disciplina", req.disciplina.as_str()),
      ("assunto", req.assunto.as_str()),
      ("nivel", req.nivel.as_str()),
      ("context", context),
    ],
  )
}

pub fn units_query(p: &Prompts, req: &UnitSuggestionRequest) -> String {
  fill_template(&p.units_query, &[("disciplina", req.disciplina.as_str()), ("serie_ano", req.serie_ano.as_str())])
}

pub fn units_prompt(p: &Prompts, req: &UnitSuggestionRequest, context: &str) -> String {
  fill_template(
    &p.units_template,
    &[("disciplina", req.disciplina.as_str()), ("serie_ano", req.serie_ano.as_str()), ("context", context)],
  )
}

pub fn lesson_plan_query(p: &Prompts, req: &LessonPlanRequest) -> String {
  fill_template(
    &p.lesson_plan_query,
    &[("disciplina", req.disciplina.as_str()), ("serie_ano", req.serie_ano.as_str()), ("unidade", req.unidade.as_str())],
  )
}

pub fn lesson_plan_prompt(p: &Prompts, req: &LessonPlanRequest, context: &str) -> String {
  fill_template(
    &p.lesson_plan_template,
    &[
      ("disciplina", req.disciplina.as_str()),
      ("serie_ano", req.serie_ano.as_str()),
      ("unidade", req.unidade.as_str()),
      ("descricao", req.descricao.as_str()),
      ("context", context),
    ],
  )
}

/// Early grades (Fundamental I) get a playful tone. Ensino Médio never does.
pub fn is_young_audience(serie_ano: Option<&str>) -> bool {
  serie_ano
    .map(|s| {
      let s = s.to_lowercase();
      let high_school = s.contains("médio")
        || s.contains("medio")
        || s.split(|c: char| !c.is_alphanumeric()).any(|w| w == "em");
      let s = s.replace("fundamental ii", "");
      !high_school && YOUNG_GRADES.iter().any(|g| s.contains(g))
    })
    .unwrap_or(false)
}

pub fn slides_prompt(p: &Prompts, req: &SlideRequest, context: &str) -> String {
  let tone = match req.serie_ano.as_deref() {
    None => "",
    Some(s) if is_young_audience(Some(s)) => p.slides_tone_young.as_str(),
    Some(_) => p.slides_tone_default.as_str(),
  };
  let count = req.slides_count.to_string();
  fill_template(
    &p.slides_template,
    &[
      ("topic", req.topic.as_str()),
      ("serie_ano", req.serie_ano.as_deref().unwrap_or("Não especificado")),
      ("tone", tone),
      ("slides_count", count.as_str()),
      ("context", context),
    ],
  )
}
