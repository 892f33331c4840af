//! Domain models: the artifacts the language model is asked to produce.
//!
//! These are contracts with the model, so every field defaults when absent.
//! Field names follow the JSON the prompts ask for.

use serde::{Deserialize, Deserializer, Serialize};

/// Models send `null` for fields they consider empty; treat it as absent.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Output format for rendered documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocFormat {
  Pdf,
  Docx,
}

impl DocFormat {
  /// "docx" (any case) selects DOCX; anything else renders a PDF.
  pub fn from_request(s: &str) -> Self {
    if s.trim().eq_ignore_ascii_case("docx") { DocFormat::Docx } else { DocFormat::Pdf }
  }

  pub fn extension(&self) -> &'static str {
    match self {
      DocFormat::Pdf => "pdf",
      DocFormat::Docx => "docx",
    }
  }
}

/// A generated multiple-choice activity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Activity {
  #[serde(default)] pub title: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")] pub objective: String,
  #[serde(default, deserialize_with = "null_as_default")] pub bncc_skills: Vec<String>,
  /// Support text. Should be non-empty only when some question refers to it.
  #[serde(default, deserialize_with = "null_as_default")] pub content: String,
  #[serde(default, deserialize_with = "null_as_default")] pub questions: Vec<QuestionItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionItem {
  Choice(Question),
  /// The model occasionally emits a bare string; rendered as an open question.
  Open(String),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Question {
  #[serde(default, alias = "question", deserialize_with = "null_as_default")] pub enunciado: String,
  #[serde(default, alias = "options", deserialize_with = "null_as_default")] pub alternativas: Vec<String>,
  #[serde(default, deserialize_with = "null_as_default")] pub correta: String,
}

impl Activity {
  /// True when any prompt refers to the support text ("segundo o texto").
  /// Informational only; the model is trusted to fill `content` accordingly.
  pub fn needs_support_text(&self) -> bool {
    self.questions.iter().any(|q| match q {
      QuestionItem::Choice(q) => q.enunciado.to_lowercase().contains("segundo o texto"),
      QuestionItem::Open(s) => s.to_lowercase().contains("segundo o texto"),
    })
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitSuggestion {
  pub nome: String,
  pub descricao: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitSuggestions {
  pub sugestoes: Vec<UnitSuggestion>,
}

/// A lesson plan. Unknown sections are kept in `extra` so responses do not
/// lose anything the model produced.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
  #[serde(default, skip_serializing_if = "Option::is_none")] pub titulo: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub duracao: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub serie_ano: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub objetivos: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub conteudo_programatico: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub estrategias_ensino: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub bncc: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub avaliacao: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub recursos: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub referencias: Vec<String>,
  #[serde(flatten)] pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LessonPlan {
  /// Build a plan from an arbitrary JSON object without failing.
  ///
  /// Scalars are stringified, a lone string where a list is expected becomes
  /// a one-item list, and anything unusable is treated as absent.
  pub fn from_loose(map: &serde_json::Map<String, serde_json::Value>) -> Self {
    let text = |k: &str| map.get(k).and_then(scalar_text);
    let list = |k: &str| map.get(k).map(list_text).unwrap_or_default();

    let known = [
      "titulo", "duracao", "serieAno", "objetivos", "conteudoProgramatico",
      "estrategiasEnsino", "bncc", "avaliacao", "recursos", "referencias",
    ];
    let extra = map
      .iter()
      .filter(|(k, _)| !known.contains(&k.as_str()))
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect();

    Self {
      titulo: text("titulo"),
      duracao: text("duracao"),
      serie_ano: text("serieAno"),
      objetivos: list("objetivos"),
      conteudo_programatico: list("conteudoProgramatico"),
      estrategias_ensino: list("estrategiasEnsino"),
      bncc: list("bncc"),
      // Some models answer with a list of criteria here.
      avaliacao: text("avaliacao").or_else(|| {
        let items = list("avaliacao");
        (!items.is_empty()).then(|| items.join("\n"))
      }),
      recursos: list("recursos"),
      referencias: list("referencias"),
      extra,
    }
  }
}

fn scalar_text(v: &serde_json::Value) -> Option<String> {
  match v {
    serde_json::Value::String(s) => Some(s.clone()),
    serde_json::Value::Number(n) => Some(n.to_string()),
    serde_json::Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn list_text(v: &serde_json::Value) -> Vec<String> {
  match v {
    serde_json::Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
    other => scalar_text(other).into_iter().collect(),
  }
}
