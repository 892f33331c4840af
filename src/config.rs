//! Runtime configuration: environment variables plus an optional TOML file.
//!
//! The TOML file (APP_CONFIG_PATH) can override prompt templates, retrieval
//! policies and a few knobs. Any field left out keeps its default.
//!
//! ```toml
//! output_dir = "output"
//! slides_timeout_secs = 120
//!
//! [retrieval]
//! activity = "required"
//! lesson_plan = "best_effort"
//!
//! [prompts]
//! units_template = "..."
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::retrieval::RetrievalPolicy;

pub const DEFAULT_PRESENTON_BASE_URL: &str = "https://api.presenton.ai";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FileConfig {
  pub output_dir: Option<PathBuf>,
  pub curriculum_dir: Option<PathBuf>,
  pub slides_timeout_secs: u64,
  pub retrieval: RetrievalPolicies,
  pub prompts: Prompts,
}

impl Default for FileConfig {
  fn default() -> Self {
    Self {
      output_dir: None,
      curriculum_dir: None,
      slides_timeout_secs: 120,
      retrieval: RetrievalPolicies::default(),
      prompts: Prompts::default(),
    }
  }
}

/// How each call site reacts to a missing or failing index.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalPolicies {
  pub activity: RetrievalPolicy,
  pub units: RetrievalPolicy,
  pub lesson_plan: RetrievalPolicy,
  pub slides: RetrievalPolicy,
}

impl Default for RetrievalPolicies {
  fn default() -> Self {
    Self {
      activity: RetrievalPolicy::Required,
      units: RetrievalPolicy::BestEffort,
      lesson_plan: RetrievalPolicy::BestEffort,
      slides: RetrievalPolicy::BestEffort,
    }
  }
}

/// Prompt templates. Placeholders are `{name}` and filled by `prompts.rs`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub activity_query: String,
  pub activity_template: String,
  pub units_query: String,
  pub units_template: String,
  pub lesson_plan_query: String,
  pub lesson_plan_template: String,
  pub slides_template: String,
  pub slides_tone_young: String,
  pub slides_tone_default: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      activity_query: "Habilidades e competências da BNCC para {nivel}, disciplina {disciplina}, sobre o tema {assunto}.".into(),
      activity_template: ACTIVITY_TEMPLATE.into(),
      units_query: "Quais são as unidades temáticas da BNCC para {serie_ano}, disciplina {disciplina}?".into(),
      units_template: UNITS_TEMPLATE.into(),
      lesson_plan_query: "Habilidades e competências BNCC para {serie_ano}, disciplina {disciplina}, unidade {unidade}".into(),
      lesson_plan_template: LESSON_PLAN_TEMPLATE.into(),
      slides_template: SLIDES_TEMPLATE.into(),
      slides_tone_young: "O público-alvo são crianças pequenas (Ensino Fundamental I). Use uma linguagem muito simples, alegre, lúdica e divertida. Inclua analogias criativas e emojis para tornar o conteúdo visualmente atraente e amigável.".into(),
      slides_tone_default: "O público-alvo são estudantes. Use uma linguagem clara, objetiva e educativa.".into(),
    }
  }
}

const ACTIVITY_TEMPLATE: &str = r#"Você é um professor de {disciplina} experiente no Ensino Básico.
Sua tarefa é criar uma Atividade Avaliativa sobre '{assunto}' para alunos do {nivel}.

DIRETRIZES DE QUALIDADE (IMPORTANTE):
1. ADEQUAÇÃO AO NÍVEL: A linguagem e a dificuldade devem ser ACESSÍVEIS para a série solicitada. Evite termos acadêmicos ou questões complexas demais.
2. FOCO NA DISCIPLINA: A atividade deve ser sobre a matéria solicitada. NÃO force temas de tecnologia se não fizer sentido.
3. SEM ALUCINAÇÕES: Não invente nomes de empresas, escolas ou softwares fictícios. Use contextos reais ou genéricos.
4. TEXTO DE APOIO OPCIONAL: Se ALGUMA questão usar a expressão 'Segundo o texto' (ou variações de maiúsculas/minúsculas), você DEVE preencher o campo 'content' com um texto curto de apoio (máx. 2 parágrafos), exibido ANTES das questões, contendo de forma explícita as informações necessárias para respondê-las.
5. Se NENHUMA questão usar a expressão 'Segundo o texto', o campo 'content' deve ser uma string vazia ("") e as questões não podem depender de um texto de apoio externo.
6. BNCC E CIEB COMO BASE: Use o contexto abaixo (normas da BNCC e exemplos do CIEB) para alinhar as habilidades e inspirar as questões.

Contexto (BNCC/CIEB):
{context}

Estrutura da Atividade:
1. Texto de Apoio (campo 'content'): curto, direto e fácil de ler. Só deve ser preenchido se houver questões com 'Segundo o texto'.
2. Questões: 5 questões de múltipla escolha, claras e objetivas.
3. Alternativas: simples e diretas.

A saída deve ser EXATAMENTE um JSON válido com a seguinte estrutura:
{
  "title": "Título Criativo da Atividade",
  "objective": "Objetivo pedagógico da atividade (em 1 parágrafo)",
  "bncc_skills": ["Código(s) e descrição(ões) da(s) habilidade(s) da BNCC usadas"],
  "content": "Um texto de apoio curto OU string vazia se nenhuma questão usar \"Segundo o texto\".",
  "questions": [
    {
      "enunciado": "Enunciado da questão 1",
      "alternativas": ["A) alternativa A", "B) alternativa B", "C) alternativa C", "D) alternativa D"],
      "correta": "A"
    }
  ]
}

Não inclua markdown ```json ... ```; responda apenas com o JSON puro.
"#;

const UNITS_TEMPLATE: &str = r#"Você é um especialista em currículo escolar alinhado à BNCC.
Sua tarefa é sugerir EXATAMENTE 4 unidades de ensino lógicas, sequenciais e distintas para cobrir todo o ano letivo.

Série/Ano: "{serie_ano}"
Disciplina: "{disciplina}"

Contexto da BNCC (se houver):
{context}

REGRAS OBRIGATÓRIAS:
1. Gere exatamente 4 unidades (Bimestre 1, 2, 3 e 4).
2. Os nomes das unidades devem ser TEMÁTICOS e DESCRITIVOS (ex: 'Introdução à Lógica', 'Cidadania Digital'), NÃO use apenas 'Unidade 1'.
3. As unidades devem seguir uma progressão lógica de dificuldade.
4. Não repita nomes ou temas.

Responda EXATAMENTE com um JSON válido no seguinte formato:
{
  "sugestoes": [
    { "nome": "Título Temático da Unidade 1", "descricao": "Descrição clara dos objetivos e temas abordados." },
    { "nome": "Título Temático da Unidade 2", "descricao": "Descrição clara dos objetivos e temas abordados." },
    { "nome": "Título Temático da Unidade 3", "descricao": "Descrição clara dos objetivos e temas abordados." },
    { "nome": "Título Temático da Unidade 4", "descricao": "Descrição clara dos objetivos e temas abordados." }
  ]
}

Não inclua markdown ```json ... ```; responda apenas com o JSON puro.
"#;

const LESSON_PLAN_TEMPLATE: &str = r#"Você é um coordenador pedagógico experiente.
Crie um Plano de Aula detalhado e estruturado para a seguinte unidade:

Disciplina: "{disciplina}"
Série/Ano: "{serie_ano}"
Unidade: "{unidade}"
Descrição: "{descricao}"

Use o seguinte contexto (BNCC, CIEB, Lei de Educação Digital e pareceres) como base:
{context}

REGRAS:
1. Objetivos de aprendizagem alinhados à BNCC, com linguagem adequada à série.
2. Em "bncc", cite códigos e descrições reais das habilidades trabalhadas.
3. "estrategiasEnsino" é o passo a passo da aula, em ordem.
4. Não invente leis, autores ou materiais inexistentes.

Responda EXATAMENTE com um JSON válido no seguinte formato:
{
  "titulo": "Título da Aula",
  "duracao": "Duração estimada (ex: 2 aulas de 50 minutos)",
  "serieAno": "{serie_ano}",
  "objetivos": ["Objetivo de aprendizagem"],
  "conteudoProgramatico": ["Tópico do conteúdo"],
  "estrategiasEnsino": ["Passo da aula"],
  "bncc": ["Código - descrição da habilidade"],
  "avaliacao": "Como verificar o aprendizado",
  "recursos": ["Recurso didático necessário"],
  "referencias": ["Referência bibliográfica ou normativa"]
}

Não inclua markdown ```json ... ```; responda apenas com o JSON puro.
"#;

const SLIDES_TEMPLATE: &str = r#"Crie um roteiro de conteúdo para uma apresentação de slides educacional sobre: '{topic}'.
Série/Ano: {serie_ano}.
{tone}
A apresentação deve ter aproximadamente {slides_count} slides.
Use o seguinte contexto da BNCC/Currículo APENAS como base para o conteúdo pedagógico, mas NÃO inclua seções de metadados, alinhamento ou códigos da BNCC nos slides.
Contexto:
{context}

Gere APENAS o conteúdo dos slides (título e corpo). O foco deve ser puramente no assunto da aula.
Não mencione 'BNCC', 'Competências' ou 'Habilidades' no texto final."#;

/// Process-wide settings resolved once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub output_dir: PathBuf,
  pub curriculum_dir: Option<PathBuf>,
  pub presenton_api_key: Option<String>,
  pub presenton_base_url: String,
  pub slides_timeout_secs: u64,
  pub retrieval: RetrievalPolicies,
  pub prompts: Prompts,
}

impl Settings {
  /// Resolve settings from the environment and APP_CONFIG_PATH.
  /// Environment variables win over the file.
  pub fn from_env() -> Self {
    let file = load_file_config_from_env().unwrap_or_default();
    let env = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());

    Self {
      output_dir: env("OUTPUT_DIR")
        .map(PathBuf::from)
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from("output")),
      curriculum_dir: env("CURRICULUM_DIR").map(PathBuf::from).or(file.curriculum_dir),
      presenton_api_key: env("PRESENTON_API_KEY"),
      presenton_base_url: env("PRESENTON_BASE_URL")
        .unwrap_or_else(|| DEFAULT_PRESENTON_BASE_URL.into()),
      slides_timeout_secs: file.slides_timeout_secs,
      retrieval: file.retrieval,
      prompts: file.prompts,
    }
  }

  /// Defaults with every optional integration switched off.
  #[cfg(test)]
  pub fn for_tests(output_dir: PathBuf) -> Self {
    let file = FileConfig::default();
    Self {
      output_dir,
      curriculum_dir: None,
      presenton_api_key: None,
      presenton_base_url: DEFAULT_PRESENTON_BASE_URL.into(),
      slides_timeout_secs: file.slides_timeout_secs,
      retrieval: file.retrieval,
      prompts: file.prompts,
    }
  }
}

/// Load `FileConfig` from APP_CONFIG_PATH. On any IO/parse error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "edu_backend", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "edu_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
        None
      }
    },
    Err(e) => {
      error!(target: "edu_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: FileConfig = toml::from_str(
      r#"
        slides_timeout_secs = 30
        [retrieval]
        activity = "best_effort"
        [prompts]
        units_query = "unidades {disciplina}"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.slides_timeout_secs, 30);
    assert_eq!(cfg.retrieval.activity, RetrievalPolicy::BestEffort);
    assert_eq!(cfg.retrieval.units, RetrievalPolicy::BestEffort);
    assert_eq!(cfg.prompts.units_query, "unidades {disciplina}");
    assert!(cfg.prompts.activity_template.contains("{context}"));
  }

  #[test]
  fn activity_requires_index_by_default() {
    let p = RetrievalPolicies::default();
    assert_eq!(p.activity, RetrievalPolicy::Required);
    assert_eq!(p.lesson_plan, RetrievalPolicy::BestEffort);
  }
}
