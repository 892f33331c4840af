//! Curriculum document taxonomy.
//!
//! Every reference document is tagged with one category derived from its
//! filename. Retrieval filters on these tags.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  /// National curriculum standard (BNCC).
  Normativa,
  /// Support material and activity examples (CIEB).
  Apoio,
  /// Laws and resolutions.
  Legal,
  /// Pedagogical opinions (pareceres).
  Pedagogica,
  Geral,
}

impl Category {
  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Normativa => "normativa",
      Category::Apoio => "apoio",
      Category::Legal => "legal",
      Category::Pedagogica => "pedagogica",
      Category::Geral => "geral",
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      Category::Normativa => "Base Nacional Comum Curricular (competências e habilidades)",
      Category::Apoio => "Material de apoio e exemplos de atividades (CIEB)",
      Category::Legal => "Leis e resoluções sobre educação",
      Category::Pedagogica => "Pareceres e fundamentos pedagógicos",
      Category::Geral => "Documento geral",
    }
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// First match wins.
const RULES: &[(&str, Category)] = &[
  ("BNCC", Category::Normativa),
  ("CIEB", Category::Apoio),
  ("Lei", Category::Legal),
  ("Resolucao", Category::Legal),
  ("Resolução", Category::Legal),
  ("Parecer", Category::Pedagogica),
];

/// Map a document filename to its category. Unknown names fall back to `Geral`.
pub fn classify(filename: &str) -> Category {
  RULES
    .iter()
    .find(|(needle, _)| filename.contains(needle))
    .map(|(_, cat)| *cat)
    .unwrap_or(Category::Geral)
}
