//! Field-to-block mapping for each artifact. Empty fields are skipped.

use super::{Block, DocumentLayout};
use crate::domain::{Activity, LessonPlan, QuestionItem};

const SCHOOL_BLANK: &str = "Escola: _____________________________________________________________";
const DATE_BLANK: &str = "Data: ___/___/___";
const UNTITLED: &str = "Sem Título";

fn non_empty(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

fn bullets(blocks: &mut Vec<Block>, heading: &str, items: &[String]) {
  let items: Vec<&String> = items.iter().filter(|s| !s.trim().is_empty()).collect();
  if items.is_empty() {
    return;
  }
  blocks.push(Block::Heading(heading.into()));
  blocks.extend(items.into_iter().map(|s| Block::Bullet(s.clone())));
  blocks.push(Block::Gap);
}

fn paragraph(blocks: &mut Vec<Block>, heading: &str, text: Option<&str>) {
  if let Some(text) = non_empty(text) {
    blocks.push(Block::Heading(heading.into()));
    blocks.push(Block::Paragraph(text.to_string()));
    blocks.push(Block::Gap);
  }
}

pub fn activity(a: &Activity) -> DocumentLayout {
  let mut blocks = Vec::new();

  paragraph(&mut blocks, "Objetivo:", Some(&a.objective));
  bullets(&mut blocks, "Habilidades BNCC:", &a.bncc_skills);
  paragraph(&mut blocks, "Texto de Apoio:", Some(&a.content));

  if !a.questions.is_empty() {
    blocks.push(Block::Heading("Questões:".into()));
    for (i, q) in a.questions.iter().enumerate() {
      let n = i + 1;
      match q {
        QuestionItem::Choice(q) => {
          blocks.push(Block::Numbered(n, q.enunciado.clone()));
          blocks.extend(q.alternativas.iter().map(|alt| Block::Choice(alt.clone())));
        }
        QuestionItem::Open(text) => {
          blocks.push(Block::Numbered(n, text.clone()));
          blocks.push(Block::AnswerLine);
        }
      }
      blocks.push(Block::Gap);
    }
  }

  DocumentLayout {
    header: "Atividade Educacional".into(),
    blanks: vec![
      SCHOOL_BLANK.into(),
      format!("Aluno: ____________________________________________ {DATE_BLANK}"),
    ],
    title: non_empty(a.title.as_deref()).unwrap_or(UNTITLED).to_string(),
    blocks,
  }
}

pub fn lesson_plan(p: &LessonPlan) -> DocumentLayout {
  let mut blocks = Vec::new();

  if let Some(s) = non_empty(p.serie_ano.as_deref()) {
    blocks.push(Block::Meta(format!("Série/Ano: {s}")));
  }
  if let Some(d) = non_empty(p.duracao.as_deref()) {
    blocks.push(Block::Meta(format!("Duração: {d}")));
  }
  if !blocks.is_empty() {
    blocks.push(Block::Gap);
  }

  bullets(&mut blocks, "Objetivos de Aprendizagem:", &p.objetivos);
  bullets(&mut blocks, "Conteúdo Programático:", &p.conteudo_programatico);
  bullets(&mut blocks, "Habilidades BNCC / CIEB:", &p.bncc);

  let steps: Vec<&String> = p.estrategias_ensino.iter().filter(|s| !s.trim().is_empty()).collect();
  if !steps.is_empty() {
    blocks.push(Block::Heading("Estratégias de Ensino:".into()));
    blocks.extend(steps.into_iter().enumerate().map(|(i, s)| Block::Numbered(i + 1, s.clone())));
    blocks.push(Block::Gap);
  }

  bullets(&mut blocks, "Recursos Didáticos:", &p.recursos);
  paragraph(&mut blocks, "Avaliação:", p.avaliacao.as_deref());
  bullets(&mut blocks, "Referências:", &p.referencias);

  DocumentLayout {
    header: "Plano de Aula".into(),
    blanks: vec![
      SCHOOL_BLANK.into(),
      format!("Professor(a): _____________________________________ {DATE_BLANK}"),
    ],
    title: non_empty(p.titulo.as_deref()).unwrap_or(UNTITLED).to_string(),
    blocks,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Question;

  fn headings(l: &DocumentLayout) -> Vec<String> {
    l.blocks
      .iter()
      .filter_map(|b| match b {
        Block::Heading(h) => Some(h.clone()),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn empty_activity_has_only_scaffold() {
    let l = activity(&Activity::default());
    assert_eq!(l.title, "Sem Título");
    assert_eq!(l.blanks.len(), 2);
    assert!(l.blocks.is_empty());
  }

  #[test]
  fn activity_sections_in_order() {
    let a = Activity {
      title: Some("Frações no dia a dia".into()),
      objective: "Comparar frações.".into(),
      bncc_skills: vec!["EF06MA07".into()],
      content: "Maria dividiu uma pizza em 8 pedaços.".into(),
      questions: vec![
        QuestionItem::Choice(Question {
          enunciado: "Segundo o texto, em quantos pedaços?".into(),
          alternativas: vec!["A) 4".into(), "B) 8".into()],
          correta: "B".into(),
        }),
        QuestionItem::Open("Explique o que é numerador.".into()),
      ],
    };
    let l = activity(&a);
    assert_eq!(headings(&l), vec!["Objetivo:", "Habilidades BNCC:", "Texto de Apoio:", "Questões:"]);
    assert!(l.blocks.contains(&Block::Numbered(1, "Segundo o texto, em quantos pedaços?".into())));
    assert!(l.blocks.contains(&Block::Choice("B) 8".into())));
    assert!(l.blocks.contains(&Block::Numbered(2, "Explique o que é numerador.".into())));
    assert!(l.blocks.contains(&Block::AnswerLine));
  }

  #[test]
  fn support_text_section_skipped_when_empty() {
    let a = Activity { objective: "x".into(), ..Default::default() };
    assert_eq!(headings(&activity(&a)), vec!["Objetivo:"]);
  }

  #[test]
  fn lesson_plan_sections_in_order() {
    let p = LessonPlan {
      titulo: Some("Aula de Teste".into()),
      duracao: Some("50 min".into()),
      serie_ano: Some("5º Ano".into()),
      objetivos: vec!["Objetivo 1".into(), "Objetivo 2".into()],
      conteudo_programatico: vec!["Conteúdo 1".into()],
      estrategias_ensino: vec!["Passo 1".into(), "Passo 2".into()],
      bncc: vec!["Habilidade 1".into()],
      avaliacao: Some("Teste de avaliação".into()),
      recursos: vec!["Recurso 1".into()],
      referencias: vec!["Ref 1".into()],
      ..Default::default()
    };
    let l = lesson_plan(&p);
    assert_eq!(l.header, "Plano de Aula");
    assert_eq!(l.blocks[0], Block::Meta("Série/Ano: 5º Ano".into()));
    assert_eq!(l.blocks[1], Block::Meta("Duração: 50 min".into()));
    assert_eq!(
      headings(&l),
      vec![
        "Objetivos de Aprendizagem:",
        "Conteúdo Programático:",
        "Habilidades BNCC / CIEB:",
        "Estratégias de Ensino:",
        "Recursos Didáticos:",
        "Avaliação:",
        "Referências:",
      ]
    );
    assert!(l.blocks.contains(&Block::Numbered(2, "Passo 2".into())));
  }

  #[test]
  fn blank_list_items_are_ignored() {
    let p = LessonPlan { objetivos: vec!["  ".into()], ..Default::default() };
    assert!(lesson_plan(&p).blocks.is_empty());
  }
}
