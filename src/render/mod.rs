//! Document rendering.
//!
//! Artifacts are first turned into a `DocumentLayout` (see `layout`), a flat
//! list of blocks in display order. The PDF and DOCX backends walk the same
//! layout, so both formats always show the same sections.

use std::path::Path;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::DocFormat;
use crate::error::Result;

pub mod docx;
pub mod layout;
pub mod pdf;

/// One unit of content. Backends decide fonts and spacing.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
  /// Section label ("Objetivo:").
  Heading(String),
  /// Bold single line under the title (e.g. "Duração: 50 min").
  Meta(String),
  Paragraph(String),
  /// "- text"
  Bullet(String),
  /// "n. text"
  Numbered(usize, String),
  /// A multiple-choice alternative.
  Choice(String),
  /// Space for a handwritten answer.
  AnswerLine,
  Gap,
}

impl Block {
  /// Text as displayed, without backend styling.
  pub fn display_text(&self) -> String {
    match self {
      Block::Heading(s) | Block::Meta(s) | Block::Paragraph(s) | Block::Choice(s) => s.clone(),
      Block::Bullet(s) => format!("- {s}"),
      Block::Numbered(n, s) => format!("{n}. {s}"),
      Block::AnswerLine => "_".repeat(80),
      Block::Gap => String::new(),
    }
  }

  /// Stand-in used when the block itself cannot be laid out.
  pub fn placeholder(&self) -> String {
    match self {
      Block::Numbered(n, _) => format!("{n}."),
      _ => "-".into(),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentLayout {
  /// Top-of-page banner ("Atividade Educacional").
  pub header: String,
  /// Labeled blanks filled in by hand (school, student, date).
  pub blanks: Vec<String>,
  pub title: String,
  pub blocks: Vec<Block>,
}

/// Render `layout` into `dir` as `<prefix>_<uuid>.<ext>` and return the filename.
///
/// Blocking; call from `spawn_blocking` in async code. A failure may leave a
/// partially written file behind.
#[instrument(level = "info", skip(layout), fields(blocks = layout.blocks.len()))]
pub fn render_to_file(layout: &DocumentLayout, format: DocFormat, dir: &Path, prefix: &str) -> Result<String> {
  std::fs::create_dir_all(dir)?;
  let filename = format!("{}_{}.{}", prefix, Uuid::new_v4(), format.extension());
  let path = dir.join(&filename);

  match format {
    DocFormat::Pdf => pdf::write(layout, &path)?,
    DocFormat::Docx => docx::write(layout, &path)?,
  }

  info!(target: "render", %filename, "Document written");
  Ok(filename)
}
