//! PDF backend (oxidize-pdf, built-in Helvetica, A4).
//!
//! The built-in fonts only cover Latin-1, so all text is transcoded first.
//! Lines are wrapped by an estimated glyph width and pages break
//! automatically. A block that still fails to draw is replaced by its
//! placeholder so the document always completes.

use std::path::Path;

use oxidize_pdf::{Document, Font, Page};
use tracing::warn;

use super::{Block, DocumentLayout};
use crate::error::{AppError, Result};
use crate::util::to_latin1;

const PAGE_W: f64 = 595.0;
const PAGE_H: f64 = 842.0;
const MARGIN: f64 = 50.0;
const TEXT_W: f64 = PAGE_W - 2.0 * MARGIN;
const INDENT: f64 = 14.0;

/// Average Helvetica advance as a fraction of the font size. Slightly
/// generous so wrapped lines never overflow the right margin.
const AVG_ADVANCE: f64 = 0.52;
const AVG_ADVANCE_BOLD: f64 = 0.56;

#[derive(Clone, Copy)]
struct Style {
  bold: bool,
  size: f64,
  leading: f64,
  indent: f64,
}

impl Style {
  const fn new(bold: bool, size: f64, leading: f64, indent: f64) -> Self {
    Self { bold, size, leading, indent }
  }

  fn font(&self) -> Font {
    if self.bold { Font::HelveticaBold } else { Font::Helvetica }
  }

  fn max_chars(&self) -> usize {
    let advance = if self.bold { AVG_ADVANCE_BOLD } else { AVG_ADVANCE };
    (((TEXT_W - self.indent) / (self.size * advance)).floor() as usize).max(1)
  }
}

const HEADER: Style = Style::new(true, 16.0, 24.0, 0.0);
const TITLE: Style = Style::new(true, 14.0, 20.0, 0.0);
const BODY: Style = Style::new(false, 12.0, 16.0, 0.0);
const SMALL: Style = Style::new(false, 11.0, 14.0, 0.0);
const CHOICE: Style = Style::new(false, 11.0, 14.0, INDENT);
const HEADING: Style = Style::new(true, 12.0, 18.0, 0.0);

struct Writer {
  doc: Document,
  page: Page,
  y: f64,
}

impl Writer {
  fn new(title: &str) -> Self {
    let mut doc = Document::new();
    doc.set_title(title);
    Self { doc, page: Page::a4(), y: PAGE_H - MARGIN }
  }

  fn break_page_if_needed(&mut self, needed: f64) {
    if self.y - needed < MARGIN {
      let full = std::mem::replace(&mut self.page, Page::a4());
      self.doc.add_page(full);
      self.y = PAGE_H - MARGIN;
    }
  }

  fn skip(&mut self, h: f64) {
    self.y -= h;
    self.break_page_if_needed(0.0);
  }

  fn line(&mut self, style: Style, x: f64, text: &str) -> std::result::Result<(), String> {
    self.break_page_if_needed(style.leading);
    self.y -= style.leading;
    if text.is_empty() {
      return Ok(());
    }
    self
      .page
      .text()
      .set_font(style.font(), style.size)
      .at(x, self.y)
      .write(text)
      .map(|_| ())
      .map_err(|e| e.to_string())
  }

  /// Wrapped, left-aligned text.
  fn paragraph(&mut self, style: Style, text: &str) -> std::result::Result<(), String> {
    for l in wrap(&to_latin1(text), style.max_chars()) {
      self.line(style, MARGIN + style.indent, &l)?;
    }
    Ok(())
  }

  /// Wrapped text, each line centered by its estimated width.
  fn centered(&mut self, style: Style, text: &str) -> std::result::Result<(), String> {
    let advance = style.size * AVG_ADVANCE_BOLD;
    for l in wrap(&to_latin1(text), style.max_chars()) {
      let w = l.chars().count() as f64 * advance;
      let x = (MARGIN + (TEXT_W - w) / 2.0).max(MARGIN);
      self.line(style, x, &l)?;
    }
    Ok(())
  }

  /// Draw a block, falling back to its placeholder if drawing fails.
  fn block(&mut self, block: &Block) {
    let style = match block {
      Block::Heading(_) | Block::Meta(_) => HEADING,
      Block::Paragraph(_) | Block::Numbered(..) => BODY,
      Block::Bullet(_) | Block::AnswerLine => SMALL,
      Block::Choice(_) => CHOICE,
      Block::Gap => {
        self.skip(8.0);
        return;
      }
    };
    if matches!(block, Block::Heading(_)) {
      self.skip(4.0);
    }
    if let Err(e) = self.paragraph(style, &block.display_text()) {
      warn!(target: "render", error = %e, "PDF block could not be laid out; using placeholder");
      if let Err(e) = self.line(style, MARGIN + style.indent, &block.placeholder()) {
        warn!(target: "render", error = %e, "PDF placeholder could not be laid out; skipping block");
      }
    }
  }

  fn finish(mut self, path: &Path) -> Result<()> {
    self.doc.add_page(self.page);
    self.doc.save(path).map_err(|e| AppError::Render(e.to_string()))
  }
}

pub fn write(layout: &DocumentLayout, path: &Path) -> Result<()> {
  let mut w = Writer::new(&to_latin1(&layout.title));

  w.centered(HEADER, &layout.header).map_err(AppError::Render)?;
  w.skip(12.0);
  for blank in &layout.blanks {
    w.paragraph(BODY, blank).map_err(AppError::Render)?;
    w.skip(4.0);
  }
  w.skip(12.0);

  if let Err(e) = w.centered(TITLE, &layout.title) {
    warn!(target: "render", error = %e, "PDF title could not be laid out; using placeholder");
    w.line(TITLE, MARGIN, "-").map_err(AppError::Render)?;
  }
  w.skip(8.0);

  for block in &layout.blocks {
    w.block(block);
  }

  w.finish(path)
}

/// Greedy word wrap to at most `max` chars per line. Words longer than a
/// line are split. Explicit newlines are kept.
fn wrap(text: &str, max: usize) -> Vec<String> {
  let mut out = Vec::new();
  for raw_line in text.split('\n') {
    let mut line = String::new();
    let mut len = 0usize;
    for word in raw_line.split_whitespace() {
      let chars: Vec<char> = word.chars().collect();
      for piece in chars.chunks(max) {
        let piece: String = piece.iter().collect();
        let plen = piece.chars().count();
        if len > 0 && len + 1 + plen > max {
          out.push(std::mem::take(&mut line));
          len = 0;
        }
        if len > 0 {
          line.push(' ');
          len += 1;
        }
        line.push_str(&piece);
        len += plen;
      }
    }
    out.push(line);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wraps_on_word_boundaries() {
    assert_eq!(wrap("um dois tres", 7), vec!["um dois", "tres"]);
  }

  #[test]
  fn splits_words_longer_than_a_line() {
    assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
  }

  #[test]
  fn keeps_explicit_newlines() {
    assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
  }

  #[test]
  fn line_capacity_is_positive() {
    assert!(BODY.max_chars() > 40);
    assert!(CHOICE.max_chars() < SMALL.max_chars() + 1);
  }

  #[test]
  fn hand_fill_blanks_fit_on_one_line() {
    // Underscore is among the widest glyphs in these lines (0.556 em in Helvetica).
    let fits = |line: &str| line.chars().count() as f64 * BODY.size * 0.556 <= TEXT_W;
    let activity = crate::render::layout::activity(&crate::domain::Activity::default());
    let plan = crate::render::layout::lesson_plan(&crate::domain::LessonPlan::default());
    for blank in activity.blanks.iter().chain(&plan.blanks) {
      assert!(blank.chars().count() <= BODY.max_chars(), "{blank}");
      assert!(fits(blank), "{blank}");
      assert_eq!(wrap(&to_latin1(blank), BODY.max_chars()).len(), 1, "{blank}");
    }
  }

  #[test]
  fn non_latin_text_still_produces_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.pdf");
    let layout = DocumentLayout {
      header: "Atividade Educacional".into(),
      blanks: vec![],
      title: "数学 🚀 “Frações”".into(),
      blocks: vec![
        Block::Paragraph("Ελληνικά и русский текст — 😀".into()),
        Block::Bullet("\u{0000}\u{0007} controle".into()),
        Block::Numbered(1, "x".repeat(5000)),
        Block::Choice("A) ≥ ≤ ∑".into()),
      ],
    };
    write(&layout, &path).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
  }

  #[test]
  fn long_documents_span_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.pdf");
    let layout = DocumentLayout {
      header: "Plano de Aula".into(),
      blanks: vec![],
      title: "Longo".into(),
      blocks: (1..=200).map(|i| Block::Numbered(i, format!("Passo número {i}"))).collect(),
    };
    write(&layout, &path).unwrap();
    assert!(path.exists());
  }
}
