//! DOCX backend: a minimal WordprocessingML package written with `zip`.
//!
//! Word handles Unicode natively, so text only needs XML escaping. Styles
//! `Title`, `Heading1` and `Heading2` are declared in `styles.xml`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::{Block, DocumentLayout};
use crate::error::{AppError, Result};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="48"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style></w:styles>"#;

const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

/// Escape XML special characters and drop characters XML 1.0 forbids.
fn xml_escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      '\t' | '\n' | '\r' => out.push(ch),
      c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
      c => out.push(c),
    }
  }
  out
}

#[derive(Default)]
struct Para<'a> {
  style: Option<&'a str>,
  bold: bool,
  indent_twips: Option<u32>,
}

fn paragraph(body: &mut String, p: Para<'_>, text: &str) {
  body.push_str("<w:p>");
  if p.style.is_some() || p.indent_twips.is_some() {
    body.push_str("<w:pPr>");
    if let Some(style) = p.style {
      body.push_str(&format!(r#"<w:pStyle w:val="{style}"/>"#));
    }
    if let Some(left) = p.indent_twips {
      body.push_str(&format!(r#"<w:ind w:left="{left}"/>"#));
    }
    body.push_str("</w:pPr>");
  }
  if !text.is_empty() {
    body.push_str("<w:r>");
    if p.bold {
      body.push_str("<w:rPr><w:b/></w:rPr>");
    }
    for (i, line) in text.split('\n').enumerate() {
      if i > 0 {
        body.push_str("<w:br/>");
      }
      body.push_str(r#"<w:t xml:space="preserve">"#);
      body.push_str(&xml_escape(line.trim_end_matches('\r')));
      body.push_str("</w:t>");
    }
    body.push_str("</w:r>");
  }
  body.push_str("</w:p>");
}

fn document_xml(layout: &DocumentLayout) -> String {
  let mut body = String::new();

  paragraph(&mut body, Para { style: Some("Title"), ..Default::default() }, &layout.header);
  paragraph(&mut body, Para::default(), &layout.blanks.join("\n"));
  paragraph(&mut body, Para { style: Some("Heading1"), ..Default::default() }, &layout.title);

  for block in &layout.blocks {
    let text = block.display_text();
    let p = match block {
      Block::Heading(_) => Para { style: Some("Heading2"), ..Default::default() },
      Block::Meta(_) => Para { bold: true, ..Default::default() },
      Block::Choice(_) => Para { indent_twips: Some(360), ..Default::default() },
      _ => Para::default(),
    };
    paragraph(&mut body, p, &text);
  }

  format!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}{SECTION}</w:body></w:document>"#
  )
}

pub fn write(layout: &DocumentLayout, path: &Path) -> Result<()> {
  let zerr = |e: zip::result::ZipError| AppError::Render(e.to_string());
  let parts = [
    ("[Content_Types].xml", CONTENT_TYPES.to_string()),
    ("_rels/.rels", ROOT_RELS.to_string()),
    ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
    ("word/styles.xml", STYLES.to_string()),
    ("word/document.xml", document_xml(layout)),
  ];

  let mut zip = zip::ZipWriter::new(File::create(path)?);
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
  for (name, content) in parts {
    zip.start_file(name, options).map_err(zerr)?;
    zip.write_all(content.as_bytes())?;
  }
  zip.finish().map_err(zerr)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Read;

  fn read_part(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut s = String::new();
    part.read_to_string(&mut s).unwrap();
    s
  }

  #[test]
  fn escapes_markup_and_drops_control_chars() {
    assert_eq!(xml_escape("a < b & \"c\"\u{0001}"), "a &lt; b &amp; &quot;c&quot;");
  }

  #[test]
  fn writes_a_valid_package_with_unicode_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.docx");
    let layout = DocumentLayout {
      header: "Atividade Educacional".into(),
      blanks: vec!["Escola: ___".into(), "Aluno: ___".into()],
      title: "Frações 🍕".into(),
      blocks: vec![
        Block::Heading("Questões:".into()),
        Block::Numbered(1, "Quanto é ½ + ½?".into()),
        Block::Choice("A) 1".into()),
      ],
    };
    write(&layout, &path).unwrap();

    let doc = read_part(&path, "word/document.xml");
    assert!(doc.contains("Frações 🍕"));
    assert!(doc.contains("1. Quanto é ½ + ½?"));
    assert!(doc.contains(r#"<w:pStyle w:val="Heading2"/>"#));
    assert!(doc.contains(r#"<w:ind w:left="360"/>"#));
    assert!(doc.contains("<w:br/>"));
    assert!(read_part(&path, "[Content_Types].xml").contains("wordprocessingml.document.main+xml"));
  }
}
