//! Small string helpers used across modules.

/// Replace occurrences of `{key}` in the template with the provided values.
/// No nesting or conditionals. Unknown placeholders are left as-is.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

/// Map text onto Latin-1, the only charset the built-in PDF fonts cover.
/// Common typographic punctuation gets an ASCII stand-in; everything else
/// outside the range becomes '?'.
pub fn to_latin1(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '\u{2018}' | '\u{2019}' | '\u{201A}' => out.push('\''),
      '\u{201C}' | '\u{201D}' | '\u{201E}' => out.push('"'),
      '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
      '\u{2026}' => out.push_str("..."),
      '\u{2022}' => out.push('-'),
      '\t' => out.push(' '),
      c if c == '\n' || ((c as u32) <= 0xFF && !c.is_control()) => out.push(c),
      _ => out.push('?'),
    }
  }
  out
}

/// Lowercase and drop the most common Portuguese diacritics so that
/// "Resolução" and "resolucao" compare equal.
pub fn fold_accents(s: &str) -> String {
  s.chars()
    .flat_map(|c| c.to_lowercase())
    .map(|c| match c {
      'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
      'é' | 'è' | 'ê' | 'ë' => 'e',
      'í' | 'ì' | 'î' | 'ï' => 'i',
      'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
      'ú' | 'ù' | 'û' | 'ü' => 'u',
      'ç' => 'c',
      other => other,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_named_placeholders() {
    let out = fill_template("{a} e {b} e {a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x e y e x");
    assert_eq!(fill_template("{missing}", &[]), "{missing}");
  }

  #[test]
  fn latin1_keeps_portuguese_accents() {
    assert_eq!(to_latin1("Questões de Matemática"), "Questões de Matemática");
  }

  #[test]
  fn latin1_replaces_what_it_cannot_encode() {
    assert_eq!(to_latin1("“Olá” — 🚀 ≥ 3…"), "\"Olá\" - ? ? 3...");
  }

  #[test]
  fn trunc_respects_char_boundaries() {
    let s = "ããããã";
    let t = trunc_for_log(s, 3);
    assert!(t.starts_with('ã'));
    assert!(t.ends_with("(10 bytes total)"));
  }

  #[test]
  fn folds_accents_and_case() {
    assert_eq!(fold_accents("Resolução PARECER"), "resolucao parecer");
  }
}
