use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Accents stripped, lowercased, trimmed.
pub fn normalize(text: &str) -> String {
  text
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .collect::<String>()
    .to_lowercase()
    .trim()
    .to_string()
}

/// Lowercased with runs of whitespace collapsed to one space.
pub fn collapse_whitespace(text: &str) -> String {
  text
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Every letter that follows a non-letter is uppercased, the rest lowercased.
///
/// `"rio de janeiro"` becomes `"Rio De Janeiro"`.
pub fn title_case(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut after_letter = false;
  for c in text.chars() {
    if c.is_alphabetic() {
      if after_letter {
        out.extend(c.to_lowercase());
      } else {
        out.extend(c.to_uppercase());
      }
      after_letter = true;
    } else {
      out.push(c);
      after_letter = false;
    }
  }
  out
}
