//! LaTeX front-end
//!
//! Translation itself is delegated to the `latex2mathml` crate; this module
//! owns the preprocessing the engine needs around it: `\tag{…}` extraction
//! for the equation-number overlay, decimal-comma grouping, and the
//! substitutions that turn plain accent characters into their stretchy
//! combining forms.

use latex2mathml::{latex_to_mathml, DisplayStyle};

use crate::config::Config;
use crate::error::ParseError;

/// Splits a trailing `\tag{…}` out of a LaTeX expression.
///
/// Returns the expression without the directive and the tag's content,
/// with nested braces honored.
pub fn extract_tag(latex: &str) -> (String, Option<String>) {
  let Some(start) = latex.find("\\tag{") else {
    return (latex.to_string(), None);
  };
  let body_start = start + "\\tag{".len();
  let mut depth = 1usize;
  let mut end = None;
  for (idx, ch) in latex[body_start..].char_indices() {
    match ch {
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          end = Some(body_start + idx);
          break;
        }
      }
      _ => {}
    }
  }
  let Some(end) = end else {
    return (latex.to_string(), None);
  };
  let tag = latex[body_start..end].to_string();
  let mut stripped = String::with_capacity(latex.len());
  stripped.push_str(&latex[..start]);
  stripped.push_str(&latex[end + 1..]);
  (stripped.trim().to_string(), Some(tag))
}

/// Preprocessing applied before translation.
fn preprocess(latex: &str, config: &Config) -> String {
  let mut out = latex.replace("||", "\u{2016}");
  if config.decimal_separator == ',' {
    // Group digit,digit so the comma renders without trailing space.
    let chars: Vec<char> = out.chars().collect();
    let mut grouped = String::with_capacity(out.len() + 8);
    for (idx, ch) in chars.iter().enumerate() {
      let between_digits = *ch == ','
        && idx > 0
        && chars[idx - 1].is_ascii_digit()
        && chars.get(idx + 1).map(|c| c.is_ascii_digit()).unwrap_or(false);
      if between_digits {
        grouped.push_str("{,}");
      } else {
        grouped.push(*ch);
      }
    }
    out = grouped;
  }
  out
}

/// Converts LaTeX math to MathML.
///
/// The wide accent operators come back as the plain ASCII circumflex and
/// tilde; those are swapped for the stretchy combining forms so the
/// layout engine can grow them.
pub fn latex_to_mathml_str(
  latex: &str,
  inline: bool,
  config: &Config,
) -> Result<String, ParseError> {
  let prepared = preprocess(latex, config);
  let style = if inline {
    DisplayStyle::Inline
  } else {
    DisplayStyle::Block
  };
  let mathml = latex_to_mathml(&prepared, style).map_err(|e| ParseError::InvalidLatex {
    message: format!("{e:?}"),
  })?;
  let mathml = mathml
    .replace("<mo>^</mo>", "<mo>\u{0302}</mo>")
    .replace("<mo>&#x5E;</mo>", "<mo>\u{0302}</mo>")
    .replace("<mo>~</mo>", "<mo>\u{0303}</mo>")
    .replace("<mo>&#x7E;</mo>", "<mo>\u{0303}</mo>");
  Ok(mathml)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_simple_tag() {
    let (latex, tag) = extract_tag(r"E = mc^2 \tag{1a}");
    assert_eq!(latex, "E = mc^2");
    assert_eq!(tag.as_deref(), Some("1a"));
  }

  #[test]
  fn extracts_nested_braces() {
    let (latex, tag) = extract_tag(r"x \tag{a{b}c} + y");
    assert_eq!(latex, "x  + y".trim());
    assert_eq!(tag.as_deref(), Some("a{b}c"));
  }

  #[test]
  fn no_tag_passes_through() {
    let (latex, tag) = extract_tag("x + y");
    assert_eq!(latex, "x + y");
    assert!(tag.is_none());
  }

  #[test]
  fn unclosed_tag_left_alone() {
    let (latex, tag) = extract_tag(r"x \tag{oops");
    assert_eq!(latex, r"x \tag{oops");
    assert!(tag.is_none());
  }

  #[test]
  fn decimal_comma_groups_digits() {
    let mut config = Config::default();
    config.decimal_separator = ',';
    assert_eq!(preprocess("1,2", &config), "1{,}2");
    assert_eq!(preprocess("f(x, y)", &config), "f(x, y)");
    // Default separator leaves commas alone.
    config.decimal_separator = '.';
    assert_eq!(preprocess("1,2", &config), "1,2");
  }

  #[test]
  fn converts_simple_latex() {
    let config = Config::default();
    let mathml = latex_to_mathml_str(r"\frac{1}{2}", false, &config).expect("converts");
    assert!(mathml.contains("<mfrac>"));
    assert!(mathml.contains("<math"));
  }

  #[test]
  fn invalid_latex_is_a_parse_error() {
    let config = Config::default();
    let result = latex_to_mathml_str(r"\frac{1}{", false, &config);
    assert!(matches!(result, Err(ParseError::InvalidLatex { .. })));
  }
}
