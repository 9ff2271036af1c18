//! Math variant resolution and styled-character mapping
//!
//! MathML's `mathvariant` selects a typeface treatment (bold, italic,
//! script, fraktur, …). Math fonts encode these as separate codepoints in
//! the Unicode Mathematical Alphanumeric Symbols block, so styling a
//! character means remapping it before glyph lookup. A handful of styled
//! letters predate the block and live elsewhere in the BMP; those are
//! handled as exceptions.

/// Math variant requested by MathML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathVariant {
  Normal,
  Bold,
  Italic,
  BoldItalic,
  DoubleStruck,
  Script,
  BoldScript,
  Fraktur,
  BoldFraktur,
  SansSerif,
  SansSerifBold,
  SansSerifItalic,
  SansSerifBoldItalic,
  Monospace,
}

impl MathVariant {
  /// Parses a `mathvariant` attribute value.
  pub fn parse(value: &str) -> Option<MathVariant> {
    match value.trim().to_ascii_lowercase().as_str() {
      "normal" | "upright" => Some(MathVariant::Normal),
      "bold" => Some(MathVariant::Bold),
      "italic" | "oblique" => Some(MathVariant::Italic),
      "bold-italic" | "bold-oblique" => Some(MathVariant::BoldItalic),
      "double-struck" | "doublestruck" => Some(MathVariant::DoubleStruck),
      "script" => Some(MathVariant::Script),
      "bold-script" | "boldscript" => Some(MathVariant::BoldScript),
      "fraktur" => Some(MathVariant::Fraktur),
      "bold-fraktur" | "boldfraktur" => Some(MathVariant::BoldFraktur),
      "sans-serif" | "sansserif" => Some(MathVariant::SansSerif),
      "bold-sans-serif" | "sans-serif-bold" => Some(MathVariant::SansSerifBold),
      "sans-serif-italic" => Some(MathVariant::SansSerifItalic),
      "sans-serif-bold-italic" => Some(MathVariant::SansSerifBoldItalic),
      "monospace" | "typewriter" => Some(MathVariant::Monospace),
      _ => None,
    }
  }

  pub fn is_italic(self) -> bool {
    matches!(
      self,
      MathVariant::Italic
        | MathVariant::BoldItalic
        | MathVariant::SansSerifItalic
        | MathVariant::SansSerifBoldItalic
    )
  }

  pub fn is_bold(self) -> bool {
    matches!(
      self,
      MathVariant::Bold
        | MathVariant::BoldItalic
        | MathVariant::BoldScript
        | MathVariant::BoldFraktur
        | MathVariant::SansSerifBold
        | MathVariant::SansSerifBoldItalic
    )
  }

  /// The bold companion of this variant, used when an explicit `bold`
  /// request combines with an inherited styled variant.
  pub fn embolden(self) -> MathVariant {
    match self {
      MathVariant::Normal => MathVariant::Bold,
      MathVariant::Italic => MathVariant::BoldItalic,
      MathVariant::Script => MathVariant::BoldScript,
      MathVariant::Fraktur => MathVariant::BoldFraktur,
      MathVariant::SansSerif => MathVariant::SansSerifBold,
      MathVariant::SansSerifItalic => MathVariant::SansSerifBoldItalic,
      other => other,
    }
  }
}

/// Whether a character gets italic by default in a single-letter `<mi>`.
pub fn auto_italic(ch: char) -> bool {
  matches!(ch, 'A'..='Z' | 'a'..='z' | '\u{0391}'..='\u{03A9}' | '\u{03B1}'..='\u{03CF}')
}

// Block starts for each styled alphabet, per the Unicode Mathematical
// Alphanumeric Symbols chart. Zero means "leave the character alone".
const LATIN_CAP: u32 = 0x41;
const LATIN_SMALL: u32 = 0x61;
const GREEK_CAP: u32 = 0x391;
const GREEK_SMALL: u32 = 0x3B1;
const DIGIT: u32 = 0x30;

fn latin_cap_base(variant: MathVariant) -> u32 {
  match variant {
    MathVariant::Normal => 0,
    MathVariant::Bold => 0x1D400,
    MathVariant::Italic => 0x1D434,
    MathVariant::BoldItalic => 0x1D468,
    MathVariant::Script => 0x1D49C,
    MathVariant::BoldScript => 0x1D4D0,
    MathVariant::Fraktur => 0x1D504,
    MathVariant::DoubleStruck => 0x1D538,
    MathVariant::BoldFraktur => 0x1D56C,
    MathVariant::SansSerif => 0x1D5A0,
    MathVariant::SansSerifBold => 0x1D5D4,
    MathVariant::SansSerifItalic => 0x1D608,
    MathVariant::SansSerifBoldItalic => 0x1D63C,
    MathVariant::Monospace => 0x1D670,
  }
}

fn latin_small_base(variant: MathVariant) -> u32 {
  match variant {
    MathVariant::Normal => 0,
    MathVariant::Bold => 0x1D41A,
    MathVariant::Italic => 0x1D44E,
    MathVariant::BoldItalic => 0x1D482,
    MathVariant::Script => 0x1D4B6,
    MathVariant::BoldScript => 0x1D4EA,
    MathVariant::Fraktur => 0x1D51E,
    MathVariant::DoubleStruck => 0x1D552,
    MathVariant::BoldFraktur => 0x1D586,
    MathVariant::SansSerif => 0x1D5BA,
    MathVariant::SansSerifBold => 0x1D5EE,
    MathVariant::SansSerifItalic => 0x1D622,
    MathVariant::SansSerifBoldItalic => 0x1D656,
    MathVariant::Monospace => 0x1D68A,
  }
}

fn greek_cap_base(variant: MathVariant) -> u32 {
  match variant {
    MathVariant::Bold => 0x1D6A8,
    MathVariant::Italic => 0x1D6E2,
    MathVariant::BoldItalic => 0x1D71C,
    MathVariant::SansSerifBold => 0x1D756,
    MathVariant::SansSerifBoldItalic => 0x1D790,
    _ => 0,
  }
}

fn greek_small_base(variant: MathVariant) -> u32 {
  match variant {
    MathVariant::Bold => 0x1D6C2,
    MathVariant::Italic => 0x1D6FC,
    MathVariant::BoldItalic => 0x1D736,
    MathVariant::SansSerifBold => 0x1D770,
    MathVariant::SansSerifBoldItalic => 0x1D7AA,
    _ => 0,
  }
}

fn digit_base(variant: MathVariant) -> u32 {
  match variant {
    MathVariant::Bold | MathVariant::BoldItalic => 0x1D7CE,
    MathVariant::DoubleStruck => 0x1D7D8,
    MathVariant::SansSerif | MathVariant::SansSerifItalic => 0x1D7E2,
    MathVariant::SansSerifBold | MathVariant::SansSerifBoldItalic => 0x1D7EC,
    MathVariant::Monospace => 0x1D7F6,
    _ => 0,
  }
}

/// Symbols folded into the Greek styled ranges at offsets past omega.
fn greek_symbol_alias(ch: char) -> Option<u32> {
  match ch {
    '\u{03F4}' => Some(GREEK_CAP + 0x11),  // capital theta symbol
    '\u{2207}' => Some(GREEK_CAP + 0x19),  // nabla
    '\u{2202}' => Some(GREEK_SMALL + 0x19), // partial differential
    '\u{03F5}' => Some(GREEK_SMALL + 0x1A), // lunate epsilon
    '\u{03D1}' => Some(GREEK_SMALL + 0x1B), // theta symbol
    '\u{03F0}' => Some(GREEK_SMALL + 0x1C), // kappa symbol
    '\u{03D5}' => Some(GREEK_SMALL + 0x1D), // phi symbol
    '\u{03F1}' => Some(GREEK_SMALL + 0x1E), // rho symbol
    '\u{03D6}' => Some(GREEK_SMALL + 0x1F), // pi symbol
    _ => None,
  }
}

/// Styled letters that predate the Mathematical Alphanumeric block; the
/// arithmetic target is unassigned and the real character lives in the
/// Letterlike Symbols block.
fn reserved_exception(cp: u32) -> Option<char> {
  let ch = match cp {
    0x1D49D => '\u{212C}', // script B
    0x1D4A0 => '\u{2130}', // script E
    0x1D4A1 => '\u{2131}', // script F
    0x1D4A3 => '\u{210B}', // script H
    0x1D4A4 => '\u{2110}', // script I
    0x1D4A7 => '\u{2112}', // script L
    0x1D4A8 => '\u{2133}', // script M
    0x1D4AD => '\u{211B}', // script R
    0x1D506 => '\u{212D}', // fraktur C
    0x1D50B => '\u{210C}', // fraktur H
    0x1D50C => '\u{2111}', // fraktur I
    0x1D515 => '\u{211C}', // fraktur R
    0x1D51D => '\u{2128}', // fraktur Z
    0x1D53A => '\u{2102}', // double-struck C
    0x1D53F => '\u{210D}', // double-struck H
    0x1D545 => '\u{2115}', // double-struck N
    0x1D547 => '\u{2119}', // double-struck P
    0x1D548 => '\u{211A}', // double-struck Q
    0x1D549 => '\u{211D}', // double-struck R
    0x1D551 => '\u{2124}', // double-struck Z
    0x1D455 => '\u{210E}', // italic h
    0x1D4BA => '\u{212F}', // script e
    0x1D4BC => '\u{210A}', // script g
    0x1D4C4 => '\u{2134}', // script o
    _ => return None,
  };
  Some(ch)
}

/// Maps a character to its styled codepoint for the given variant.
///
/// Characters outside the Latin/Greek/digit ranges pass through unchanged;
/// callers fall back to the base codepoint if the font lacks the styled
/// glyph.
pub fn styled_char(ch: char, variant: MathVariant) -> char {
  if variant == MathVariant::Normal {
    return ch;
  }
  let cp = greek_symbol_alias(ch).unwrap_or(ch as u32);

  let (range_start, range_len, base) = if (LATIN_CAP..LATIN_CAP + 26).contains(&cp) {
    (LATIN_CAP, 26, latin_cap_base(variant))
  } else if (LATIN_SMALL..LATIN_SMALL + 26).contains(&cp) {
    (LATIN_SMALL, 26, latin_small_base(variant))
  } else if (GREEK_CAP..GREEK_CAP + 0x1A).contains(&cp) {
    (GREEK_CAP, 0x1A, greek_cap_base(variant))
  } else if (GREEK_SMALL..GREEK_SMALL + 0x20).contains(&cp) {
    (GREEK_SMALL, 0x20, greek_small_base(variant))
  } else if (DIGIT..DIGIT + 10).contains(&cp) {
    (DIGIT, 10, digit_base(variant))
  } else {
    return ch;
  };
  let _ = range_len;

  if base == 0 {
    return ch;
  }
  let styled = base + (cp - range_start);
  if let Some(exception) = reserved_exception(styled) {
    return exception;
  }
  char::from_u32(styled).unwrap_or(ch)
}

/// Applies [`styled_char`] across a string.
pub fn styled_str(text: &str, variant: MathVariant) -> String {
  text.chars().map(|ch| styled_char(ch, variant)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_variant_names() {
    assert_eq!(MathVariant::parse("bold"), Some(MathVariant::Bold));
    assert_eq!(
      MathVariant::parse("double-struck"),
      Some(MathVariant::DoubleStruck)
    );
    assert_eq!(
      MathVariant::parse("BOLD-ITALIC"),
      Some(MathVariant::BoldItalic)
    );
    assert_eq!(MathVariant::parse("wavy"), None);
  }

  #[test]
  fn italic_latin_letters() {
    assert_eq!(styled_char('x', MathVariant::Italic), '\u{1D465}');
    assert_eq!(styled_char('A', MathVariant::Italic), '\u{1D434}');
    assert_eq!(styled_char('z', MathVariant::Italic), '\u{1D467}');
  }

  #[test]
  fn bold_greek_letters() {
    assert_eq!(styled_char('\u{03B1}', MathVariant::Bold), '\u{1D6C2}');
    assert_eq!(styled_char('\u{0393}', MathVariant::Bold), '\u{1D6AA}');
  }

  #[test]
  fn reserved_letters_use_letterlike_block() {
    // Italic h is Planck's h, not in the styled block.
    assert_eq!(styled_char('h', MathVariant::Italic), '\u{210E}');
    assert_eq!(styled_char('R', MathVariant::DoubleStruck), '\u{211D}');
    assert_eq!(styled_char('H', MathVariant::Script), '\u{210B}');
    assert_eq!(styled_char('Z', MathVariant::Fraktur), '\u{2128}');
  }

  #[test]
  fn digits_only_style_where_defined() {
    assert_eq!(styled_char('3', MathVariant::Bold), '\u{1D7D1}');
    assert_eq!(styled_char('0', MathVariant::DoubleStruck), '\u{1D7D8}');
    // No italic digits exist.
    assert_eq!(styled_char('7', MathVariant::Italic), '7');
  }

  #[test]
  fn non_alphanumerics_pass_through() {
    assert_eq!(styled_char('+', MathVariant::Bold), '+');
    assert_eq!(styled_char('(', MathVariant::Italic), '(');
  }

  #[test]
  fn greek_symbol_aliases_map() {
    // nabla has a bold form at the end of the bold Greek caps run.
    assert_eq!(styled_char('\u{2207}', MathVariant::Bold), '\u{1D6C1}');
    // partial differential, italic
    assert_eq!(styled_char('\u{2202}', MathVariant::Italic), '\u{1D715}');
  }

  #[test]
  fn auto_italic_ranges() {
    assert!(auto_italic('x'));
    assert!(auto_italic('\u{03B1}'));
    assert!(!auto_italic('1'));
    assert!(!auto_italic('+'));
  }

  #[test]
  fn styled_str_maps_all_chars() {
    assert_eq!(styled_str("ab", MathVariant::Bold), "\u{1D41A}\u{1D41B}");
  }
}
