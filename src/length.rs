//! Length and unit parsing for MathML attributes
//!
//! Lengths appear in `mspace` widths, `mpadded` adjustments, `linethickness`
//! and the numbering column width. Units resolve against the current font
//! size (`em`, `ex`, `mu`) or are absolute (`px`, `pt`, `mm`, `cm`, `in`,
//! `pc`, `bp`, `dd`). MathML also allows named space widths like
//! `thinmathspace`, all multiples of 1/18 em.

use crate::error::ConfigError;

/// CSS pixels per typographic point, the conversion every absolute unit
/// funnels through. Output coordinates are in px.
const PX_PER_PT: f32 = 96.0 / 72.0;

/// A parsed length with its unit still attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
  Em(f32),
  Ex(f32),
  /// Math units, 18 mu = 1 em at the current size.
  Mu(f32),
  Px(f32),
  /// Percentage of a context-supplied reference value.
  Percent(f32),
}

impl Length {
  /// Resolves to px. `font_size` is the current glyph size in px and
  /// `x_height` the font's x-height at that size.
  pub fn resolve(self, font_size: f32, x_height: f32) -> f32 {
    match self {
      Length::Em(v) => v * font_size,
      Length::Ex(v) => v * x_height,
      Length::Mu(v) => v / 18.0 * font_size,
      Length::Px(v) => v,
      Length::Percent(v) => v / 100.0 * font_size,
    }
  }

  /// Resolves a percentage against an explicit reference instead of the
  /// font size. Non-percentage lengths ignore the reference.
  pub fn resolve_against(self, reference: f32, font_size: f32, x_height: f32) -> f32 {
    match self {
      Length::Percent(v) => v / 100.0 * reference,
      other => other.resolve(font_size, x_height),
    }
  }
}

/// Named MathML space widths in ems. Negative variants shift content left.
fn named_space_ems(name: &str) -> Option<f32> {
  let ems = match name {
    "veryverythinmathspace" => 1.0 / 18.0,
    "verythinmathspace" => 2.0 / 18.0,
    "thinmathspace" => 3.0 / 18.0,
    "mediummathspace" => 4.0 / 18.0,
    "thickmathspace" => 5.0 / 18.0,
    "verythickmathspace" => 6.0 / 18.0,
    "veryverythickmathspace" => 7.0 / 18.0,
    "negativeveryverythinmathspace" => -1.0 / 18.0,
    "negativeverythinmathspace" => -2.0 / 18.0,
    "negativethinmathspace" => -3.0 / 18.0,
    "negativemediummathspace" => -4.0 / 18.0,
    "negativethickmathspace" => -5.0 / 18.0,
    "negativeverythickmathspace" => -6.0 / 18.0,
    "negativeveryverythickmathspace" => -7.0 / 18.0,
    _ => return None,
  };
  Some(ems)
}

/// Parses a MathML length string.
///
/// Accepts a bare number (interpreted as ems, matching the original
/// behavior for operator spacing attributes), any recognized unit suffix,
/// a percentage, or a named math space.
pub fn parse_length(value: &str) -> Result<Length, ConfigError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(ConfigError::InvalidLength {
      value: value.to_string(),
    });
  }

  if let Some(ems) = named_space_ems(trimmed) {
    return Ok(Length::Em(ems));
  }

  // Split the numeric prefix from the unit suffix.
  let mut end = 0;
  for (idx, ch) in trimmed.char_indices() {
    if matches!(ch, '0'..='9' | '+' | '-' | '.') {
      end = idx + ch.len_utf8();
    } else {
      break;
    }
  }
  let number: f32 = trimmed[..end].parse().map_err(|_| ConfigError::InvalidLength {
    value: value.to_string(),
  })?;
  let unit = trimmed[end..].trim();

  let length = match unit {
    "" | "em" => Length::Em(number),
    "ex" => Length::Ex(number),
    "mu" => Length::Mu(number),
    "px" => Length::Px(number),
    "pt" => Length::Px(number * PX_PER_PT),
    "in" => Length::Px(number * 96.0),
    "cm" => Length::Px(number * 96.0 / 2.54),
    "mm" => Length::Px(number * 96.0 / 25.4),
    "pc" => Length::Px(number * 16.0),
    // big point: 1/72 in exactly
    "bp" => Length::Px(number * 96.0 / 72.0),
    // didot point: 1238/1157 pt
    "dd" => Length::Px(number * 1238.0 / 1157.0 * PX_PER_PT),
    "%" => Length::Percent(number),
    _ => {
      return Err(ConfigError::InvalidLength {
        value: value.to_string(),
      })
    }
  };
  Ok(length)
}

/// Parses an operator-spacing attribute value into mu.
///
/// Spacing attributes accept named spaces, em values, and bare numbers
/// (treated as ems).
pub fn parse_space_mu(value: &str) -> Option<f32> {
  let trimmed = value.trim();
  if let Some(ems) = named_space_ems(trimmed) {
    return Some(ems * 18.0);
  }
  match parse_length(trimmed).ok()? {
    Length::Em(v) => Some(v * 18.0),
    Length::Mu(v) => Some(v),
    _ => None,
  }
}
