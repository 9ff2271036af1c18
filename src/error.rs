//! Error types for the math renderer
//!
//! This module provides error types for all subsystems:
//! - Parse errors (MathML/LaTeX input)
//! - Font errors (loading, missing MATH table, glyph lookup)
//! - Layout errors (degenerate geometry, unreachable stretch targets)
//! - Config errors (invalid lengths, unknown variants)
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
///
/// Each variant wraps a more specific error type for that subsystem.
/// Only parse and font errors at the document root are fatal to a render;
/// layout problems degrade output quality but never abort.
#[derive(Error, Debug)]
pub enum Error {
  /// MathML or LaTeX parsing error
  #[error("Parse error: {0}")]
  Parse(#[from] ParseError),

  /// Font loading or MATH table error
  #[error("Font error: {0}")]
  Font(#[from] FontError),

  /// Layout error
  #[error("Layout error: {0}")]
  Layout(#[from] LayoutError),

  /// Configuration error
  #[error("Config error: {0}")]
  Config(#[from] ConfigError),

  /// I/O error (file reading, stdin/stdout)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur while parsing MathML or LaTeX input
#[derive(Error, Debug, Clone)]
pub enum ParseError {
  /// Malformed XML in the MathML source
  #[error("Invalid MathML: {message}")]
  InvalidXml { message: String },

  /// The document root is not a recognized math element
  #[error("Expected <math> root element, found <{tag}>")]
  UnexpectedRoot { tag: String },

  /// LaTeX input could not be translated to MathML
  #[error("Invalid LaTeX: {message}")]
  InvalidLatex { message: String },
}

/// Errors that occur during font loading and MATH table access
#[derive(Error, Debug, Clone)]
pub enum FontError {
  /// Font file is invalid or corrupted
  #[error("Invalid font file: {reason}")]
  InvalidFontFile { reason: String },

  /// Font has no MATH table and cannot typeset math
  #[error("Font '{family}' has no MATH table")]
  MissingMathTable { family: String },

  /// No usable math font could be discovered on the system
  #[error("No font with a MATH table available")]
  NoMathFontAvailable,

  /// Glyph lookup failed for a required character
  #[error("Glyph not found for character U+{codepoint:04X}")]
  GlyphNotFound { codepoint: u32 },
}

/// Errors that occur during layout computation
///
/// These never abort a render; they are reported through `tracing` and the
/// layout falls back to a degraded result.
#[derive(Error, Debug, Clone)]
pub enum LayoutError {
  /// A stretchy operator could not reach its target extent
  #[error("Stretch target {target:.1} unreachable for U+{codepoint:04X}")]
  StretchUnreachable { codepoint: u32, target: f32 },

  /// Table rows/columns produced degenerate geometry
  #[error("Degenerate table geometry: {message}")]
  DegenerateTable { message: String },
}

/// Errors that occur while interpreting configuration or attributes
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
  /// A length string had an unrecognized unit or malformed number
  #[error("Invalid length '{value}'")]
  InvalidLength { value: String },

  /// Unknown mathvariant name
  #[error("Unknown mathvariant '{value}'")]
  UnknownVariant { value: String },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_error_display() {
    let error = ParseError::InvalidXml {
      message: "unexpected end of stream".to_string(),
    };
    assert!(format!("{}", error).contains("unexpected end of stream"));
  }

  #[test]
  fn parse_error_unexpected_root() {
    let error = ParseError::UnexpectedRoot {
      tag: "svg".to_string(),
    };
    assert!(format!("{}", error).contains("<svg>"));
  }

  #[test]
  fn font_error_display() {
    let error = FontError::MissingMathTable {
      family: "DejaVu Sans".to_string(),
    };
    assert!(format!("{}", error).contains("DejaVu Sans"));
  }

  #[test]
  fn font_error_glyph_not_found_hex() {
    let error = FontError::GlyphNotFound { codepoint: 0x222B };
    assert!(format!("{}", error).contains("222B"));
  }

  #[test]
  fn layout_error_display() {
    let error = LayoutError::StretchUnreachable {
      codepoint: 0x28,
      target: 120.5,
    };
    let display = format!("{}", error);
    assert!(display.contains("120.5"));
    assert!(display.contains("0028"));
  }

  #[test]
  fn config_error_display() {
    let error = ConfigError::InvalidLength {
      value: "12qq".to_string(),
    };
    assert!(format!("{}", error).contains("12qq"));
  }

  #[test]
  fn error_from_parse_error() {
    let parse: Error = ParseError::InvalidLatex {
      message: "unbalanced brace".to_string(),
    }
    .into();
    assert!(matches!(parse, Error::Parse(_)));
  }

  #[test]
  fn error_from_font_error() {
    let err: Error = FontError::NoMathFontAvailable.into();
    assert!(matches!(err, Error::Font(_)));
  }

  #[test]
  fn error_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
  }

  #[test]
  fn error_trait_implemented() {
    let error = Error::Other("test".to_string());
    let _: &dyn std::error::Error = &error;
  }
}
