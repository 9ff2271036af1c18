//! Math font loading and OpenType MATH table access
//!
//! [`MathFont`] owns the raw font bytes, validates the `MATH` table at load
//! time and snapshots the constants record once (layout code reads the
//! record, never the table). [`MathFace`] borrows one parsed face for the
//! duration of a render and answers every per-glyph question the layout
//! engine asks: advances, bounding boxes, italic correction, top-accent
//! attachment, extended-shape coverage, corner kerning, size variants,
//! assemblies and SVG outlines.
//!
//! All oracle values are in font design units; layout scales them by the
//! current em scale.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use rustybuzz::ttf_parser;
use ttf_parser::math::MathValue;
use ttf_parser::GlyphId;

use crate::error::FontError;

mod constants;
pub use constants::MathConstants;

/// Anything the SVG serializer can pull glyph outlines from. Math and
/// prose faces both implement this; fragments refer to their source by
/// `key`.
pub trait GlyphSource {
  fn key(&self) -> u32;
  fn units_per_em(&self) -> f32;
  fn outline(&self, glyph_id: u16, precision: usize) -> Option<String>;
}

/// Corner of a glyph for math kerning lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernCorner {
  TopRight,
  TopLeft,
  BottomRight,
  BottomLeft,
}

/// Bounding box of a glyph in design units, y-up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphBounds {
  pub x_min: f32,
  pub x_max: f32,
  pub y_min: f32,
  pub y_max: f32,
}

/// Everything the layout engine needs to know about one glyph, fetched in
/// a single call so the script-placement math reads like the formulas.
#[derive(Debug, Clone, Copy)]
pub struct GlyphMetrics {
  pub id: u16,
  pub advance: f32,
  pub bounds: GlyphBounds,
  pub italic_correction: f32,
  pub top_accent_attachment: Option<f32>,
  pub extended_shape: bool,
}

/// One part of a glyph assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyPart {
  pub glyph_id: u16,
  pub is_extender: bool,
  pub start_connector: f32,
  pub end_connector: f32,
  pub full_advance: f32,
}

/// A precomputed size variant of a stretchable glyph.
#[derive(Debug, Clone, Copy)]
pub struct SizeVariant {
  pub glyph_id: u16,
  pub advance: f32,
}

/// Variant list plus optional assembly recipe for one glyph/orientation.
#[derive(Debug, Clone, Default)]
pub struct GlyphConstruction {
  pub variants: Vec<SizeVariant>,
  pub assembly: Vec<AssemblyPart>,
}

fn id_counter() -> &'static AtomicU32 {
  static COUNTER: AtomicU32 = AtomicU32::new(0);
  &COUNTER
}

/// A loaded OpenType font with a MATH table.
pub struct MathFont {
  data: Vec<u8>,
  index: u32,
  /// Process-unique key for SVG symbol ids when several fonts mix.
  key: u32,
  family: String,
  units_per_em: f32,
  constants: MathConstants,
}

impl MathFont {
  /// Loads a font from raw bytes, requiring a MATH table.
  pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self, FontError> {
    let face = ttf_parser::Face::parse(&data, index).map_err(|e| FontError::InvalidFontFile {
      reason: e.to_string(),
    })?;
    let family = face
      .names()
      .into_iter()
      .find(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
      .and_then(|n| n.to_string())
      .unwrap_or_default();
    let math = face.tables().math.ok_or_else(|| FontError::MissingMathTable {
      family: family.clone(),
    })?;
    let constants = MathConstants::from_table(&math).ok_or_else(|| FontError::MissingMathTable {
      family: family.clone(),
    })?;
    let units_per_em = face.units_per_em() as f32;
    drop(face);
    Ok(Self {
      data,
      index,
      key: id_counter().fetch_add(1, Ordering::Relaxed),
      family,
      units_per_em,
      constants,
    })
  }

  /// Loads a font file from disk.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
    let data = std::fs::read(path.as_ref()).map_err(|e| FontError::InvalidFontFile {
      reason: format!("{}: {e}", path.as_ref().display()),
    })?;
    Self::from_data(data, 0)
  }

  /// Discovers an installed math font.
  ///
  /// Queries the system font database for well-known MATH font families,
  /// then falls back to scanning every face for a MATH table. Container
  /// environments without fontconfig still get the path probe below.
  pub fn discover_default() -> Result<Self, FontError> {
    const FAMILIES: &[&str] = &[
      "STIX Two Math",
      "STIXTwoMath",
      "Latin Modern Math",
      "TeX Gyre Termes Math",
      "TeX Gyre Pagella Math",
      "XITS Math",
      "Asana Math",
      "Cambria Math",
      "Noto Sans Math",
      "DejaVu Math TeX Gyre",
      "Libertinus Math",
      "Fira Math",
    ];
    const FALLBACK_PATHS: &[&str] = &[
      "/usr/share/fonts/opentype/stix-word/STIXTwoMath-Regular.otf",
      "/usr/share/fonts/truetype/stix-word/STIXTwoMath-Regular.ttf",
      "/usr/share/fonts/opentype/lmodern/latinmodern-math.otf",
      "/usr/share/texmf/fonts/opentype/public/lm-math/latinmodern-math.otf",
      "/usr/share/fonts/truetype/dejavu/DejaVuMathTeXGyre.ttf",
    ];

    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    for family in FAMILIES.iter().copied() {
      let query = fontdb::Query {
        families: &[fontdb::Family::Name(family)],
        ..fontdb::Query::default()
      };
      if let Some(id) = db.query(&query) {
        if let Some(font) = db
          .with_face_data(id, |data, index| Self::from_data(data.to_vec(), index).ok())
          .flatten()
        {
          return Ok(font);
        }
      }
    }
    for path in FALLBACK_PATHS {
      if let Ok(data) = std::fs::read(path) {
        if let Ok(font) = Self::from_data(data, 0) {
          return Ok(font);
        }
      }
    }
    // Last resort: any installed face with a MATH table.
    for info in db.faces() {
      if let Some(font) = db
        .with_face_data(info.id, |data, index| Self::from_data(data.to_vec(), index).ok())
        .flatten()
      {
        return Ok(font);
      }
    }
    Err(FontError::NoMathFontAvailable)
  }

  pub fn family(&self) -> &str {
    &self.family
  }

  pub fn units_per_em(&self) -> f32 {
    self.units_per_em
  }

  pub fn constants(&self) -> &MathConstants {
    &self.constants
  }

  pub(crate) fn key(&self) -> u32 {
    self.key
  }

  /// Parses the face for one render.
  pub fn face(&self) -> Result<MathFace<'_>, FontError> {
    MathFace::new(self)
  }
}

impl std::fmt::Debug for MathFont {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MathFont")
      .field("family", &self.family)
      .field("units_per_em", &self.units_per_em)
      .finish()
  }
}

/// A parsed face borrowed from a [`MathFont`] for the duration of a render.
pub struct MathFace<'a> {
  font: &'a MathFont,
  face: ttf_parser::Face<'a>,
  math: ttf_parser::math::Table<'a>,
}

impl<'a> MathFace<'a> {
  fn new(font: &'a MathFont) -> Result<Self, FontError> {
    let face =
      ttf_parser::Face::parse(&font.data, font.index).map_err(|e| FontError::InvalidFontFile {
        reason: e.to_string(),
      })?;
    let math = face.tables().math.ok_or_else(|| FontError::MissingMathTable {
      family: font.family.clone(),
    })?;
    Ok(Self { font, math, face })
  }

  pub fn font(&self) -> &'a MathFont {
    self.font
  }

  pub fn units_per_em(&self) -> f32 {
    self.font.units_per_em
  }

  pub fn ascender(&self) -> f32 {
    self.face.ascender() as f32
  }

  pub fn descender(&self) -> f32 {
    self.face.descender() as f32
  }

  pub fn x_height(&self) -> f32 {
    self
      .face
      .x_height()
      .map(|v| v as f32)
      .unwrap_or(self.font.units_per_em * 0.5)
  }

  /// Glyph id for a character, if the font covers it.
  pub fn glyph_index(&self, ch: char) -> Option<u16> {
    self.face.glyph_index(ch).map(|g| g.0)
  }

  pub fn advance(&self, glyph_id: u16) -> f32 {
    self
      .face
      .glyph_hor_advance(GlyphId(glyph_id))
      .map(|v| v as f32)
      .unwrap_or(0.0)
  }

  pub fn bounds(&self, glyph_id: u16) -> GlyphBounds {
    match self.face.glyph_bounding_box(GlyphId(glyph_id)) {
      Some(rect) => GlyphBounds {
        x_min: rect.x_min as f32,
        x_max: rect.x_max as f32,
        y_min: rect.y_min as f32,
        y_max: rect.y_max as f32,
      },
      None => GlyphBounds::default(),
    }
  }

  fn math_value(value: Option<MathValue>) -> f32 {
    value.map(|v| v.value as f32).unwrap_or(0.0)
  }

  pub fn italic_correction(&self, glyph_id: u16) -> f32 {
    Self::math_value(
      self
        .math
        .glyph_info
        .and_then(|info| info.italic_corrections)
        .and_then(|values| values.get(GlyphId(glyph_id))),
    )
  }

  pub fn top_accent_attachment(&self, glyph_id: u16) -> Option<f32> {
    self
      .math
      .glyph_info
      .and_then(|info| info.top_accent_attachments)
      .and_then(|values| values.get(GlyphId(glyph_id)))
      .map(|v| v.value as f32)
  }

  /// Whether the glyph is in the extended-shape coverage (tall shapes whose
  /// superscripts attach near the top rather than at the nominal shift).
  pub fn is_extended_shape(&self, glyph_id: u16) -> bool {
    self
      .math
      .glyph_info
      .and_then(|info| info.extended_shapes)
      .and_then(|coverage| coverage.get(GlyphId(glyph_id)))
      .is_some()
  }

  /// Kerning adjustment at `height` (design units from the baseline) for
  /// one corner of the glyph. Zero when the font has no entry.
  pub fn kern_at_height(&self, glyph_id: u16, corner: KernCorner, height: f32) -> f32 {
    let Some(kerns) = self
      .math
      .glyph_info
      .and_then(|info| info.kern_infos)
      .and_then(|infos| infos.get(GlyphId(glyph_id)))
    else {
      return 0.0;
    };
    let kern = match corner {
      KernCorner::TopRight => kerns.top_right,
      KernCorner::TopLeft => kerns.top_left,
      KernCorner::BottomRight => kerns.bottom_right,
      KernCorner::BottomLeft => kerns.bottom_left,
    };
    let Some(kern) = kern else {
      return 0.0;
    };
    let mut i = 0u16;
    while i < kern.count() {
      match kern.height(i) {
        Some(h) if height > h.value as f32 => i += 1,
        _ => break,
      }
    }
    kern.kern(i).map(|v| v.value as f32).unwrap_or(0.0)
  }

  /// Full metrics record for one glyph.
  pub fn glyph_metrics(&self, glyph_id: u16) -> GlyphMetrics {
    GlyphMetrics {
      id: glyph_id,
      advance: self.advance(glyph_id),
      bounds: self.bounds(glyph_id),
      italic_correction: self.italic_correction(glyph_id),
      top_accent_attachment: self.top_accent_attachment(glyph_id),
      extended_shape: self.is_extended_shape(glyph_id),
    }
  }

  /// Minimum connector overlap for assemblies, in design units.
  pub fn min_connector_overlap(&self) -> f32 {
    self
      .math
      .variants
      .map(|variants| variants.min_connector_overlap as f32)
      .unwrap_or(0.0)
  }

  /// Size variants and assembly recipe for a glyph in one orientation.
  pub fn construction(&self, glyph_id: u16, vertical: bool) -> Option<GlyphConstruction> {
    let variants = self.math.variants?;
    let construction = if vertical {
      variants.vertical_constructions.get(GlyphId(glyph_id))?
    } else {
      variants.horizontal_constructions.get(GlyphId(glyph_id))?
    };
    let mut out = GlyphConstruction::default();
    for variant in construction.variants {
      out.variants.push(SizeVariant {
        glyph_id: variant.variant_glyph.0,
        advance: variant.advance_measurement as f32,
      });
    }
    if let Some(assembly) = construction.assembly {
      for part in assembly.parts {
        out.assembly.push(AssemblyPart {
          glyph_id: part.glyph_id.0,
          is_extender: part.part_flags.extender(),
          start_connector: part.start_connector_length as f32,
          end_connector: part.end_connector_length as f32,
          full_advance: part.full_advance as f32,
        });
      }
    }
    Some(out)
  }

  /// Extracts the glyph outline as SVG path data in design units with the
  /// y axis already flipped to SVG's y-down convention, so a positive
  /// uniform scale places it.
  pub fn outline(&self, glyph_id: u16, precision: usize) -> Option<String> {
    let mut builder = SvgPathBuilder::new(precision);
    self.face.outline_glyph(GlyphId(glyph_id), &mut builder)?;
    if builder.path.is_empty() {
      return None;
    }
    Some(builder.path)
  }
}

impl GlyphSource for MathFace<'_> {
  fn key(&self) -> u32 {
    self.font.key
  }

  fn units_per_em(&self) -> f32 {
    self.font.units_per_em
  }

  fn outline(&self, glyph_id: u16, precision: usize) -> Option<String> {
    MathFace::outline(self, glyph_id, precision)
  }
}

/// A prose font for mixed text mode. No MATH table required.
pub struct TextFont {
  data: Vec<u8>,
  index: u32,
  key: u32,
  family: String,
  units_per_em: f32,
}

impl TextFont {
  pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self, FontError> {
    let face = ttf_parser::Face::parse(&data, index).map_err(|e| FontError::InvalidFontFile {
      reason: e.to_string(),
    })?;
    let family = face
      .names()
      .into_iter()
      .find(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
      .and_then(|n| n.to_string())
      .unwrap_or_default();
    let units_per_em = face.units_per_em() as f32;
    drop(face);
    Ok(Self {
      data,
      index,
      key: id_counter().fetch_add(1, Ordering::Relaxed),
      family,
      units_per_em,
    })
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
    let data = std::fs::read(path.as_ref()).map_err(|e| FontError::InvalidFontFile {
      reason: format!("{}: {e}", path.as_ref().display()),
    })?;
    Self::from_data(data, 0)
  }

  pub fn family(&self) -> &str {
    &self.family
  }

  pub fn units_per_em(&self) -> f32 {
    self.units_per_em
  }

  pub(crate) fn key(&self) -> u32 {
    self.key
  }

  pub fn face(&self) -> Result<TextFace<'_>, FontError> {
    let ttf =
      ttf_parser::Face::parse(&self.data, self.index).map_err(|e| FontError::InvalidFontFile {
        reason: e.to_string(),
      })?;
    let buzz = rustybuzz::Face::from_slice(&self.data, self.index).ok_or_else(|| {
      FontError::InvalidFontFile {
        reason: "unshapeable font".to_string(),
      }
    })?;
    Ok(TextFace {
      font: self,
      ttf,
      buzz,
    })
  }
}

/// A parsed prose face: ttf-parser for metrics and outlines, rustybuzz
/// for shaping.
pub struct TextFace<'a> {
  font: &'a TextFont,
  ttf: ttf_parser::Face<'a>,
  pub(crate) buzz: rustybuzz::Face<'a>,
}

impl<'a> TextFace<'a> {
  pub fn ascender(&self) -> f32 {
    self.ttf.ascender() as f32
  }

  pub fn descender(&self) -> f32 {
    self.ttf.descender() as f32
  }
}

impl GlyphSource for TextFace<'_> {
  fn key(&self) -> u32 {
    self.font.key
  }

  fn units_per_em(&self) -> f32 {
    self.font.units_per_em
  }

  fn outline(&self, glyph_id: u16, precision: usize) -> Option<String> {
    let mut builder = SvgPathBuilder::new(precision);
    self.ttf.outline_glyph(GlyphId(glyph_id), &mut builder)?;
    if builder.path.is_empty() {
      return None;
    }
    Some(builder.path)
  }
}

/// Converts ttf-parser glyph outlines to SVG path data.
///
/// Implements the `ttf_parser::OutlineBuilder` trait to receive outline
/// drawing commands. Y coordinates are negated during recording.
struct SvgPathBuilder {
  path: String,
  precision: usize,
}

impl SvgPathBuilder {
  fn new(precision: usize) -> Self {
    Self {
      path: String::new(),
      precision,
    }
  }

  fn push(&mut self, op: char, coords: &[f32]) {
    if !self.path.is_empty() {
      self.path.push(' ');
    }
    self.path.push(op);
    for (i, value) in coords.iter().enumerate() {
      let value = if i % 2 == 1 { -*value } else { *value };
      let _ = write!(self.path, " {}", crate::svg::fmt_number(value, self.precision));
    }
  }
}

impl ttf_parser::OutlineBuilder for SvgPathBuilder {
  fn move_to(&mut self, x: f32, y: f32) {
    self.push('M', &[x, y]);
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.push('L', &[x, y]);
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.push('Q', &[x1, y1, x, y]);
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.push('C', &[x1, y1, x2, y2, x, y]);
  }

  fn close(&mut self) {
    if !self.path.is_empty() {
      self.path.push_str(" Z");
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// Loads a math font from the environment, or `None` to skip the test.
  /// Mirrors the guard pattern used across the test suite: environments
  /// without an installed MATH font skip the font-dependent assertions.
  pub(crate) fn test_font() -> Option<MathFont> {
    if let Ok(path) = std::env::var("MATHRENDER_TEST_FONT") {
      if let Ok(font) = MathFont::from_data(std::fs::read(path).ok()?, 0) {
        return Some(font);
      }
    }
    MathFont::discover_default().ok()
  }

  #[test]
  fn rejects_fonts_without_math_table() {
    // Not a font at all.
    assert!(matches!(
      MathFont::from_data(vec![0u8; 16], 0),
      Err(FontError::InvalidFontFile { .. })
    ));
  }

  #[test]
  fn svg_path_builder_flips_y() {
    let mut builder = SvgPathBuilder::new(2);
    ttf_parser::OutlineBuilder::move_to(&mut builder, 10.0, 20.0);
    ttf_parser::OutlineBuilder::line_to(&mut builder, 30.0, -5.0);
    ttf_parser::OutlineBuilder::close(&mut builder);
    assert_eq!(builder.path, "M 10 -20 L 30 5 Z");
  }

  #[test]
  fn svg_path_builder_curves() {
    let mut builder = SvgPathBuilder::new(1);
    ttf_parser::OutlineBuilder::move_to(&mut builder, 0.0, 0.0);
    ttf_parser::OutlineBuilder::quad_to(&mut builder, 1.5, 2.5, 3.0, 4.0);
    ttf_parser::OutlineBuilder::curve_to(&mut builder, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0);
    assert_eq!(builder.path, "M 0 0 Q 1.5 -2.5 3 -4 C 1 -1 2 -2 3 -3");
  }

  #[test]
  fn loaded_font_exposes_constants_and_metrics() {
    let Some(font) = test_font() else {
      return;
    };
    assert!(font.units_per_em() > 0.0);
    let consts = font.constants();
    // Every MATH font carries nonzero core constants.
    assert!(consts.fraction_rule_thickness > 0.0);
    assert!(consts.superscript_shift_up > 0.0);
    assert!(consts.script_percent_scale_down > 0.0);

    let face = font.face().expect("face parses");
    let x = face.glyph_index('x').expect("x is covered");
    assert!(face.advance(x) > 0.0);
    let bounds = face.bounds(x);
    assert!(bounds.y_max > bounds.y_min);
    assert!(face.outline(x, 3).is_some());
  }

  #[test]
  fn stretchy_glyphs_have_constructions() {
    let Some(font) = test_font() else {
      return;
    };
    let face = font.face().expect("face parses");
    let paren = face.glyph_index('(').expect("paren covered");
    let construction = face
      .construction(paren, true)
      .expect("paren has vertical construction");
    assert!(!construction.variants.is_empty());
    // Variant advances are listed smallest to largest.
    for pair in construction.variants.windows(2) {
      assert!(pair[0].advance <= pair[1].advance);
    }
  }
}
