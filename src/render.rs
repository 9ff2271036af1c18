//! Render entry points
//!
//! [`Math`] ties the pipeline together: parse (MathML or LaTeX), lay out
//! against a MATH font, overlay the equation number, serialize to SVG.
//! Configuration is snapshotted once per render; fonts are cached
//! process-wide so repeated renders do not reparse font files.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::font::MathFont;
use crate::layout::boxes::LayoutBox;
use crate::layout::MathLayoutContext;
use crate::length::parse_length;
use crate::mathml::{parse_mathml, MathNode, NodeKind};
use crate::style::Style;
use crate::svg::{HAlign, SvgWriter, VAlign};

static FONT_CACHE: RwLock<Option<FxHashMap<String, Arc<MathFont>>>> = RwLock::new(None);

/// Loads (or fetches from the cache) the math font the configuration
/// names; an empty key means the discovered default.
pub(crate) fn font_for_config(config: &Config) -> Result<Arc<MathFont>> {
  let key = config.math.mathfont.clone().unwrap_or_default();
  if let Some(cache) = FONT_CACHE.read().as_ref() {
    if let Some(font) = cache.get(&key) {
      return Ok(font.clone());
    }
  }
  let font = if key.is_empty() {
    Arc::new(MathFont::discover_default()?)
  } else {
    Arc::new(MathFont::from_path(&key)?)
  };
  FONT_CACHE
    .write()
    .get_or_insert_with(FxHashMap::default)
    .insert(key, font.clone());
  Ok(font)
}

/// A math expression ready to render.
pub struct Math {
  node: MathNode,
  size: Option<f32>,
  font: Option<Arc<MathFont>>,
  number: Option<String>,
}

impl Math {
  /// Parses a MathML expression.
  pub fn new(mathml: &str) -> Result<Self> {
    Ok(Self {
      node: parse_mathml(mathml)?,
      size: None,
      font: None,
      number: None,
    })
  }

  /// Parses display-style LaTeX math. A `\tag{…}` directive becomes the
  /// equation number.
  #[cfg(feature = "latex")]
  pub fn from_latex(latex: &str) -> Result<Self> {
    Self::from_latex_styled(latex, false)
  }

  /// Parses inline-style LaTeX math.
  #[cfg(feature = "latex")]
  pub fn from_latex_inline(latex: &str) -> Result<Self> {
    Self::from_latex_styled(latex, true)
  }

  #[cfg(feature = "latex")]
  fn from_latex_styled(latex: &str, inline: bool) -> Result<Self> {
    let config = Config::get();
    let (latex, tag) = crate::tex::extract_tag(latex);
    let mathml = crate::tex::latex_to_mathml_str(&latex, inline, &config)?;
    let mut math = Self::new(&mathml)?;
    math.number = tag;
    Ok(math)
  }

  /// Overrides the configured base font size (px).
  pub fn with_size(mut self, size: f32) -> Self {
    self.size = Some(size);
    self
  }

  /// Uses a specific font instead of the configured one.
  pub fn with_font(mut self, font: Arc<MathFont>) -> Self {
    self.font = Some(font);
    self
  }

  /// Tags the equation with an explicit number for the overlay.
  pub fn with_number(mut self, number: impl Into<String>) -> Self {
    self.number = Some(number.into());
    self
  }

  fn resolve_font(&self, config: &Config) -> Result<Arc<MathFont>> {
    match &self.font {
      Some(font) => Ok(font.clone()),
      None => font_for_config(config),
    }
  }

  fn base_size(&self, config: &Config) -> f32 {
    self.size.unwrap_or(config.math.fontsize)
  }

  /// Renders to a standalone SVG document.
  pub fn svg(&self) -> Result<String> {
    let config = Config::get();
    let font = self.resolve_font(&config)?;
    let ctx = MathLayoutContext::new(&font, config.clone())?;
    let style = Style::root(self.base_size(&config), true, &config);
    let layout = ctx.layout(&self.node, &style);
    let layout = self.apply_numbering(&ctx, layout, &style, &config);

    let mut writer = SvgWriter::new(&config);
    writer.add_face(&ctx.face);
    Ok(writer.document(&layout)?)
  }

  /// Serializes into a `<g>` for embedding in a host SVG, translated to
  /// `(x, y)` and anchored per `halign`/`valign`.
  pub fn drawon(&self, x: f32, y: f32, halign: HAlign, valign: VAlign) -> Result<String> {
    let config = Config::get();
    let font = self.resolve_font(&config)?;
    let ctx = MathLayoutContext::new(&font, config.clone())?;
    let style = Style::root(self.base_size(&config), true, &config);
    let layout = ctx.layout(&self.node, &style);

    let mut writer = SvgWriter::new(&config);
    writer.add_face(&ctx.face);
    let axis = ctx.axis_height(&style);
    Ok(writer.group(&layout, x, y, halign, valign, axis)?)
  }

  /// Rendered size (width, height) in px.
  pub fn bounds(&self) -> Result<(f32, f32)> {
    let config = Config::get();
    let font = self.resolve_font(&config)?;
    let ctx = MathLayoutContext::new(&font, config.clone())?;
    let style = Style::root(self.base_size(&config), true, &config);
    let layout = ctx.layout(&self.node, &style);
    Ok((layout.width, layout.height()))
  }

  /// Places the equation-number tag: the expression is centered in the
  /// configured column and the tag's right edge lands on the column
  /// width, sharing the expression's baseline.
  fn apply_numbering(
    &self,
    ctx: &MathLayoutContext,
    layout: LayoutBox,
    style: &Style,
    config: &Config,
  ) -> LayoutBox {
    let label = match &self.number {
      Some(explicit) => Some(config.numbering.label_str(explicit)),
      None if config.numbering.autonumber => {
        Some(config.numbering.label(config::next_equation_number()))
      }
      None => None,
    };
    let Some(label) = label else {
      return layout;
    };

    let size = self.base_size(config);
    let column = parse_length(&config.numbering.columnwidth)
      .map(|len| len.resolve(size, size * 0.5))
      .unwrap_or(size * 26.0);

    let tag_node = MathNode::new(NodeKind::Text(label));
    let tag = ctx.layout(&tag_node, style);

    let mut out = LayoutBox::empty();
    let expr_x = ((column - layout.width) / 2.0).max(0.0);
    let tag_x = (column - tag.width).max(0.0);
    out.push_box(expr_x, 0.0, layout);
    out.push_box(tag_x, 0.0, tag);
    out.width = column;
    out
  }
}

/// Shortcut: MathML string straight to SVG.
pub fn mathml_to_svg(mathml: &str) -> Result<String> {
  Math::new(mathml)?.svg()
}

/// Shortcut: LaTeX math straight to SVG.
#[cfg(feature = "latex")]
pub fn latex_to_svg(latex: &str) -> Result<String> {
  Math::from_latex(latex)?.svg()
}

impl std::str::FromStr for Math {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Math::new(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn have_font() -> bool {
    crate::font::tests::test_font().is_some()
  }

  #[test]
  fn renders_simple_mathml() {
    if !have_font() {
      return;
    }
    let svg = mathml_to_svg("<math><mi>x</mi><mo>+</mo><mn>2</mn></math>").expect("renders");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("viewBox"));
    assert!(svg.contains("<use") || svg.contains("<path"));
  }

  #[test]
  fn rendering_is_deterministic() {
    if !have_font() {
      return;
    }
    let source = "<math><mfrac><mn>1</mn><mn>2</mn></mfrac></math>";
    let first = mathml_to_svg(source).expect("renders");
    let second = mathml_to_svg(source).expect("renders");
    assert_eq!(first, second);
  }

  #[test]
  fn explicit_number_places_tag_at_column_edge() {
    if !have_font() {
      return;
    }
    let math = Math::new("<math><mi>E</mi></math>")
      .expect("parses")
      .with_number("7");
    let svg = math.svg().expect("renders");
    assert!(svg.starts_with("<svg"));
    // The column width dominates the document width.
    let config = Config::get();
    let column = parse_length(&config.numbering.columnwidth)
      .unwrap()
      .resolve(config.math.fontsize, config.math.fontsize * 0.5);
    let (width, _) = math.bounds().expect("bounds");
    assert!(width < column);
  }

}
