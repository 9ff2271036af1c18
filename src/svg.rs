//! SVG serialization
//!
//! Flattens a [`LayoutBox`] into an SVG document or group. In SVG2 mode
//! (default) each distinct glyph becomes one `<symbol>` in `<defs>` and is
//! placed with `<use>` references; in SVG 1.1 mode every glyph is inlined
//! as a `<path>`. Numeric attributes are written with the configured
//! decimal precision.

use std::fmt::Write;

use crate::config::Config;
use crate::error::FontError;
use crate::font::GlyphSource;
use crate::layout::boxes::{Fragment, LayoutBox};

/// Horizontal anchor for [`SvgWriter::group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
  #[default]
  Left,
  Center,
  Right,
}

/// Vertical anchor for [`SvgWriter::group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
  #[default]
  Baseline,
  Top,
  Center,
  Axis,
  Bottom,
}

/// Formats a coordinate with at most `precision` decimals, trimming
/// trailing zeros so output stays compact and stable.
pub fn fmt_number(value: f32, precision: usize) -> String {
  let mut out = format!("{value:.precision$}");
  if out.contains('.') {
    while out.ends_with('0') {
      out.pop();
    }
    if out.ends_with('.') {
      out.pop();
    }
  }
  if out == "-0" {
    out = "0".to_string();
  }
  out
}

/// Serializes layout boxes against the faces that produced them.
pub struct SvgWriter<'a> {
  svg2: bool,
  precision: usize,
  faces: Vec<&'a dyn GlyphSource>,
  /// Glyphs referenced so far, in first-use order: (font key, glyph id).
  symbols: Vec<(u32, u16)>,
}

impl<'a> SvgWriter<'a> {
  pub fn new(config: &Config) -> Self {
    Self {
      svg2: config.svg2,
      precision: config.precision,
      faces: Vec::new(),
      symbols: Vec::new(),
    }
  }

  /// Registers a face so its glyph outlines can be emitted.
  pub fn add_face(&mut self, face: &'a dyn GlyphSource) {
    self.faces.push(face);
  }

  fn face_for(&self, key: u32) -> Option<&&'a dyn GlyphSource> {
    self.faces.iter().find(|f| f.key() == key)
  }

  fn fmt(&self, value: f32) -> String {
    fmt_number(value, self.precision)
  }

  /// Serializes a standalone document. The box's baseline lands at y=0 in
  /// user units, with a one-unit border all around.
  pub fn document(&mut self, layout: &LayoutBox) -> Result<String, FontError> {
    let width = layout.width + 2.0;
    let height = layout.height() + 2.0;
    let mut body = String::new();
    self.fragments(&mut body, layout, 1.0, 0.0)?;

    let mut out = String::with_capacity(body.len() + 512);
    let _ = write!(
      out,
      "<svg xmlns=\"http://www.w3.org/2000/svg\"{}",
      if self.svg2 {
        ""
      } else {
        " xmlns:xlink=\"http://www.w3.org/1999/xlink\""
      }
    );
    let _ = write!(
      out,
      " width=\"{w}\" height=\"{h}\" viewBox=\"0 {top} {w} {h}\">",
      w = self.fmt(width),
      h = self.fmt(height),
      top = self.fmt(-layout.ascent - 1.0),
    );
    self.write_defs(&mut out)?;
    out.push_str(&body);
    out.push_str("</svg>");
    Ok(out)
  }

  /// Serializes a `<g>` translated to `(x, y)` for drawing onto a host
  /// SVG, anchored per `halign`/`valign`.
  pub fn group(
    &mut self,
    layout: &LayoutBox,
    x: f32,
    y: f32,
    halign: HAlign,
    valign: VAlign,
    axis_height: f32,
  ) -> Result<String, FontError> {
    let dx = match halign {
      HAlign::Left => 0.0,
      HAlign::Center => -layout.width / 2.0,
      HAlign::Right => -layout.width,
    };
    let dy = match valign {
      VAlign::Baseline => 0.0,
      VAlign::Top => layout.ascent,
      VAlign::Center => (layout.ascent - layout.descent) / 2.0,
      VAlign::Axis => axis_height,
      VAlign::Bottom => -layout.descent,
    };
    let mut body = String::new();
    self.fragments(&mut body, layout, x + dx, y + dy)?;
    let mut out = String::with_capacity(body.len() + 64);
    out.push_str("<g>");
    self.write_defs(&mut out)?;
    out.push_str(&body);
    out.push_str("</g>");
    Ok(out)
  }

  /// Emits the `<defs>` with one symbol per referenced glyph. Symbols
  /// collected so far are drained, so repeated calls only add new ones.
  fn write_defs(&mut self, out: &mut String) -> Result<(), FontError> {
    if !self.svg2 || self.symbols.is_empty() {
      return Ok(());
    }
    out.push_str("<defs>");
    for (key, gid) in std::mem::take(&mut self.symbols) {
      let Some(face) = self.face_for(key) else {
        continue;
      };
      let Some(path) = face.outline(gid, self.precision) else {
        continue;
      };
      let _ = write!(
        out,
        "<symbol id=\"g{key}-{gid}\" overflow=\"visible\"><path d=\"{path}\"/></symbol>"
      );
    }
    out.push_str("</defs>");
    Ok(())
  }

  fn fragments(
    &mut self,
    out: &mut String,
    layout: &LayoutBox,
    dx: f32,
    dy: f32,
  ) -> Result<(), FontError> {
    for fragment in &layout.fragments {
      match fragment {
        Fragment::Glyph(glyph) => {
          let Some(upem) = self.face_for(glyph.font_key).map(|f| f.units_per_em()) else {
            continue;
          };
          let scale = glyph.size / upem;
          let transform = format!(
            "translate({} {}) scale({})",
            self.fmt(glyph.x + dx),
            self.fmt(glyph.y + dy),
            fmt_number(scale, self.precision.max(6)),
          );
          let fill = glyph
            .color
            .as_ref()
            .map(|c| format!(" fill=\"{c}\""))
            .unwrap_or_default();
          if self.svg2 {
            if !self.symbols.contains(&(glyph.font_key, glyph.glyph_id)) {
              self.symbols.push((glyph.font_key, glyph.glyph_id));
            }
            let _ = write!(
              out,
              "<use href=\"#g{key}-{gid}\" transform=\"{transform}\"{fill}/>",
              key = glyph.font_key,
              gid = glyph.glyph_id,
            );
          } else {
            let Some(path) = self
              .face_for(glyph.font_key)
              .and_then(|face| face.outline(glyph.glyph_id, self.precision))
            else {
              continue;
            };
            let _ = write!(out, "<path d=\"{path}\" transform=\"{transform}\"{fill}/>");
          }
        }
        Fragment::Rule {
          x,
          y,
          width,
          height,
          color,
        } => {
          let fill = color
            .as_ref()
            .map(|c| format!(" fill=\"{c}\""))
            .unwrap_or_default();
          let _ = write!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{fill}/>",
            self.fmt(x + dx),
            self.fmt(y + dy),
            self.fmt(*width),
            self.fmt(*height),
          );
        }
        Fragment::StrokeRect {
          x,
          y,
          width,
          height,
          radius,
          line_width,
          color,
          fill,
        } => {
          let stroke = color.clone().unwrap_or_else(|| "black".to_string());
          let fill = fill.clone().unwrap_or_else(|| "none".to_string());
          let _ = write!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{fill}\" \
             stroke=\"{stroke}\" stroke-width=\"{}\"",
            self.fmt(x + dx),
            self.fmt(y + dy),
            self.fmt(*width),
            self.fmt(*height),
            self.fmt(*line_width),
          );
          if *radius > 0.0 {
            let _ = write!(out, " rx=\"{}\"", self.fmt(*radius));
          }
          out.push_str("/>");
        }
        Fragment::Ellipse {
          cx,
          cy,
          rx,
          ry,
          line_width,
          color,
        } => {
          let stroke = color.clone().unwrap_or_else(|| "black".to_string());
          let _ = write!(
            out,
            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"none\" \
             stroke=\"{stroke}\" stroke-width=\"{}\"/>",
            self.fmt(cx + dx),
            self.fmt(cy + dy),
            self.fmt(*rx),
            self.fmt(*ry),
            self.fmt(*line_width),
          );
        }
        Fragment::Line {
          x1,
          y1,
          x2,
          y2,
          line_width,
          color,
        } => {
          let stroke = color.clone().unwrap_or_else(|| "black".to_string());
          let _ = write!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{stroke}\" \
             stroke-width=\"{}\"/>",
            self.fmt(x1 + dx),
            self.fmt(y1 + dy),
            self.fmt(x2 + dx),
            self.fmt(y2 + dy),
            self.fmt(*line_width),
          );
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fmt_number_trims_zeros() {
    assert_eq!(fmt_number(1.5, 4), "1.5");
    assert_eq!(fmt_number(2.0, 4), "2");
    assert_eq!(fmt_number(1.23456, 2), "1.23");
    assert_eq!(fmt_number(-0.00001, 2), "0");
    assert_eq!(fmt_number(0.0, 4), "0");
  }

  #[test]
  fn fmt_number_respects_precision() {
    assert_eq!(fmt_number(3.14159, 3), "3.142");
    assert_eq!(fmt_number(3.14159, 0), "3");
  }

  #[test]
  fn rule_fragment_serializes() {
    let config = Config::default();
    let mut writer = SvgWriter::new(&config);
    let mut layout = LayoutBox::empty();
    layout.width = 10.0;
    layout.ascent = 5.0;
    layout.descent = 1.0;
    layout.fragments.push(Fragment::Rule {
      x: 0.0,
      y: -2.0,
      width: 10.0,
      height: 0.5,
      color: None,
    });
    let svg = writer.document(&layout).expect("serializes");
    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains("viewBox=\"0 -6 12 8\""));
    assert!(svg.contains("<rect x=\"1\" y=\"-2\" width=\"10\" height=\"0.5\"/>"));
    assert!(svg.ends_with("</svg>"));
  }

  #[test]
  fn group_anchors_right_edge() {
    let config = Config::default();
    let mut writer = SvgWriter::new(&config);
    let mut layout = LayoutBox::empty();
    layout.width = 10.0;
    layout.fragments.push(Fragment::Rule {
      x: 0.0,
      y: 0.0,
      width: 10.0,
      height: 1.0,
      color: None,
    });
    let svg = writer
      .group(&layout, 100.0, 0.0, HAlign::Right, VAlign::Baseline, 0.0)
      .expect("serializes");
    // Right-aligned at x=100: the rule starts at 90.
    assert!(svg.contains("x=\"90\""), "{svg}");
  }
}
