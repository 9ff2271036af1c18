//! Stretchy glyph construction
//!
//! Grows an operator to a target extent: first the font's precomputed size
//! variants (smallest one that reaches the target), then a glyph assembly
//! built from fixed parts plus repeated extenders with connector overlap,
//! and finally the largest variant when the target is unreachable. Callers
//! keep the natural glyph when everything here comes back `None`.

use crate::layout::boxes::{Fragment, GlyphFragment, GlyphRef, LayoutBox};
use crate::layout::{color_of, MathLayoutContext};
use crate::style::Style;

impl<'a> MathLayoutContext<'a> {
  /// Box for a single glyph id placed at the baseline.
  pub(crate) fn single_glyph_box(&self, glyph_id: u16, ch: char, style: &Style) -> LayoutBox {
    let em = self.em_scale(style);
    let size = style.glyph_size(&self.constants, &self.config);
    let metrics = self.face.glyph_metrics(glyph_id);
    let glyph_ref = GlyphRef { metrics, size, ch };
    LayoutBox {
      width: metrics.advance * em,
      ascent: metrics.bounds.y_max * em,
      descent: -metrics.bounds.y_min * em,
      italic_correction: metrics.italic_correction * em,
      top_accent_attachment: metrics.top_accent_attachment.map(|v| v * em),
      left_bearing: metrics.bounds.x_min * em,
      right_bearing: (metrics.advance - metrics.bounds.x_max) * em,
      fragments: vec![Fragment::Glyph(GlyphFragment {
        glyph_id,
        ch,
        x: 0.0,
        y: 0.0,
        size,
        color: color_of(style),
        font_key: self.font_key(),
      })],
      first_glyph: Some(glyph_ref),
      last_glyph: Some(glyph_ref),
      is_fraction: false,
    }
  }

  /// Recenters a box vertically on the math axis.
  pub(crate) fn center_on_axis(&self, mut laid: LayoutBox, style: &Style) -> LayoutBox {
    let axis = self.axis_height(style);
    let height = laid.height();
    let target_ascent = height / 2.0 + axis;
    laid.rebase(laid.ascent - target_ascent);
    laid
  }

  /// Grows a glyph vertically until its height reaches `target` px.
  ///
  /// Variant results keep the variant glyph's natural bearings; assembly
  /// results come back centered on the math axis.
  pub(crate) fn stretch_glyph_vertical(
    &self,
    glyph: GlyphRef,
    target: f32,
    style: &Style,
  ) -> Option<LayoutBox> {
    self.stretch_glyph(glyph, target, true, style)
  }

  /// Grows a glyph horizontally until its advance reaches `target` px.
  pub(crate) fn stretch_glyph_horizontal(
    &self,
    glyph: GlyphRef,
    target: f32,
    style: &Style,
  ) -> Option<LayoutBox> {
    self.stretch_glyph(glyph, target, false, style)
  }

  fn stretch_glyph(
    &self,
    glyph: GlyphRef,
    target: f32,
    vertical: bool,
    style: &Style,
  ) -> Option<LayoutBox> {
    let em = self.em_scale(style);
    if em <= 0.0 || target <= 0.0 {
      return None;
    }
    let target_units = target / em;
    let construction = self.face.construction(glyph.metrics.id, vertical)?;

    // Smallest precomputed variant that reaches the target.
    for variant in &construction.variants {
      if variant.advance >= target_units {
        return Some(self.single_glyph_box(variant.glyph_id, glyph.ch, style));
      }
    }

    if !construction.assembly.is_empty() {
      if let Some(assembled) =
        self.assemble(&construction.assembly, target_units, vertical, glyph.ch, style)
      {
        return Some(assembled);
      }
    }

    // Target beyond every variant and no assembly: largest variant.
    construction
      .variants
      .last()
      .map(|variant| self.single_glyph_box(variant.glyph_id, glyph.ch, style))
  }

  /// Builds a glyph assembly of at least `target_units` design units.
  ///
  /// Extender parts are replicated until the total length, with connector
  /// overlaps of at least the font's MinConnectorOverlap, reaches the
  /// target; the leftover is absorbed by deepening every overlap equally.
  fn assemble(
    &self,
    parts: &[crate::font::AssemblyPart],
    target_units: f32,
    vertical: bool,
    ch: char,
    style: &Style,
  ) -> Option<LayoutBox> {
    if parts.is_empty() {
      return None;
    }
    let min_overlap = self.face.min_connector_overlap();
    let has_extender = parts.iter().any(|p| p.is_extender);

    // Replicate extenders until the assembly reaches the target. Each
    // round strictly increases the length, so this terminates.
    let mut repeat = if has_extender { 0usize } else { 1 };
    let mut selected: Vec<crate::font::AssemblyPart>;
    let mut total;
    loop {
      selected = Vec::new();
      for part in parts {
        if part.is_extender {
          for _ in 0..repeat {
            selected.push(*part);
          }
        } else {
          selected.push(*part);
        }
      }
      if selected.is_empty() {
        return None;
      }
      total = selected.iter().map(|p| p.full_advance).sum::<f32>()
        - min_overlap * (selected.len() - 1) as f32;
      if total >= target_units || !has_extender {
        break;
      }
      repeat += 1;
    }

    // Deepen overlaps uniformly so the result lands on the target.
    let extra = if selected.len() > 1 {
      ((total - target_units) / (selected.len() - 1) as f32).max(0.0)
    } else {
      0.0
    };
    let step_overlap = min_overlap + extra;
    let length_units = selected.iter().map(|p| p.full_advance).sum::<f32>()
      - step_overlap * (selected.len() - 1) as f32;

    let em = self.em_scale(style);
    let size = style.glyph_size(&self.constants, &self.config);
    let length = length_units * em;
    let mut out = LayoutBox::empty();

    if vertical {
      // Parts are listed bottom to top; center the assembly on the axis.
      let axis = self.axis_height(style);
      out.ascent = length / 2.0 + axis;
      out.descent = length / 2.0 - axis;
      let mut bottom = 0.0;
      let mut width: f32 = 0.0;
      for (idx, part) in selected.iter().enumerate() {
        if idx > 0 {
          bottom -= step_overlap;
        }
        let metrics = self.face.glyph_metrics(part.glyph_id);
        width = width.max(metrics.advance * em);
        out.fragments.push(Fragment::Glyph(GlyphFragment {
          glyph_id: part.glyph_id,
          ch,
          x: 0.0,
          y: out.descent - bottom * em,
          size,
          color: color_of(style),
          font_key: self.font_key(),
        }));
        bottom += part.full_advance;
      }
      out.width = width;
    } else {
      let mut x_units = 0.0;
      for (idx, part) in selected.iter().enumerate() {
        if idx > 0 {
          x_units -= step_overlap;
        }
        let metrics = self.face.glyph_metrics(part.glyph_id);
        out.ascent = out.ascent.max(metrics.bounds.y_max * em);
        out.descent = out.descent.max(-metrics.bounds.y_min * em);
        out.fragments.push(Fragment::Glyph(GlyphFragment {
          glyph_id: part.glyph_id,
          ch,
          x: x_units * em,
          y: 0.0,
          size,
          color: color_of(style),
          font_key: self.font_key(),
        }));
        x_units += part.full_advance;
      }
      out.width = x_units * em;
    }

    let metrics = self.face.glyph_metrics(selected.last()?.glyph_id);
    let glyph_ref = GlyphRef { metrics, size, ch };
    out.first_glyph = Some(glyph_ref);
    out.last_glyph = Some(glyph_ref);
    Some(out)
  }

  /// Stretches a glyph to cover `[target_ascent, target_descent]`.
  ///
  /// Symmetric operators are centered on the math axis (growing to cover
  /// whichever side reaches further from it); others keep the leftover
  /// height split evenly around the target extent.
  pub(crate) fn stretch_to_extent(
    &self,
    glyph: GlyphRef,
    target_ascent: f32,
    target_descent: f32,
    symmetric: bool,
    style: &Style,
  ) -> Option<LayoutBox> {
    let axis = self.axis_height(style);
    let required = if symmetric {
      2.0 * (target_ascent - axis).max(target_descent + axis).max(0.0)
    } else {
      target_ascent + target_descent
    };
    if required <= 0.0 {
      return None;
    }
    let grown = self.stretch_glyph_vertical(glyph, required, style)?;
    if symmetric {
      return Some(self.center_on_axis(grown, style));
    }
    let mut grown = grown;
    let extra = (grown.height() - (target_ascent + target_descent)) / 2.0;
    let desired_ascent = target_ascent + extra.max(0.0);
    grown.rebase(grown.ascent - desired_ascent);
    Some(grown)
  }
}
