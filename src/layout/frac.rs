//! Fraction layout
//!
//! Numerator and denominator at reduced size around a rule centered on the
//! math axis, with the shift-up/shift-down and gap minima from the MATH
//! constants. The bar spans the wider of the two plus a small tab on each
//! side.

use crate::layout::boxes::{Fragment, LayoutBox};
use crate::layout::{color_of, MathLayoutContext, THIN_SPACE_EM};
use crate::length::parse_length;
use crate::mathml::{MathNode, NodeAttrs};
use crate::style::Style;

impl<'a> MathLayoutContext<'a> {
  /// Rule thickness from the `linethickness` attribute, defaulting to
  /// FractionRuleThickness. `thin` and `thick` scale the default.
  fn fraction_rule_thickness(&self, attrs: &NodeAttrs, style: &Style) -> f32 {
    let em = self.em_scale(style);
    let default = self.constants.fraction_rule_thickness * em;
    let Some(value) = attrs.get("linethickness") else {
      return default;
    };
    match value.trim() {
      "thin" => default * 0.5,
      "medium" => default,
      "thick" => default * 2.0,
      other => {
        let size = style.glyph_size(&self.constants, &self.config);
        let x_height = self.face.x_height() * em;
        parse_length(other)
          .map(|len| len.resolve(size, x_height))
          .unwrap_or(default)
      }
    }
  }

  pub(crate) fn layout_fraction(
    &self,
    numerator: &MathNode,
    denominator: &MathNode,
    attrs: &NodeAttrs,
    style: &Style,
  ) -> LayoutBox {
    let em = self.em_scale(style);
    let c = self.constants;
    let size = style.glyph_size(&self.constants, &self.config);

    // Display-style fractions keep full-size parts; inline fractions drop
    // one script level.
    let inner_style = if style.display_style {
      style.clone()
    } else {
      style.script(false)
    };
    let num_box = self.layout(numerator, &inner_style);
    let den_box = self.layout(denominator, &inner_style.cramp());

    let rule = self.fraction_rule_thickness(attrs, style);
    let axis = self.axis_height(style);

    let (shift_up, shift_down, num_gap_min, den_gap_min) = if style.display_style {
      (
        c.fraction_numerator_display_style_shift_up * em,
        c.fraction_denominator_display_style_shift_down * em,
        c.fraction_num_display_style_gap_min * em,
        c.fraction_denom_display_style_gap_min * em,
      )
    } else {
      (
        c.fraction_numerator_shift_up * em,
        c.fraction_denominator_shift_down * em,
        c.fraction_numerator_gap_min * em,
        c.fraction_denominator_gap_min * em,
      )
    };

    // Raise the numerator until its descent clears the bar by the gap
    // minimum; same below for the denominator.
    let bar_top = axis + rule / 2.0;
    let bar_bottom = axis - rule / 2.0;
    let mut num_rise = shift_up;
    if num_rise - num_box.descent < bar_top + num_gap_min {
      num_rise = bar_top + num_gap_min + num_box.descent;
    }
    let mut den_drop = shift_down;
    if den_drop - den_box.ascent < den_gap_min - bar_bottom {
      den_drop = den_gap_min - bar_bottom + den_box.ascent;
    }

    let content = num_box.width.max(den_box.width);
    let tab = THIN_SPACE_EM * size / 2.0;
    let bar_width = content + 2.0 * tab;

    let mut out = LayoutBox::empty();
    let num_x = tab + (content - num_box.width) / 2.0;
    let den_x = tab + (content - den_box.width) / 2.0;
    out.push_box(num_x, -num_rise, num_box);
    out.push_box(den_x, den_drop, den_box);
    out.fragments.push(Fragment::Rule {
      x: 0.0,
      y: -axis - rule / 2.0,
      width: bar_width,
      height: rule,
      color: color_of(style),
    });
    out.ascent = out.ascent.max(axis + rule / 2.0);
    out.descent = out.descent.max(-(axis - rule / 2.0));
    // A fraction always carries a trailing thinmathspace in its advance,
    // on top of the lead-in the row inserts before it.
    out.width = bar_width + THIN_SPACE_EM * size;
    out.is_fraction = true;
    out.first_glyph = None;
    out.last_glyph = None;
    out
  }
}
