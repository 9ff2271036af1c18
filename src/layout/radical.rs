//! Radical layout
//!
//! `msqrt`/`mroot`: the radical sign is grown with the stretchy builder to
//! clear the radicand plus the MATH-table gap and rule, the overbar is
//! drawn from the sign's tip across the radicand, and a root degree sits
//! raised beside the sign.

use crate::layout::boxes::{Fragment, LayoutBox};
use crate::layout::{color_of, MathLayoutContext};
use crate::mathml::MathNode;
use crate::style::Style;

const RADICAL_CHAR: char = '\u{221A}';

impl<'a> MathLayoutContext<'a> {
  pub(crate) fn layout_sqrt(&self, radicand: &MathNode, style: &Style) -> LayoutBox {
    self.layout_radical(radicand, None, style)
  }

  pub(crate) fn layout_root(
    &self,
    radicand: &MathNode,
    degree: &MathNode,
    style: &Style,
  ) -> LayoutBox {
    self.layout_radical(radicand, Some(degree), style)
  }

  fn layout_radical(
    &self,
    radicand: &MathNode,
    degree: Option<&MathNode>,
    style: &Style,
  ) -> LayoutBox {
    let em = self.em_scale(style);
    let c = self.constants;
    let content = self.layout(radicand, &style.cramp());

    let gap = if style.display_style {
      c.radical_display_style_vertical_gap
    } else {
      c.radical_vertical_gap
    } * em;
    let rule = c.radical_rule_thickness * em;
    let extra_ascender = c.radical_extra_ascender * em;

    // The sign must reach from the radicand's bottom to above its top by
    // the vertical gap plus the rule.
    let target = content.height() + gap + rule;
    let sign = self
      .resolve_glyph(RADICAL_CHAR, crate::variant::MathVariant::Normal)
      .map(|(gid, ch)| {
        let natural = self.single_glyph_box(gid, ch, style);
        match natural.last_glyph {
          Some(glyph) if natural.height() < target => self
            .stretch_glyph_vertical(glyph, target, style)
            .unwrap_or(natural),
          _ => natural,
        }
      });
    let Some(mut sign) = sign else {
      tracing::warn!("font has no radical glyph");
      let mut out = content;
      out.ascent += gap + rule + extra_ascender;
      return out;
    };

    // Hang the sign from the rule height regardless of how it was built.
    let sign_ascent = content.ascent + gap + rule;
    sign.rebase(sign.ascent - sign_ascent);

    let mut out = LayoutBox::empty();
    let mut x = 0.0;

    if let Some(degree) = degree {
      // Degree is two script levels down, raised along the sign.
      let degree_style = style.script(false).script(false);
      let degree_box = self.layout(degree, &degree_style);
      x += c.radical_kern_before_degree * em;
      let raise = c.radical_degree_bottom_raise_percent / 100.0 * sign.height();
      let degree_y = sign.descent - raise - degree_box.descent;
      let degree_width = degree_box.width;
      out.push_box(x, degree_y, degree_box);
      x += degree_width + c.radical_kern_after_degree * em;
    }

    let sign_width = sign.width;
    out.push_box(x, 0.0, sign);
    x += sign_width;

    // Overbar across the radicand, extended by its italic correction.
    let bar_width = content.width + content.italic_correction;
    out.fragments.push(Fragment::Rule {
      x,
      y: -(content.ascent + gap + rule),
      width: bar_width,
      height: rule,
      color: color_of(style),
    });

    let content_width = content.width;
    out.push_box(x, 0.0, content);
    out.ascent = out.ascent.max(sign_ascent + extra_ascender);
    out.width = x + content_width.max(bar_width);
    out
  }
}
