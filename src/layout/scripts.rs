//! Script and limit placement
//!
//! Sub/superscripts from the MATH constants with math-kern corner
//! adjustment, under/over accents and limits, and mmultiscripts with
//! prescripts. Limits swap with scripts based on `movablelimits` and the
//! display style.

use crate::font::KernCorner;
use crate::layout::boxes::{GlyphRef, LayoutBox};
use crate::layout::MathLayoutContext;
use crate::mathml::{MathNode, NodeAttrs, NodeKind};
use crate::operators::Form;
use crate::style::Style;

/// Characters drawn as accents: they keep the base's script level and sit
/// flush on top of it.
const ACCENT_CHARS: &[char] = &[
  '\u{005E}', '\u{0060}', '\u{007E}', '\u{00A8}', '\u{00AF}', '\u{00B4}', '\u{02C7}',
  '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{0302}', '\u{0303}', '\u{20D7}', '\u{20DB}',
  '\u{20DC}', '\u{203E}',
];

fn is_accent_char(node: &MathNode) -> bool {
  match &node.kind {
    NodeKind::Operator(text) | NodeKind::Identifier(text) => {
      let mut chars = text.chars();
      matches!((chars.next(), chars.next()), (Some(ch), None) if ACCENT_CHARS.contains(&ch))
    }
    _ => false,
  }
}

/// Base info the script placement formulas need.
struct ScriptBase {
  laid: LayoutBox,
  /// Set when the base itself is an operator token.
  movable_limits: bool,
  is_integral: bool,
}

impl<'a> MathLayoutContext<'a> {
  fn layout_script_base(&self, base: &MathNode, style: &Style) -> ScriptBase {
    let style = style.for_attrs(&base.attrs);
    if let NodeKind::Operator(text) = &base.kind {
      let form = base
        .attrs
        .get("form")
        .and_then(Form::parse)
        .unwrap_or(Form::Prefix);
      let (laid, record) = self.layout_operator(text, &base.attrs, &style, form);
      ScriptBase {
        laid,
        movable_limits: record.movable_limits(),
        is_integral: text
          .chars()
          .next()
          .map(crate::operators::is_integral)
          .unwrap_or(false),
      }
    } else {
      ScriptBase {
        laid: self.layout_with_style(base, &style),
        movable_limits: false,
        is_integral: false,
      }
    }
  }

  /// Superscript kern and raise from the corner tables, mirroring the
  /// OpenType two-height evaluation: the correction is the minimum of the
  /// combined kern at the script-bottom and base-top heights.
  fn kern_super(&self, base: GlyphRef, sup: GlyphRef, shift_units: f32) -> f32 {
    let scale = sup.size / base.size;
    let h1 = shift_units + sup.metrics.bounds.y_min * scale;
    let h2 = base.metrics.bounds.y_max - shift_units;
    let k1 = self.face.kern_at_height(base.metrics.id, KernCorner::TopRight, h1)
      + self.face.kern_at_height(sup.metrics.id, KernCorner::BottomLeft, h1);
    let k2 = self.face.kern_at_height(base.metrics.id, KernCorner::TopRight, h2)
      + self.face.kern_at_height(sup.metrics.id, KernCorner::BottomLeft, h2);
    k1.min(k2)
  }

  fn kern_sub(&self, base: GlyphRef, sub: GlyphRef, drop_units: f32) -> f32 {
    let scale = sub.size / base.size;
    let h1 = -drop_units + sub.metrics.bounds.y_max * scale;
    let h2 = base.metrics.bounds.y_min + drop_units;
    let k1 = self.face.kern_at_height(base.metrics.id, KernCorner::BottomRight, h1)
      + self.face.kern_at_height(sub.metrics.id, KernCorner::TopLeft, h1);
    let k2 = self.face.kern_at_height(base.metrics.id, KernCorner::BottomRight, h2)
      + self.face.kern_at_height(sub.metrics.id, KernCorner::TopLeft, h2);
    k1.min(k2)
  }

  /// Superscript raise in px for this base.
  fn superscript_shift(&self, base: &ScriptBase, sup: &LayoutBox, style: &Style) -> f32 {
    let em = self.em_scale(style);
    let c = &self.constants;
    let nominal = if style.cramped {
      c.superscript_shift_up_cramped
    } else {
      c.superscript_shift_up
    } * em;
    let mut shift = nominal.max(base.laid.ascent - c.superscript_baseline_drop_max * em);
    if let Some(glyph) = base.laid.last_glyph {
      // Extended shapes (tall variants) attach their superscript near the
      // glyph top instead of at the nominal raise.
      if glyph.metrics.extended_shape {
        let glyph_em = glyph.size / self.face.units_per_em();
        shift = glyph.metrics.bounds.y_max * glyph_em - c.superscript_shift_up / 2.0 * em;
      }
    }
    // Keep the script bottom above SuperscriptBottomMin.
    let bottom_min = c.superscript_bottom_min * em;
    if shift - sup.descent < bottom_min {
      shift = bottom_min + sup.descent;
    }
    shift
  }

  /// Subscript drop in px for this base.
  fn subscript_drop(&self, base: &ScriptBase, sub: &LayoutBox, style: &Style) -> f32 {
    let em = self.em_scale(style);
    let c = &self.constants;
    (c.subscript_shift_down * em)
      .max(base.laid.descent + c.subscript_baseline_drop_min * em)
      .max(sub.ascent - c.subscript_top_max * em)
  }

  /// `msub`/`msup`/`msubsup`.
  pub(crate) fn layout_scripts(
    &self,
    base: &MathNode,
    sub: Option<&MathNode>,
    sup: Option<&MathNode>,
    style: &Style,
  ) -> LayoutBox {
    let script_base = self.layout_script_base(base, style);

    // Movable limits in display style render above and below instead.
    if script_base.movable_limits && style.display_style {
      return self.layout_limits(script_base, sub, sup, style);
    }

    let em = self.em_scale(style);
    let c = self.constants;
    let sup_style = style.scripted(style.cramped);
    let sub_style = style.scripted(true);
    let sup_laid = sup.map(|n| self.layout(n, &sup_style));
    let sub_laid = sub.map(|n| self.layout(n, &sub_style));

    let mut shift_up = sup_laid
      .as_ref()
      .map(|laid| self.superscript_shift(&script_base, laid, style))
      .unwrap_or(0.0);
    let mut drop = sub_laid
      .as_ref()
      .map(|laid| self.subscript_drop(&script_base, laid, style))
      .unwrap_or(0.0);

    if let (Some(sup_box), Some(sub_box)) = (&sup_laid, &sub_laid) {
      // With both scripts, the superscript bottom is capped...
      let max_bottom = c.superscript_bottom_max_with_subscript * em;
      if max_bottom > 0.0 && shift_up - sup_box.descent > max_bottom {
        shift_up = max_bottom + sup_box.descent;
      }
      // ...and the two must stay SubSuperscriptGapMin apart.
      let gap = (shift_up - sup_box.descent) - (sub_box.ascent - drop);
      let gap_min = c.sub_superscript_gap_min * em;
      if gap < gap_min {
        let push = (gap_min - gap) / 2.0;
        shift_up += push;
        drop += push;
      }
    }

    let base_width = script_base.laid.width;
    let italic = script_base.laid.italic_correction;
    let base_glyph = script_base.laid.last_glyph;

    let mut out = LayoutBox::empty();
    let accent = script_base.laid.top_accent_attachment;
    out.push_box(0.0, 0.0, script_base.laid);
    out.top_accent_attachment = accent;
    let mut end = base_width;

    if let Some(sup_box) = sup_laid {
      let mut x = base_width;
      if !script_base.is_integral {
        x += italic;
      }
      if let (Some(base_glyph), Some(sup_glyph)) = (base_glyph, sup_box.first_glyph) {
        let shift_units = shift_up / em;
        x += self.kern_super(base_glyph, sup_glyph, shift_units) * em;
      }
      end = end.max(x + sup_box.width);
      out.push_box(x, -shift_up, sup_box);
    }
    if let Some(sub_box) = sub_laid {
      let mut x = base_width;
      if script_base.is_integral {
        x -= italic;
      }
      if let (Some(base_glyph), Some(sub_glyph)) = (base_glyph, sub_box.first_glyph) {
        let drop_units = drop / em;
        x += self.kern_sub(base_glyph, sub_glyph, drop_units) * em;
      }
      end = end.max(x + sub_box.width);
      out.push_box(x, drop, sub_box);
    }

    out.width = end + c.space_after_script * em;
    out.italic_correction = 0.0;
    out
  }

  /// N-ary operator limits: scripts centered above and below the base.
  fn layout_limits(
    &self,
    script_base: ScriptBase,
    under: Option<&MathNode>,
    over: Option<&MathNode>,
    style: &Style,
  ) -> LayoutBox {
    let em = self.em_scale(style);
    let c = self.constants;
    let script_style = style.scripted(false);
    let over_laid = over.map(|n| self.layout(n, &script_style));
    let under_laid = under.map(|n| self.layout(n, &script_style.cramp()));

    let base = script_base.laid;
    let width = [
      base.width,
      over_laid.as_ref().map(|b| b.width).unwrap_or(0.0),
      under_laid.as_ref().map(|b| b.width).unwrap_or(0.0),
    ]
    .into_iter()
    .fold(0.0f32, f32::max);

    let mut out = LayoutBox::empty();
    let base_ascent = base.ascent;
    let base_descent = base.descent;
    let base_width = base.width;
    out.push_box((width - base_width) / 2.0, 0.0, base);

    if let Some(over_box) = over_laid {
      let gap = c.upper_limit_gap_min * em;
      let rise = (base_ascent + gap + over_box.descent)
        .max(c.upper_limit_baseline_rise_min * em);
      out.push_box((width - over_box.width) / 2.0, -rise, over_box);
    }
    if let Some(under_box) = under_laid {
      let gap = c.lower_limit_gap_min * em;
      let fall = (base_descent + gap + under_box.ascent)
        .max(c.lower_limit_baseline_drop_min * em);
      out.push_box((width - under_box.width) / 2.0, fall, under_box);
    }
    out.width = width;
    out
  }

  /// `munder`/`mover`/`munderover`.
  pub(crate) fn layout_under_over(
    &self,
    base: &MathNode,
    under: Option<&MathNode>,
    over: Option<&MathNode>,
    attrs: &NodeAttrs,
    style: &Style,
  ) -> LayoutBox {
    let script_base = self.layout_script_base(base, style);

    // Text-style movable limits fall back to scripts.
    if script_base.movable_limits && !style.display_style {
      return self.layout_scripts(base, under, over, style);
    }
    if script_base.movable_limits && style.display_style {
      return self.layout_limits(script_base, under, over, style);
    }

    let em = self.em_scale(style);
    let c = self.constants;
    let base_box = script_base.laid;
    let stretch_target = base_box.width;

    let accent_over = over
      .map(|n| {
        attrs
          .get("accent")
          .map(|v| v.eq_ignore_ascii_case("true"))
          .unwrap_or_else(|| is_accent_char(n))
      })
      .unwrap_or(false);
    let accent_under = under
      .map(|n| {
        attrs
          .get("accentunder")
          .map(|v| v.eq_ignore_ascii_case("true"))
          .unwrap_or_else(|| is_accent_char(n))
      })
      .unwrap_or(false);

    // Accents keep the base's script level; other marks shrink one step.
    let over_style = if accent_over {
      style.clone()
    } else {
      style.scripted(style.cramped)
    };
    let under_style = if accent_under {
      style.cramp()
    } else {
      style.scripted(true)
    };

    let over_laid = over.map(|n| self.layout_mark(n, &over_style, stretch_target));
    let under_laid = under.map(|n| self.layout_mark(n, &under_style, stretch_target));

    let width = [
      base_box.width,
      over_laid.as_ref().map(|b| b.width).unwrap_or(0.0),
      under_laid.as_ref().map(|b| b.width).unwrap_or(0.0),
    ]
    .into_iter()
    .fold(0.0f32, f32::max);

    let mut out = LayoutBox::empty();
    let base_ascent = base_box.ascent;
    let base_descent = base_box.descent;
    let base_width = base_box.width;
    let base_attach = base_box.top_accent_attachment;
    let base_x = (width - base_width) / 2.0;
    out.push_box(base_x, 0.0, base_box);

    if let Some(over_box) = over_laid {
      let gap = if accent_over {
        0.0
      } else {
        c.overbar_vertical_gap * em
      };
      // Align accent attachment points when both sides define one.
      let x = match (accent_over, base_attach, over_box.top_accent_attachment) {
        (true, Some(base_anchor), Some(over_anchor)) => base_x + base_anchor - over_anchor,
        (true, Some(base_anchor), None) => base_x + base_anchor - over_box.width / 2.0,
        _ => (width - over_box.width) / 2.0,
      };
      let y = -(base_ascent + gap + over_box.descent);
      out.push_box(x.max(0.0), y, over_box);
    }
    if let Some(under_box) = under_laid {
      let gap = if accent_under {
        0.0
      } else {
        c.underbar_vertical_gap * em
      };
      let x = (width - under_box.width) / 2.0;
      let y = base_descent + gap + under_box.ascent;
      out.push_box(x, y, under_box);
    }
    out.width = width;
    out
  }

  /// Lays out an under/over mark, stretching horizontal stretchy
  /// operators to the base width.
  fn layout_mark(&self, node: &MathNode, style: &Style, target: f32) -> LayoutBox {
    if let NodeKind::Operator(text) = &node.kind {
      let style = style.for_attrs(&node.attrs);
      let form = node
        .attrs
        .get("form")
        .and_then(Form::parse)
        .unwrap_or(Form::Postfix);
      let (laid, record) = self.layout_operator(text, &node.attrs, &style, form);
      if record.stretchy() && laid.width < target {
        if let Some(glyph) = laid.last_glyph {
          if let Some(stretched) = self.stretch_glyph_horizontal(glyph, target, &style) {
            return stretched;
          }
        }
      }
      return laid;
    }
    self.layout(node, style)
  }

  /// `mmultiscripts`: pre- and postscript pairs around a base.
  pub(crate) fn layout_multiscripts(
    &self,
    base: &MathNode,
    prescripts: &[(Option<MathNode>, Option<MathNode>)],
    postscripts: &[(Option<MathNode>, Option<MathNode>)],
    style: &Style,
  ) -> LayoutBox {
    let script_base = self.layout_script_base(base, style);
    let em = self.em_scale(style);
    let c = self.constants;
    let gap = c.space_after_script * em;
    let sup_style = style.scripted(style.cramped);
    let sub_style = style.scripted(true);

    // Lays out one column of (sub, sup) and returns its box.
    let layout_pair = |sub: Option<&MathNode>,
                       sup: Option<&MathNode>,
                       mirror: bool|
     -> LayoutBox {
      let sup_laid = sup.map(|n| self.layout(n, &sup_style));
      let sub_laid = sub.map(|n| self.layout(n, &sub_style));
      let mut shift_up = sup_laid
        .as_ref()
        .map(|laid| self.superscript_shift(&script_base, laid, style))
        .unwrap_or(0.0);
      let mut drop = sub_laid
        .as_ref()
        .map(|laid| self.subscript_drop(&script_base, laid, style))
        .unwrap_or(0.0);
      if let (Some(sup_box), Some(sub_box)) = (&sup_laid, &sub_laid) {
        let gap_now = (shift_up - sup_box.descent) - (sub_box.ascent - drop);
        let gap_min = c.sub_superscript_gap_min * em;
        if gap_now < gap_min {
          let push = (gap_min - gap_now) / 2.0;
          shift_up += push;
          drop += push;
        }
      }
      let column = sup_laid
        .as_ref()
        .map(|b| b.width)
        .unwrap_or(0.0)
        .max(sub_laid.as_ref().map(|b| b.width).unwrap_or(0.0));
      let mut out = LayoutBox::empty();
      if let Some(sup_box) = sup_laid {
        // Prescripts right-align their column, postscripts left-align.
        let x = if mirror { column - sup_box.width } else { 0.0 };
        out.push_box(x, -shift_up, sup_box);
      }
      if let Some(sub_box) = sub_laid {
        let x = if mirror { column - sub_box.width } else { 0.0 };
        out.push_box(x, drop, sub_box);
      }
      out.width = column;
      out
    };

    let mut out = LayoutBox::empty();
    let mut x = 0.0;
    for (idx, (sub, sup)) in prescripts.iter().enumerate() {
      if idx > 0 {
        x += gap;
      }
      let pair = layout_pair(sub.as_ref(), sup.as_ref(), true);
      let width = pair.width;
      out.push_box(x, 0.0, pair);
      x += width;
    }
    if !prescripts.is_empty() {
      x += gap;
    }
    let base_box = script_base.laid.clone();
    let base_width = base_box.width;
    out.push_box(x, 0.0, base_box);
    x += base_width;
    for (sub, sup) in postscripts.iter() {
      let pair = layout_pair(sub.as_ref(), sup.as_ref(), false);
      let width = pair.width;
      out.push_box(x, 0.0, pair);
      x += width + gap;
    }
    out.width = x.max(base_width);
    out
  }
}
