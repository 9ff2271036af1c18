//! Math layout engine
//!
//! Recursive traversal over the parsed MathML tree. Every node kind has a
//! layout routine that consumes a [`Style`] scope and produces a
//! [`LayoutBox`]; rows resolve operator forms, apply dictionary spacing and
//! grow stretchy operators to their siblings' extent.
//!
//! Lengths inside this module are px unless a name says otherwise; oracle
//! values arrive in font design units and are multiplied by the style's em
//! scale at the point of use.

pub mod boxes;
mod enclose;
mod frac;
mod radical;
mod scripts;
mod stretchy;
mod table;

use crate::config::Config;
use crate::error::FontError;
use crate::font::{MathConstants, MathFace, MathFont};
use crate::length::parse_length;
use crate::mathml::{MathNode, NodeAttrs, NodeKind};
use crate::operators::{self, Form, OperatorRecord};
use crate::style::Style;
use crate::variant::{auto_italic, styled_char, MathVariant};
use boxes::{Fragment, GlyphFragment, GlyphRef, LayoutBox};

/// Space in ems for the named width, used for fraction lead-in.
const THIN_SPACE_EM: f32 = 3.0 / 18.0;
const VERY_THIN_SPACE_EM: f32 = 2.0 / 18.0;

/// Layout engine over one font face.
pub struct MathLayoutContext<'a> {
  pub(crate) face: MathFace<'a>,
  pub(crate) constants: MathConstants,
  pub(crate) config: Config,
}

impl<'a> MathLayoutContext<'a> {
  /// Creates a layout context with a configuration snapshot.
  pub fn new(font: &'a MathFont, config: Config) -> Result<Self, FontError> {
    Ok(Self {
      face: font.face()?,
      constants: *font.constants(),
      config,
    })
  }

  /// Design-unit to px scale at this scope's glyph size.
  pub(crate) fn em_scale(&self, style: &Style) -> f32 {
    style.glyph_size(&self.constants, &self.config) / self.face.units_per_em()
  }

  /// Math axis height in px.
  pub(crate) fn axis_height(&self, style: &Style) -> f32 {
    self.constants.axis_height * self.em_scale(style)
  }

  pub(crate) fn font_key(&self) -> u32 {
    self.face.font().key()
  }

  /// Lays out one node under `style`.
  pub fn layout(&self, node: &MathNode, style: &Style) -> LayoutBox {
    let style = style.for_attrs(&node.attrs);
    self.layout_with_style(node, &style)
  }

  fn layout_with_style(&self, node: &MathNode, style: &Style) -> LayoutBox {
    match &node.kind {
      NodeKind::Math { display, children } => {
        let mut style = style.clone();
        style.display_style = style.display_style && *display;
        self.layout_row(children, &style)
      }
      NodeKind::Row(children) => self.layout_row(children, style),
      NodeKind::Identifier(text) => self.layout_identifier(text, style),
      NodeKind::Number(text) => self.layout_number(text, style),
      NodeKind::Operator(text) => {
        let form = node
          .attrs
          .get("form")
          .and_then(Form::parse)
          .unwrap_or(Form::Infix);
        self.layout_operator(text, &node.attrs, style, form).0
      }
      NodeKind::Text(text) => self.layout_text(text, style),
      NodeKind::Space => self.layout_space(&node.attrs, style),
      NodeKind::Fraction {
        numerator,
        denominator,
      } => self.layout_fraction(numerator, denominator, &node.attrs, style),
      NodeKind::Sqrt(radicand) => self.layout_sqrt(radicand, style),
      NodeKind::Root { radicand, degree } => self.layout_root(radicand, degree, style),
      NodeKind::Sub { base, subscript } => {
        self.layout_scripts(base, Some(subscript.as_ref()), None, style)
      }
      NodeKind::Sup { base, superscript } => {
        self.layout_scripts(base, None, Some(superscript.as_ref()), style)
      }
      NodeKind::SubSup {
        base,
        subscript,
        superscript,
      } => self.layout_scripts(
        base,
        Some(subscript.as_ref()),
        Some(superscript.as_ref()),
        style,
      ),
      NodeKind::Under { base, under } => {
        self.layout_under_over(base, Some(under.as_ref()), None, &node.attrs, style)
      }
      NodeKind::Over { base, over } => {
        self.layout_under_over(base, None, Some(over.as_ref()), &node.attrs, style)
      }
      NodeKind::UnderOver { base, under, over } => self.layout_under_over(
        base,
        Some(under.as_ref()),
        Some(over.as_ref()),
        &node.attrs,
        style,
      ),
      NodeKind::Multiscripts {
        base,
        prescripts,
        postscripts,
      } => self.layout_multiscripts(base, prescripts, postscripts, style),
      NodeKind::Enclose(child) => self.layout_enclose(child, &node.attrs, style),
      NodeKind::Table(rows) => self.layout_table(rows, &node.attrs, style),
      NodeKind::Style(children) => self.layout_row(children, style),
      NodeKind::Padded(children) => self.layout_padded(children, &node.attrs, style),
      NodeKind::Phantom(children) => {
        let mut laid = self.layout_row(children, style);
        laid.fragments.clear();
        laid
      }
      NodeKind::None => LayoutBox::empty(),
    }
  }

  // ===========================================================================
  // Glyph resolution and token layouts
  // ===========================================================================

  /// Maps a character through the styled-codepoint table and looks up its
  /// glyph, falling back to the unstyled character when the font lacks the
  /// styled one.
  pub(crate) fn resolve_glyph(&self, ch: char, variant: MathVariant) -> Option<(u16, char)> {
    let styled = styled_char(ch, variant);
    if let Some(gid) = self.face.glyph_index(styled) {
      return Some((gid, styled));
    }
    self.face.glyph_index(ch).map(|gid| (gid, ch))
  }

  /// Replacement box for characters the font cannot draw: a stroked
  /// em-square at the current size.
  fn missing_glyph_box(&self, ch: char, style: &Style) -> LayoutBox {
    tracing::warn!(codepoint = ch as u32, "glyph not found, drawing replacement box");
    let size = style.glyph_size(&self.constants, &self.config);
    let ascent = size * 0.8;
    let descent = size * 0.2;
    LayoutBox {
      width: size,
      ascent,
      descent,
      fragments: vec![Fragment::StrokeRect {
        x: size * 0.05,
        y: -ascent,
        width: size * 0.9,
        height: ascent + descent,
        radius: 0.0,
        line_width: size * 0.05,
        color: color_of(style),
        fill: None,
      }],
      ..LayoutBox::default()
    }
  }

  /// Lays out a run of characters with zero inter-glyph spacing.
  pub(crate) fn glyph_run(&self, text: &str, style: &Style, variant: MathVariant) -> LayoutBox {
    let size = style.glyph_size(&self.constants, &self.config);
    let em = self.em_scale(style);
    let mut out = LayoutBox::empty();
    let mut x = 0.0;
    for ch in text.chars() {
      let Some((gid, resolved)) = self.resolve_glyph(ch, variant) else {
        let missing = self.missing_glyph_box(ch, style);
        let advance = missing.width;
        out.push_box(x, 0.0, missing);
        x += advance;
        continue;
      };
      let metrics = self.face.glyph_metrics(gid);
      out.fragments.push(Fragment::Glyph(GlyphFragment {
        glyph_id: gid,
        ch: resolved,
        x,
        y: 0.0,
        size,
        color: color_of(style),
        font_key: self.font_key(),
      }));
      let glyph_ref = GlyphRef {
        metrics,
        size,
        ch: resolved,
      };
      if out.first_glyph.is_none() {
        out.first_glyph = Some(glyph_ref);
      }
      out.last_glyph = Some(glyph_ref);
      out.ascent = out.ascent.max(metrics.bounds.y_max * em);
      out.descent = out.descent.max(-metrics.bounds.y_min * em);
      if x == 0.0 {
        out.left_bearing = metrics.bounds.x_min * em;
      }
      x += metrics.advance * em;
      out.right_bearing = (metrics.advance - metrics.bounds.x_max) * em;
      out.italic_correction = metrics.italic_correction * em;
    }
    out.width = x;
    if let Some(glyph) = out.last_glyph {
      if out.fragments.len() == 1 {
        out.top_accent_attachment = glyph.metrics.top_accent_attachment.map(|v| v * em);
      }
    }
    out
  }

  fn layout_identifier(&self, text: &str, style: &Style) -> LayoutBox {
    let mut chars = text.chars();
    let (first, single) = match (chars.next(), chars.next()) {
      (Some(first), None) => (Some(first), true),
      (first, _) => (first, false),
    };
    let variant = match style.variant {
      Some(v) => v,
      None if single && first.map(auto_italic).unwrap_or(false) => MathVariant::Italic,
      None => MathVariant::Normal,
    };
    self.glyph_run(text, style, variant)
  }

  fn layout_number(&self, text: &str, style: &Style) -> LayoutBox {
    self.glyph_run(text, style, style.variant.unwrap_or(MathVariant::Normal))
  }

  fn layout_text(&self, text: &str, style: &Style) -> LayoutBox {
    let cleaned = clean_mtext(text);
    self.glyph_run(&cleaned, style, style.variant.unwrap_or(MathVariant::Normal))
  }

  /// Lays out an operator token without its dictionary spacing; the row
  /// emits lspace/rspace as whitespace around the returned box.
  pub(crate) fn layout_operator(
    &self,
    text: &str,
    attrs: &NodeAttrs,
    style: &Style,
    form: Form,
  ) -> (LayoutBox, OperatorRecord) {
    let record = self.operator_record(text, attrs, form);
    // ASCII digraphs and hyphens map to the real math codepoints.
    let text: String = match text {
      ":=" => "\u{2254}".to_string(),
      "==" => "\u{2A75}".to_string(),
      "!=" => "\u{2260}".to_string(),
      other => other
        .chars()
        .map(|c| if c == '-' { '\u{2212}' } else { c })
        .collect(),
    };
    let variant = style.variant.unwrap_or(MathVariant::Normal);
    let mut laid = self.glyph_run(&text, style, variant);

    if record.largeop() && style.display_style {
      if let Some(glyph) = laid.last_glyph.filter(|_| laid.fragments.len() == 1) {
        let em = self.em_scale(style);
        let target = self.constants.display_operator_min_height * em;
        if let Some(grown) = self.stretch_glyph_vertical(glyph, target, style) {
          laid = self.center_on_axis(grown, style);
        }
      }
    }
    (laid, record)
  }

  /// Resolves the operator record for `(text, form)` with attribute
  /// overrides. Multi-character names (sin, lim, …) get function spacing.
  pub(crate) fn operator_record(&self, text: &str, attrs: &NodeAttrs, form: Form) -> OperatorRecord {
    let mut chars = text.chars();
    let record = match (chars.next(), chars.next()) {
      (Some(ch), None) => operators::lookup(ch, form),
      _ if operators::is_operator_name(text) => {
        operators::function_record(matches!(text, "lim" | "liminf" | "limsup" | "max" | "min"))
      }
      _ => operators::DEFAULT_RECORD,
    };
    operators::apply_attributes(record, |name| attrs.get(name).map(str::to_string))
  }

  fn layout_space(&self, attrs: &NodeAttrs, style: &Style) -> LayoutBox {
    let size = style.glyph_size(&self.constants, &self.config);
    let x_height = self.face.x_height() * self.em_scale(style);
    let resolve = |name: &str| {
      attrs
        .get(name)
        .and_then(|v| parse_length(v).ok())
        .map(|len| len.resolve(size, x_height))
        .unwrap_or(0.0)
    };
    LayoutBox {
      width: resolve("width"),
      ascent: resolve("height"),
      descent: resolve("depth"),
      ..LayoutBox::default()
    }
  }

  fn layout_padded(&self, children: &[MathNode], attrs: &NodeAttrs, style: &Style) -> LayoutBox {
    let mut laid = self.layout_row(children, style);
    let size = style.glyph_size(&self.constants, &self.config);
    let x_height = self.face.x_height() * self.em_scale(style);
    let adjust = |current: f32, value: Option<&str>| -> f32 {
      let Some(value) = value else { return current };
      let value = value.trim();
      let (signed, body) = match value.as_bytes().first() {
        Some(b'+') => (1.0, &value[1..]),
        Some(b'-') => (-1.0, &value[1..]),
        _ => (0.0, value),
      };
      let Ok(length) = parse_length(body) else {
        return current;
      };
      let resolved = length.resolve_against(current, size, x_height);
      if signed != 0.0 {
        current + signed * resolved
      } else {
        resolved
      }
    };
    laid.width = adjust(laid.width, attrs.get("width")).max(0.0);
    laid.ascent = adjust(laid.ascent, attrs.get("height"));
    laid.descent = adjust(laid.descent, attrs.get("depth"));
    if let Some(lspace) = attrs.get("lspace") {
      let shift = adjust(0.0, Some(lspace));
      laid.translate(shift, 0.0);
      laid.width += shift;
    }
    laid
  }

  // ===========================================================================
  // Row layout
  // ===========================================================================

  /// Lays out a horizontal row: operator forms, dictionary spacing,
  /// stretchy growth, and line breaks on `<mspace linebreak="newline"/>`.
  pub fn layout_row(&self, children: &[MathNode], style: &Style) -> LayoutBox {
    let mut lines: Vec<&[MathNode]> = Vec::new();
    let mut start = 0;
    for (idx, child) in children.iter().enumerate() {
      let newline = matches!(child.kind, NodeKind::Space)
        && child
          .attrs
          .get("linebreak")
          .map(|v| v.eq_ignore_ascii_case("newline"))
          .unwrap_or(false);
      if newline {
        lines.push(&children[start..idx]);
        start = idx + 1;
      }
    }
    lines.push(&children[start..]);

    if lines.len() == 1 {
      return self.layout_line(lines[0], style);
    }

    // Stack lines, left aligned, with twice the math leading between them.
    let em = self.em_scale(style);
    let leading = self.constants.math_leading * em * 2.0;
    let mut out = LayoutBox::empty();
    let mut baseline_y = 0.0;
    let mut prev_descent = 0.0;
    for (idx, line) in lines.iter().enumerate() {
      let laid = self.layout_line(line, style);
      if idx > 0 {
        baseline_y += prev_descent + leading + laid.ascent;
      }
      prev_descent = laid.descent;
      out.width = out.width.max(laid.width);
      out.push_box(0.0, baseline_y, laid);
    }
    out
  }

  fn layout_line(&self, children: &[MathNode], style: &Style) -> LayoutBox {
    struct Item<'n> {
      node: &'n MathNode,
      laid: LayoutBox,
      record: Option<OperatorRecord>,
      op_char: Option<char>,
      stretch_pending: bool,
    }

    // Empty operators (InvisibleTimes and friends) take no space at all.
    let children: Vec<&MathNode> = children
      .iter()
      .filter(|c| !matches!(&c.kind, NodeKind::Operator(text) if text.is_empty()))
      .collect();
    if children.is_empty() {
      return LayoutBox::empty();
    }

    let nonspace: Vec<usize> = children
      .iter()
      .enumerate()
      .filter(|(_, c)| !matches!(c.kind, NodeKind::Space))
      .map(|(i, _)| i)
      .collect();
    let first_nonspace = nonspace.first().copied();
    let last_nonspace = nonspace.last().copied();

    let mut items: Vec<Item> = Vec::with_capacity(children.len());
    for (idx, child) in children.iter().enumerate() {
      let child: &MathNode = *child;
      let child_style = style.for_attrs(&child.attrs);
      if let NodeKind::Operator(text) = &child.kind {
        let form = child.attrs.get("form").and_then(Form::parse).unwrap_or({
          if Some(idx) == first_nonspace {
            Form::Prefix
          } else if Some(idx) == last_nonspace {
            Form::Postfix
          } else {
            Form::Infix
          }
        });
        let mut record = self.operator_record(text, &child.attrs, form);
        if self.suppress_separator_space(text, idx, &children) {
          record.lspace = 0.0;
          record.rspace = 0.0;
        }
        let (laid, _) = self.layout_operator(text, &child.attrs, &child_style, form);
        let stretch_pending = record.stretchy()
          && !(record.largeop() && child_style.display_style)
          && text.chars().count() == 1;
        items.push(Item {
          node: child,
          laid,
          record: Some(record),
          op_char: text.chars().next(),
          stretch_pending,
        });
      } else {
        let laid = self.layout_with_style(child, &child_style);
        items.push(Item {
          node: child,
          laid,
          record: None,
          op_char: None,
          stretch_pending: false,
        });
      }
    }

    // Stretchy target from the non-stretchy siblings.
    let mut target_ascent: f32 = 0.0;
    let mut target_descent: f32 = 0.0;
    let mut has_subformula = false;
    for item in items.iter().filter(|i| !i.stretch_pending) {
      target_ascent = target_ascent.max(item.laid.ascent);
      target_descent = target_descent.max(item.laid.descent);
      has_subformula |= is_subformula(item.node);
    }
    if items.iter().any(|i| i.stretch_pending) && (target_ascent > 0.0 || target_descent > 0.0) {
      let em = self.em_scale(style);
      if has_subformula {
        let min = self.constants.delimited_sub_formula_min_height * em;
        let height = target_ascent + target_descent;
        if height < min && height > 0.0 {
          let grow = (min - height) / 2.0;
          target_ascent += grow;
          target_descent += grow;
        }
      }
      for item in items.iter_mut().filter(|i| i.stretch_pending) {
        let Some(glyph) = item.laid.last_glyph else {
          continue;
        };
        let record = item.record.unwrap_or(operators::DEFAULT_RECORD);
        // minsize/maxsize clamp the stretch target, scaling both extents.
        let mut ascent = target_ascent;
        let mut descent = target_descent;
        let height = ascent + descent;
        let attr_size = |name: &str| {
          item.node.attrs.get(name).and_then(|v| {
            parse_length(v)
              .ok()
              .map(|len| len.resolve(em_px(self, style), em_px(self, style) * 0.5))
          })
        };
        if let Some(min) = attr_size("minsize") {
          if height > 0.0 && height < min {
            let f = min / height;
            ascent *= f;
            descent *= f;
          }
        }
        if let Some(max) = attr_size("maxsize") {
          if height > max {
            let f = max / height;
            ascent *= f;
            descent *= f;
          }
        }
        let stretched =
          self.stretch_to_extent(glyph, ascent, descent, record.symmetric(), style);
        match stretched {
          Some(grown) => item.laid = grown,
          None => {
            if let Some(ch) = item.op_char {
              tracing::warn!(
                codepoint = ch as u32,
                target = target_ascent + target_descent,
                "no variant or assembly reaches stretch target"
              );
            }
          }
        }
      }
    }

    // Assemble with dictionary spacing as pure whitespace.
    let em_size = style.glyph_size(&self.constants, &self.config);
    let mut out = LayoutBox::empty();
    let mut x = 0.0;
    let mut prev_was_fraction = false;
    let mut any_placed = false;
    for item in items {
      let spacing_on = item.record.is_some() && !style.in_script;
      if let (true, Some(record)) = (spacing_on, item.record) {
        x += record.lspace / 18.0 * em_size;
      }
      if item.laid.is_fraction && any_placed {
        let lead = if prev_was_fraction {
          VERY_THIN_SPACE_EM
        } else {
          THIN_SPACE_EM
        };
        x += lead * em_size;
      }
      prev_was_fraction = item.laid.is_fraction;
      any_placed = true;

      let width = item.laid.width;
      let italic = item.laid.italic_correction;
      let accent = item.laid.top_accent_attachment;
      out.push_box(x, 0.0, item.laid);
      x += width;
      if let (true, Some(record)) = (spacing_on, item.record) {
        x += record.rspace / 18.0 * em_size;
      }
      out.italic_correction = italic;
      out.top_accent_attachment = accent;
    }
    out.width = x;
    if out.fragments.len() > 1 {
      out.top_accent_attachment = None;
    }
    out
  }

  /// With `decimal_separator = ','`, a comma between two digits is a
  /// decimal mark, not a list separator: it gets no surrounding space.
  fn suppress_separator_space(&self, text: &str, idx: usize, children: &[&MathNode]) -> bool {
    if self.config.decimal_separator != ',' || text != "," {
      return false;
    }
    let prev_digit = idx
      .checked_sub(1)
      .and_then(|i| children.get(i))
      .map(|node| match &node.kind {
        NodeKind::Number(text) => text.chars().last().map(|c| c.is_ascii_digit()).unwrap_or(false),
        _ => false,
      })
      .unwrap_or(false);
    let next_digit = children
      .get(idx + 1)
      .map(|node| match &node.kind {
        NodeKind::Number(text) => text.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false),
        _ => false,
      })
      .unwrap_or(false);
    prev_digit && next_digit
  }
}

fn em_px(ctx: &MathLayoutContext, style: &Style) -> f32 {
  style.glyph_size(&ctx.constants, &ctx.config)
}

/// Text-token cleanup: tabs become spaces, runs of three or more hyphens
/// collapse into one em dash. Shorter runs pass through unchanged.
fn clean_mtext(text: &str) -> String {
  let mut cleaned = String::with_capacity(text.len());
  let mut hyphens = 0usize;
  for ch in text.chars() {
    let ch = if ch == '\t' { ' ' } else { ch };
    if ch == '-' {
      hyphens += 1;
      continue;
    }
    flush_hyphens(&mut cleaned, hyphens);
    hyphens = 0;
    cleaned.push(ch);
  }
  flush_hyphens(&mut cleaned, hyphens);
  cleaned
}

fn flush_hyphens(out: &mut String, count: usize) {
  if count >= 3 {
    out.push('\u{2014}');
  } else {
    for _ in 0..count {
      out.push('-');
    }
  }
}

pub(crate) fn color_of(style: &Style) -> Option<String> {
  if style.color.is_empty() {
    None
  } else {
    Some(style.color.clone())
  }
}

/// Whether a node is a composite subformula for the purposes of the
/// delimited-subformula minimum fence height.
fn is_subformula(node: &MathNode) -> bool {
  matches!(
    node.kind,
    NodeKind::Fraction { .. }
      | NodeKind::Table(_)
      | NodeKind::Sqrt(_)
      | NodeKind::Root { .. }
      | NodeKind::UnderOver { .. }
      | NodeKind::SubSup { .. }
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mtext_cleanup_collapses_long_hyphen_runs() {
    assert_eq!(clean_mtext("a---b"), "a\u{2014}b");
    assert_eq!(clean_mtext("a-----b"), "a\u{2014}b");
    assert_eq!(clean_mtext("---"), "\u{2014}");
  }

  #[test]
  fn mtext_cleanup_keeps_short_hyphen_runs() {
    assert_eq!(clean_mtext("a-b"), "a-b");
    assert_eq!(clean_mtext("a--b"), "a--b");
    assert_eq!(clean_mtext("--"), "--");
  }

  #[test]
  fn mtext_cleanup_replaces_tabs() {
    assert_eq!(clean_mtext("a\tb"), "a b");
  }
}
