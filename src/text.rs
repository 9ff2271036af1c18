//! Mixed prose and math text blocks
//!
//! Tokenizes a string into alternating prose and math spans — `$…$` inline,
//! `$$…$$` display, `\$` escaping the delimiter — typesets each span with
//! its own font and baseline, and stacks lines into a block with
//! configurable leading, alignment and rotation.

use std::fmt::Write as _;
use std::sync::Arc;

use rustybuzz::UnicodeBuffer;

use crate::config::Config;
use crate::error::Result;
use crate::font::{GlyphSource, TextFace, TextFont};
use crate::layout::boxes::{Fragment, GlyphFragment, LayoutBox};
use crate::layout::MathLayoutContext;
use crate::mathml::parse_mathml;
use crate::render::font_for_config;
use crate::style::Style;
use crate::svg::{HAlign, SvgWriter};
use crate::tex;

/// One token of the input.
#[derive(Debug, Clone, PartialEq)]
enum Span {
  Prose(String),
  Inline(String),
  Display(String),
}

/// Splits one line into prose and math spans.
fn tokenize_line(line: &str) -> Vec<Span> {
  let mut spans = Vec::new();
  let mut prose = String::new();
  let chars: Vec<char> = line.chars().collect();
  let mut i = 0;
  while i < chars.len() {
    let ch = chars[i];
    if ch == '\\' && chars.get(i + 1) == Some(&'$') {
      prose.push('$');
      i += 2;
      continue;
    }
    if ch != '$' {
      prose.push(ch);
      i += 1;
      continue;
    }
    // A math span opens here.
    let display = chars.get(i + 1) == Some(&'$');
    let delim_len = if display { 2 } else { 1 };
    let closer = if display { "$$" } else { "$" };
    let rest: String = chars[i + delim_len..].iter().collect();
    let Some(end) = find_unescaped(&rest, closer) else {
      // Unbalanced delimiter: keep it as literal text.
      prose.push(ch);
      i += 1;
      continue;
    };
    if !prose.is_empty() {
      spans.push(Span::Prose(std::mem::take(&mut prose)));
    }
    let body: String = rest.chars().take(end).collect();
    spans.push(if display {
      Span::Display(body)
    } else {
      Span::Inline(body)
    });
    i += delim_len + end + closer.len();
  }
  if !prose.is_empty() {
    spans.push(Span::Prose(prose));
  }
  spans
}

fn find_unescaped(haystack: &str, needle: &str) -> Option<usize> {
  let chars: Vec<char> = haystack.chars().collect();
  let needle_chars: Vec<char> = needle.chars().collect();
  let mut i = 0;
  while i + needle_chars.len() <= chars.len() {
    if chars[i] == '\\' {
      i += 2;
      continue;
    }
    if chars[i..i + needle_chars.len()] == needle_chars[..] {
      return Some(i);
    }
    i += 1;
  }
  None
}

/// A block of prose with embedded math.
pub struct TextBlock {
  text: String,
  halign: HAlign,
  rotation: f32,
  size: Option<f32>,
}

impl TextBlock {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      halign: HAlign::Left,
      rotation: 0.0,
      size: None,
    }
  }

  pub fn with_halign(mut self, halign: HAlign) -> Self {
    self.halign = halign;
    self
  }

  /// Rotation in degrees, counterclockwise, about the block anchor.
  pub fn with_rotation(mut self, degrees: f32) -> Self {
    self.rotation = degrees;
    self
  }

  pub fn with_size(mut self, size: f32) -> Self {
    self.size = Some(size);
    self
  }

  /// Renders the block to a standalone SVG document.
  pub fn svg(&self) -> Result<String> {
    let config = Config::get();
    let math_font = font_for_config(&config)?;
    let text_font: Option<Arc<TextFont>> = match &config.text.textfont {
      Some(path) => Some(Arc::new(TextFont::from_path(path)?)),
      None => None,
    };
    let math_ctx = MathLayoutContext::new(&math_font, config.clone())?;
    let text_face = text_font.as_ref().map(|f| f.face()).transpose()?;

    let font_size = self.size.unwrap_or(config.text.fontsize);
    let leading = config.text.linespacing * font_size;

    // Lay out each line: spans share a baseline, lines stack.
    let mut lines: Vec<LayoutBox> = Vec::new();
    for line in self.text.split('\n') {
      let mut line_box = LayoutBox::empty();
      let mut x = 0.0;
      for span in tokenize_line(line) {
        let laid = match span {
          Span::Prose(text) => match &text_face {
            Some(face) => shape_prose(face, &text, font_size, &config),
            None => {
              // No text font configured: prose uses the math font upright.
              let style = prose_style(font_size, &config);
              math_ctx.glyph_run(&text, &style, crate::variant::MathVariant::Normal)
            }
          },
          Span::Inline(latex) => self.math_span(&math_ctx, &latex, true, font_size, &config)?,
          Span::Display(latex) => self.math_span(&math_ctx, &latex, false, font_size, &config)?,
        };
        let width = laid.width;
        line_box.push_box(x, 0.0, laid);
        x += width;
      }
      line_box.width = x;
      lines.push(line_box);
    }

    let block_width = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
    let mut block = LayoutBox::empty();
    let mut baseline = 0.0;
    let mut prev_descent = 0.0;
    for (idx, line) in lines.into_iter().enumerate() {
      if idx > 0 {
        baseline += leading.max(prev_descent + line.ascent);
      }
      prev_descent = line.descent;
      let x = match self.halign {
        HAlign::Left => 0.0,
        HAlign::Center => (block_width - line.width) / 2.0,
        HAlign::Right => block_width - line.width,
      };
      block.push_box(x, baseline, line);
    }
    block.width = block_width;

    let mut writer = SvgWriter::new(&config);
    writer.add_face(&math_ctx.face);
    if let Some(face) = &text_face {
      writer.add_face(face);
    }
    let body = writer.document(&block)?;
    if self.rotation == 0.0 {
      return Ok(body);
    }
    // Rotate the whole block about its anchor inside the document.
    let open_end = body.find('>').map(|i| i + 1).unwrap_or(0);
    let (head, rest) = body.split_at(open_end);
    let tail = rest.strip_suffix("</svg>").unwrap_or(rest);
    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(head);
    let _ = write!(
      out,
      "<g transform=\"rotate({})\">{tail}</g></svg>",
      crate::svg::fmt_number(-self.rotation, config.precision),
    );
    Ok(out)
  }

  fn math_span(
    &self,
    ctx: &MathLayoutContext,
    latex: &str,
    inline: bool,
    font_size: f32,
    config: &Config,
  ) -> Result<LayoutBox> {
    let mathml = tex::latex_to_mathml_str(latex, inline, config)?;
    let node = parse_mathml(&mathml)?;
    let mut style = Style::root(font_size, !inline, config);
    if !config.math.color.is_empty() {
      style.color = config.math.color.clone();
    }
    Ok(ctx.layout(&node, &style))
  }
}

fn prose_style(font_size: f32, config: &Config) -> Style {
  let mut style = Style::root(font_size, false, config);
  style.variant = crate::variant::MathVariant::parse(&config.text.variant);
  style.color = config.text.color.clone();
  style
}

/// Shapes a prose span with rustybuzz and emits positioned glyphs.
fn shape_prose(face: &TextFace, text: &str, font_size: f32, config: &Config) -> LayoutBox {
  let mut buffer = UnicodeBuffer::new();
  buffer.push_str(text);
  buffer.set_direction(rustybuzz::Direction::LeftToRight);
  let output = rustybuzz::shape(&face.buzz, &[], buffer);
  let scale = font_size / face.units_per_em();

  let color = if config.text.color.is_empty() {
    None
  } else {
    Some(config.text.color.clone())
  };
  let mut out = LayoutBox::empty();
  let mut x = 0.0;
  let infos = output.glyph_infos();
  let positions = output.glyph_positions();
  for (info, pos) in infos.iter().zip(positions) {
    out.fragments.push(Fragment::Glyph(GlyphFragment {
      glyph_id: info.glyph_id as u16,
      ch: ' ',
      x: x + pos.x_offset as f32 * scale,
      y: -(pos.y_offset as f32) * scale,
      size: font_size,
      color: color.clone(),
      font_key: face.key(),
    }));
    x += pos.x_advance as f32 * scale;
  }
  out.width = x;
  out.ascent = face.ascender() * scale;
  out.descent = -face.descender() * scale;
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenizes_prose_and_math() {
    let spans = tokenize_line("The value $x^2$ grows.");
    assert_eq!(
      spans,
      vec![
        Span::Prose("The value ".to_string()),
        Span::Inline("x^2".to_string()),
        Span::Prose(" grows.".to_string()),
      ]
    );
  }

  #[test]
  fn tokenizes_display_spans() {
    let spans = tokenize_line("before $$\\sum_i x_i$$ after");
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[1], Span::Display("\\sum_i x_i".to_string()));
  }

  #[test]
  fn escaped_dollar_is_literal() {
    let spans = tokenize_line(r"costs \$5 total");
    assert_eq!(spans, vec![Span::Prose("costs $5 total".to_string())]);
  }

  #[test]
  fn unbalanced_dollar_stays_text() {
    let spans = tokenize_line("lonely $ sign");
    assert_eq!(spans, vec![Span::Prose("lonely $ sign".to_string())]);
  }

  #[test]
  fn adjacent_math_spans() {
    let spans = tokenize_line("$a$$b$");
    // `$a$` then `$b$`: the tokenizer must not read `$$` as display here.
    assert_eq!(
      spans,
      vec![Span::Inline("a".to_string()), Span::Inline("b".to_string())]
    );
  }

  #[test]
  fn renders_mixed_block() {
    if crate::font::tests::test_font().is_none() {
      return;
    }
    let svg = TextBlock::new("Euler: $e^{i\\pi} + 1 = 0$")
      .svg()
      .expect("renders");
    assert!(svg.starts_with("<svg"));
  }

  #[test]
  fn multiline_blocks_render() {
    if crate::font::tests::test_font().is_none() {
      return;
    }
    let svg = TextBlock::new("line one\nline $x$ two")
      .with_halign(HAlign::Center)
      .with_rotation(15.0)
      .svg()
      .expect("renders");
    assert!(svg.contains("rotate("));
  }
}
