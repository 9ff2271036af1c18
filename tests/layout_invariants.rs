//! Layout invariant tests
//!
//! Box extents cover placed children, stretchy growth is monotonic,
//! operator forms resolve by position, script sizes step down, and
//! `<none/>` behaves like an empty `<mrow/>`. Every test skips quietly in
//! environments without an installed MATH font.

mod common;

use mathrender::config::Config;
use mathrender::layout::boxes::Fragment;
use mathrender::layout::MathLayoutContext;
use mathrender::mathml::parse_mathml;
use mathrender::style::Style;

fn layout_box(
  ctx: &MathLayoutContext,
  config: &Config,
  mathml: &str,
) -> mathrender::layout::boxes::LayoutBox {
  let node = parse_mathml(mathml).expect("parses");
  let style = Style::root(24.0, true, config);
  ctx.layout(&node, &style)
}

fn glyph_fragments(layout: &mathrender::layout::boxes::LayoutBox) -> Vec<(f32, f32, f32)> {
  layout
    .fragments
    .iter()
    .filter_map(|f| match f {
      Fragment::Glyph(g) => Some((g.x, g.y, g.size)),
      _ => None,
    })
    .collect()
}

#[test]
fn extents_are_nonnegative_and_cover_content() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  for mathml in [
    "<math><mi>x</mi></math>",
    "<math><mfrac><mn>1</mn><mn>2</mn></mfrac></math>",
    "<math><msubsup><mi>x</mi><mn>0</mn><mn>2</mn></msubsup></math>",
    "<math><msqrt><mi>x</mi></msqrt></math>",
    "<math><mtable><mtr><mtd><mn>1</mn></mtd></mtr><mtr><mtd><mn>2</mn></mtd></mtr></mtable></math>",
  ] {
    let laid = layout_box(&ctx, &config, mathml);
    assert!(laid.width > 0.0, "{mathml} has zero width");
    assert!(
      laid.ascent + laid.descent >= 0.0,
      "{mathml} violates ascent + descent >= 0"
    );
    assert!(!laid.fragments.is_empty(), "{mathml} drew nothing");
  }
}

#[test]
fn stretchy_growth_is_monotonic() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  // Same fence pair around successively taller content: the fenced row
  // never shrinks in height.
  let mut last_height = 0.0;
  for ems in [1.0f32, 2.0, 4.0, 8.0, 20.0] {
    let mathml = format!(
      "<math><mrow><mo>(</mo><mspace height=\"{0}em\" depth=\"{0}em\" width=\"1em\"/><mo>)</mo></mrow></math>",
      ems / 2.0,
    );
    let laid = layout_box(&ctx, &config, &mathml);
    let height = laid.ascent + laid.descent;
    assert!(
      height >= last_height - 0.01,
      "fence height shrank: {height} < {last_height} at {ems}em"
    );
    last_height = height;
  }
  // A 20 em span must actually have grown far beyond one glyph.
  assert!(last_height > 24.0 * 4.0, "fences never stretched: {last_height}");
}

#[test]
fn operator_forms_follow_position() {
  use mathrender::operators::{lookup, Form};
  // Dictionary side: prefix minus is tighter than infix minus.
  let prefix = lookup('\u{2212}', Form::Prefix);
  let infix = lookup('\u{2212}', Form::Infix);
  assert!(prefix.lspace < infix.lspace);
  assert!(prefix.rspace < infix.rspace);

  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  // Leading minus is prefix (tight); the same minus mid-row is infix and
  // widens the row by its spacing.
  let neg = layout_box(&ctx, &config, "<math><mrow><mo>-</mo><mi>x</mi></mrow></math>");
  let diff = layout_box(
    &ctx,
    &config,
    "<math><mrow><mi>y</mi><mo>-</mo><mi>x</mi></mrow></math>",
  );
  let y_alone = layout_box(&ctx, &config, "<math><mi>y</mi></math>");
  let spacing = diff.width - y_alone.width - neg.width;
  // Infix adds 4/18 em on each side beyond prefix's 0 + 1/18.
  assert!(
    spacing > 24.0 * 5.0 / 18.0,
    "infix spacing missing: {spacing}"
  );
}

#[test]
fn explicit_form_overrides_position() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let infix_forced = layout_box(
    &ctx,
    &config,
    "<math><mrow><mo form=\"infix\">-</mo><mi>x</mi></mrow></math>",
  );
  let prefix_default = layout_box(&ctx, &config, "<math><mrow><mo>-</mo><mi>x</mi></mrow></math>");
  assert!(infix_forced.width > prefix_default.width + 24.0 * 3.0 / 18.0);
}

#[test]
fn script_sizes_step_down_and_clamp() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let laid = layout_box(
    &ctx,
    &config,
    "<math><msup><mi>x</mi><msup><mi>y</mi><mi>z</mi></msup></msup></math>",
  );
  let glyphs = glyph_fragments(&laid);
  assert_eq!(glyphs.len(), 3);
  let (base, sup, supsup) = (glyphs[0].2, glyphs[1].2, glyphs[2].2);
  assert!(sup < base, "superscript not reduced: {sup} vs {base}");
  assert!(supsup <= sup, "nested superscript grew: {supsup} vs {sup}");
  assert!(
    supsup >= 24.0 * config.min_size_fraction - 0.01,
    "nested script below the size floor"
  );

  // Depth-5 nesting stays clamped at the floor.
  let deep = layout_box(
    &ctx,
    &config,
    "<math><msup><mi>a</mi><msup><mi>b</mi><msup><mi>c</mi><msup><mi>d</mi>\
     <msup><mi>e</mi><mi>f</mi></msup></msup></msup></msup></msup></math>",
  );
  for (_, _, size) in glyph_fragments(&deep) {
    assert!(size >= 24.0 * config.min_size_fraction - 0.01);
  }
}

#[test]
fn none_equals_empty_mrow() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let with_none = layout_box(&ctx, &config, "<math><mrow><mi>x</mi><none/></mrow></math>");
  let with_empty = layout_box(&ctx, &config, "<math><mrow><mi>x</mi><mrow/></mrow></math>");
  assert!((with_none.width - with_empty.width).abs() < 1e-4);
  assert!((with_none.ascent - with_empty.ascent).abs() < 1e-4);
  assert!((with_none.descent - with_empty.descent).abs() < 1e-4);
}

#[test]
fn unknown_element_renders_children() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let unknown = layout_box(
    &ctx,
    &config,
    "<math><mwobble><mi>x</mi><mn>1</mn></mwobble></math>",
  );
  assert!(unknown.width > 0.0);
  assert_eq!(glyph_fragments(&unknown).len(), 2);
}

#[test]
fn bold_variant_maps_alphanumerics() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  // Unicode alpha with bold variant resolves to the styled codepoint when
  // the font has it; either way something renders.
  let laid = layout_box(
    &ctx,
    &config,
    "<math><mi mathvariant=\"bold\">&alpha;</mi></math>",
  );
  assert_eq!(glyph_fragments(&laid).len(), 1);
  assert!(laid.width > 0.0);
}

#[test]
fn phantom_occupies_space_without_drawing() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let phantom = layout_box(&ctx, &config, "<math><mphantom><mi>x</mi></mphantom></math>");
  let visible = layout_box(&ctx, &config, "<math><mi>x</mi></math>");
  assert!((phantom.width - visible.width).abs() < 1e-4);
  assert!(phantom.fragments.is_empty());
}

#[test]
fn uneven_table_rows_layout() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let laid = layout_box(
    &ctx,
    &config,
    "<math><mtable><mtr><mtd><mn>1</mn></mtd><mtd><mn>2</mn></mtd><mtd><mn>3</mn></mtd></mtr>\
     <mtr><mtd><mn>4</mn></mtd></mtr></mtable></math>",
  );
  assert!(laid.width > 0.0);
  assert_eq!(glyph_fragments(&laid).len(), 4);
}
