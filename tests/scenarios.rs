//! End-to-end scenarios
//!
//! Concrete renders checked against the MATH constants of the discovered
//! font: superscript placement, fraction bars, radicals, stretched fences.
//! Skipped without an installed MATH font.

mod common;

use mathrender::config::Config;
use mathrender::layout::boxes::{Fragment, LayoutBox};
use mathrender::layout::MathLayoutContext;
use mathrender::mathml::parse_mathml;
use mathrender::style::Style;

fn layout(ctx: &MathLayoutContext, config: &Config, mathml: &str, display: bool) -> LayoutBox {
  let node = parse_mathml(mathml).expect("parses");
  let style = Style::root(24.0, display, config);
  ctx.layout(&node, &style)
}

fn glyphs(layout: &LayoutBox) -> Vec<(f32, f32, f32)> {
  layout
    .fragments
    .iter()
    .filter_map(|f| match f {
      Fragment::Glyph(g) => Some((g.x, g.y, g.size)),
      _ => None,
    })
    .collect()
}

fn rules(layout: &LayoutBox) -> Vec<(f32, f32, f32, f32)> {
  layout
    .fragments
    .iter()
    .filter_map(|f| match f {
      Fragment::Rule {
        x,
        y,
        width,
        height,
        ..
      } => Some((*x, *y, *width, *height)),
      _ => None,
    })
    .collect()
}

#[test]
fn superscript_is_raised_shifted_and_scaled() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let laid = layout(
    &ctx,
    &config,
    "<math><msup><mi>x</mi><mn>2</mn></msup></math>",
    true,
  );
  let glyphs = glyphs(&laid);
  assert_eq!(glyphs.len(), 2);
  let (base_x, base_y, base_size) = glyphs[0];
  let (sup_x, sup_y, sup_size) = glyphs[1];
  assert_eq!(base_x, 0.0);
  assert_eq!(base_y, 0.0);

  let em = base_size / font.units_per_em();
  let consts = font.constants();
  // Raised at least to SuperscriptShiftUp (kerning may tweak x, never y
  // downward below the shift).
  assert!(
    -sup_y >= consts.superscript_shift_up * em - 0.01,
    "superscript raise {} below SuperscriptShiftUp {}",
    -sup_y,
    consts.superscript_shift_up * em
  );
  // Shifted right past the base advance (italic correction is >= 0).
  let face = font.face().expect("face");
  let x_gid = face.glyph_index('\u{1D465}').or_else(|| face.glyph_index('x'));
  if let Some(gid) = x_gid {
    let advance = face.advance(gid) * em;
    assert!(
      sup_x >= advance - 1.0,
      "superscript x {sup_x} not past base advance {advance}"
    );
  }
  // Scaled by the script factor.
  let expected = base_size * consts.script_percent_scale_down / 100.0;
  assert!((sup_size - expected.max(base_size * config.min_size_fraction)).abs() < 0.5);
}

#[test]
fn fraction_bar_and_shifts() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  // Text style: scripts shrink and the text-style shift constants apply.
  let laid = layout(
    &ctx,
    &config,
    "<math display=\"inline\"><mfrac><mn>1</mn><mn>2</mn></mfrac></math>",
    false,
  );
  let consts = font.constants();
  let glyphs = glyphs(&laid);
  assert_eq!(glyphs.len(), 2);
  let em = 24.0 / font.units_per_em();

  let rules = rules(&laid);
  assert_eq!(rules.len(), 1, "fraction draws exactly one bar");
  let (_, _, bar_width, bar_height) = rules[0];
  assert!(
    (bar_height - consts.fraction_rule_thickness * em).abs() < 0.1,
    "bar thickness {} vs FractionRuleThickness {}",
    bar_height,
    consts.fraction_rule_thickness * em
  );

  let (num_x, num_y, num_size) = glyphs[0];
  let (den_x, den_y, _) = glyphs[1];
  assert!(num_y < 0.0, "numerator below baseline");
  assert!(den_y > 0.0, "denominator above baseline");
  let num_em = num_size / font.units_per_em();
  assert!(
    -num_y >= consts.fraction_numerator_shift_up * em - 0.5
      || -num_y >= consts.fraction_numerator_gap_min * em,
    "numerator raise too small: {num_y}"
  );
  // Bar spans the wider part plus a tab on each side.
  let face = font.face().expect("face");
  if let Some(gid) = face.glyph_index('1') {
    let digit_width = face.advance(gid) * num_em;
    assert!(bar_width > digit_width, "bar narrower than digits");
  }
  // Digits centered over the same axis.
  assert!((num_x - den_x).abs() < 1.0);
}

#[test]
fn cube_root_places_degree_and_overbar() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let radicand_only = layout(
    &ctx,
    &config,
    "<math><mrow><mi>x</mi><mo>+</mo><mn>1</mn></mrow></math>",
    true,
  );
  let root = layout(
    &ctx,
    &config,
    "<math><mroot><mrow><mi>x</mi><mo>+</mo><mn>1</mn></mrow><mn>3</mn></mroot></math>",
    true,
  );
  let consts = font.constants();
  let em = 24.0 / font.units_per_em();

  // Radical construction adds the vertical gap and rule above the
  // radicand.
  let min_height = radicand_only.height()
    + consts.radical_vertical_gap.min(consts.radical_display_style_vertical_gap) * em
    + consts.radical_rule_thickness * em;
  assert!(
    root.height() >= min_height - 0.5,
    "radical height {} below required {}",
    root.height(),
    min_height
  );

  // Overbar at least as wide as the radicand.
  let overbar = rules(&root)
    .into_iter()
    .max_by(|a, b| a.2.total_cmp(&b.2))
    .expect("overbar drawn");
  assert!(overbar.2 >= radicand_only.width - 0.5);
  assert!(overbar.1 < 0.0, "overbar above the baseline");

  // The degree digit is drawn above the baseline, smaller than the
  // radicand glyphs.
  let glyphs = glyphs(&root);
  let degree = glyphs
    .iter()
    .min_by(|a, b| a.2.total_cmp(&b.2))
    .expect("degree glyph");
  assert!(degree.2 < 24.0 * 0.8);
  assert!(degree.1 < 0.0);
}

#[test]
fn fences_stretch_to_fraction_height() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let short = layout(
    &ctx,
    &config,
    "<math><mrow><mo>(</mo><mi>x</mi><mo>)</mo></mrow></math>",
    true,
  );
  let tall = layout(
    &ctx,
    &config,
    "<math><mrow><mo>(</mo><mfrac><mfrac><mn>1</mn><mn>2</mn></mfrac><mn>3</mn></mfrac><mo>)</mo></mrow></math>",
    true,
  );
  assert!(
    tall.height() > short.height() + 10.0,
    "fences did not stretch: {} vs {}",
    tall.height(),
    short.height()
  );
  // Symmetric about the math axis: ascent and descent both exceed the
  // plain row's.
  assert!(tall.ascent > short.ascent);
  assert!(tall.descent > short.descent);
}

#[test]
fn largeop_grows_in_display_style() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let display = layout(&ctx, &config, "<math><mo>&sum;</mo></math>", true);
  let inline = layout(
    &ctx,
    &config,
    "<math display=\"inline\"><mo>&sum;</mo></math>",
    false,
  );
  assert!(
    display.height() > inline.height() + 1.0,
    "largeop did not grow: {} vs {}",
    display.height(),
    inline.height()
  );
}

#[test]
fn movable_limits_swap_with_style() {
  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  let source = "<math><munderover><mo>&sum;</mo><mn>0</mn><mn>9</mn></munderover></math>";
  let node = parse_mathml(source).expect("parses");
  let display = ctx.layout(&node, &Style::root(24.0, true, &config));
  let inline = ctx.layout(&node, &Style::root(24.0, false, &config));
  // Limits above/below make the display form taller and narrower than
  // the scripted text form is tall.
  assert!(display.height() > inline.height());
  assert!(inline.width > display.width);
}

#[test]
fn declared_operator_promotes_identifier_and_spaces_it() {
  use mathrender::declare_operator;
  use mathrender::mathml::NodeKind;

  // Before declaration, a multi-character <mi> stays an identifier.
  let source = "<math><mrow><mi>spanop</mi><mi>x</mi></mrow></math>";
  let before = parse_mathml(source).expect("parses");
  let NodeKind::Math { children, .. } = &before.kind else {
    panic!("expected math root");
  };
  let NodeKind::Row(items) = &children[0].kind else {
    panic!("expected row");
  };
  assert!(matches!(items[0].kind, NodeKind::Identifier(_)));

  // Declaring the name makes the parser promote it to an operator, the
  // same path the built-in function names (sin, lim, ...) take.
  declare_operator(r"\spanop");
  let after = parse_mathml(source).expect("parses");
  let NodeKind::Math { children, .. } = &after.kind else {
    panic!("expected math root");
  };
  let NodeKind::Row(items) = &children[0].kind else {
    panic!("expected row");
  };
  assert!(matches!(items[0].kind, NodeKind::Operator(_)));

  let Some(font) = common::test_font() else {
    return;
  };
  let config = Config::default();
  let ctx = MathLayoutContext::new(&font, config.clone()).expect("context");
  // Function spacing follows the operator: the declared row is wider than
  // the same glyphs laid out as one identifier run.
  let declared = layout(&ctx, &config, source, true);
  let fused = layout(&ctx, &config, "<math><mrow><mi>spanopx</mi></mrow></math>", true);
  assert!(
    declared.width > fused.width + 24.0 * 2.0 / 18.0,
    "declared operator got no spacing: {} vs {}",
    declared.width,
    fused.width
  );
}

#[cfg(feature = "latex")]
#[test]
fn latex_round_trip_matches_mathml() {
  let Some(_font) = common::test_font() else {
    return;
  };
  let from_latex = mathrender::Math::from_latex(r"\frac{1}{2}")
    .expect("parses")
    .svg()
    .expect("renders");
  let from_mathml = mathrender::Math::new(
    "<math display=\"block\"><mfrac><mn>1</mn><mn>2</mn></mfrac></math>",
  )
  .expect("parses")
  .svg()
  .expect("renders");
  // Same glyphs, same construction: identical document dimensions.
  let dims = |svg: &str| {
    let start = svg.find("viewBox=\"").map(|i| i + 9).unwrap_or(0);
    svg[start..].split('"').next().unwrap_or("").to_string()
  };
  assert_eq!(dims(&from_latex), dims(&from_mathml));
}
