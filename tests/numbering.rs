//! Global state tests: equation numbering and configuration snapshots.
//!
//! Everything that mutates the process-global configuration lives in this
//! one test so parallel test threads never observe a half-applied state.

mod common;

use mathrender::config::{next_equation_number, reset_numbering, Config};
use mathrender::Math;

#[test]
fn numbering_and_config_sequence() {
  // Counter semantics are independent of fonts.
  reset_numbering(1);
  assert_eq!(next_equation_number(), 1);
  assert_eq!(next_equation_number(), 2);
  reset_numbering(10);
  assert_eq!(next_equation_number(), 10);
  reset_numbering(1);

  let Some(_font) = common::test_font() else {
    return;
  };

  // Autonumbered renders advance the counter and widen the document to
  // the configured column.
  Config::update(|c| {
    c.numbering.autonumber = true;
    c.numbering.columnwidth = "10in".to_string();
  });
  reset_numbering(1);
  let first = Math::new("<math><mi>a</mi></math>").unwrap().svg().unwrap();
  let second = Math::new("<math><mi>b</mi></math>").unwrap().svg().unwrap();
  Config::update(|c| {
    c.numbering.autonumber = false;
    c.numbering.columnwidth = "6.5in".to_string();
  });
  assert_eq!(next_equation_number(), 3, "two renders consumed two numbers");
  reset_numbering(1);

  // A 10 in column dominates the width of a single identifier.
  let width_of = |svg: &str| -> f32 {
    let start = svg.find("width=\"").map(|i| i + 7).unwrap_or(0);
    svg[start..]
      .split('"')
      .next()
      .and_then(|v| v.parse().ok())
      .unwrap_or(0.0)
  };
  assert!(width_of(&first) > 900.0, "tag column not honored: {}", width_of(&first));
  assert!(width_of(&second) > 900.0);

  // Decimal separator: with ',' no space is inserted between digits.
  let narrow;
  let wide;
  {
    Config::update(|c| c.decimal_separator = ',');
    narrow = Math::new("<math><mrow><mn>1</mn><mo>,</mo><mn>2</mn></mrow></math>")
      .unwrap()
      .bounds()
      .unwrap()
      .0;
    Config::update(|c| c.decimal_separator = '.');
    wide = Math::new("<math><mrow><mn>1</mn><mo>,</mo><mn>2</mn></mrow></math>")
      .unwrap()
      .bounds()
      .unwrap()
      .0;
  }
  assert!(
    wide > narrow + 24.0 * 2.0 / 18.0,
    "comma spacing not suppressed: wide {wide} narrow {narrow}"
  );

  // SVG 1.1 mode inlines paths instead of symbol references.
  Config::update(|c| c.svg2 = false);
  let svg11 = Math::new("<math><mi>x</mi></math>").unwrap().svg().unwrap();
  Config::update(|c| c.svg2 = true);
  let svg2 = Math::new("<math><mi>x</mi></math>").unwrap().svg().unwrap();
  assert!(svg11.contains("<path") && !svg11.contains("<use"));
  assert!(svg2.contains("<use") && svg2.contains("<symbol"));
}
