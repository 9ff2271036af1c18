//! Shared helpers for integration tests.

use mathrender::font::MathFont;

/// Loads a MATH font for tests, preferring `MATHRENDER_TEST_FONT`.
///
/// Environments without any installed MATH font return `None`; callers
/// skip their font-dependent assertions in that case.
pub fn test_font() -> Option<MathFont> {
  if let Ok(path) = std::env::var("MATHRENDER_TEST_FONT") {
    if let Ok(font) = MathFont::from_path(&path) {
      return Some(font);
    }
  }
  MathFont::discover_default().ok()
}
