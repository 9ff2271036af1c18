//! Layout boxes and drawing fragments
//!
//! [`LayoutBox`] is the universal typeset value: an advance width, extents
//! above and below the baseline, optical corrections, and a flat list of
//! positioned drawing fragments. Fragment coordinates are relative to the
//! box's left edge and baseline, with y growing downward (SVG convention);
//! `ascent`/`descent` measure up and down from the baseline respectively.

use crate::font::GlyphMetrics;

/// Reference to a laid-out glyph, kept as an annotation for script
/// placement (italic correction, corner kerning, extended shapes).
#[derive(Debug, Clone, Copy)]
pub struct GlyphRef {
  pub metrics: GlyphMetrics,
  /// Glyph size in px at which it was placed.
  pub size: f32,
  pub ch: char,
}

/// A positioned glyph reference.
#[derive(Debug, Clone)]
pub struct GlyphFragment {
  pub glyph_id: u16,
  pub ch: char,
  pub x: f32,
  pub y: f32,
  /// Font size in px; the serializer derives the design-unit scale.
  pub size: f32,
  pub color: Option<String>,
  /// Which loaded font the glyph came from (mixed text uses two).
  pub font_key: u32,
}

/// One drawing primitive.
#[derive(Debug, Clone)]
pub enum Fragment {
  Glyph(GlyphFragment),
  /// Filled rectangle: fraction bars, radical rules, strikes.
  Rule {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: Option<String>,
  },
  /// Stroked rectangle with optional corner radius (menclose).
  StrokeRect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius: f32,
    line_width: f32,
    color: Option<String>,
    fill: Option<String>,
  },
  /// Stroked ellipse (menclose circle).
  Ellipse {
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    line_width: f32,
    color: Option<String>,
  },
  /// Stroked line segment (diagonal strikes).
  Line {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    line_width: f32,
    color: Option<String>,
  },
}

impl Fragment {
  pub fn translate(&mut self, dx: f32, dy: f32) {
    match self {
      Fragment::Glyph(glyph) => {
        glyph.x += dx;
        glyph.y += dy;
      }
      Fragment::Rule { x, y, .. } | Fragment::StrokeRect { x, y, .. } => {
        *x += dx;
        *y += dy;
      }
      Fragment::Ellipse { cx, cy, .. } => {
        *cx += dx;
        *cy += dy;
      }
      Fragment::Line { x1, y1, x2, y2, .. } => {
        *x1 += dx;
        *y1 += dy;
        *x2 += dx;
        *y2 += dy;
      }
    }
  }
}

/// The universal typeset return value.
#[derive(Debug, Clone, Default)]
pub struct LayoutBox {
  /// Advance along the inline axis.
  pub width: f32,
  /// Extent above the baseline.
  pub ascent: f32,
  /// Extent below the baseline.
  pub descent: f32,
  /// Ink overhang before x=0 (negative side bearing).
  pub left_bearing: f32,
  /// Unused advance after the last ink.
  pub right_bearing: f32,
  /// Rightward offset applied to following superscripts.
  pub italic_correction: f32,
  /// Horizontal anchor for accents, when the box is a single glyph.
  pub top_accent_attachment: Option<f32>,
  pub fragments: Vec<Fragment>,
  pub first_glyph: Option<GlyphRef>,
  pub last_glyph: Option<GlyphRef>,
  /// Set by fraction layout so siblings can adjust their lead-in space.
  pub is_fraction: bool,
}

impl LayoutBox {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn height(&self) -> f32 {
    self.ascent + self.descent
  }

  /// Merges a child at `(dx, dy)`: dy is the child's baseline offset below
  /// this box's baseline (negative raises it). Extents grow to cover the
  /// child; the advance width is the caller's concern.
  pub fn push_box(&mut self, dx: f32, dy: f32, child: LayoutBox) {
    self.ascent = self.ascent.max(child.ascent - dy);
    self.descent = self.descent.max(child.descent + dy);
    for mut fragment in child.fragments {
      fragment.translate(dx, dy);
      self.fragments.push(fragment);
    }
    if self.first_glyph.is_none() {
      self.first_glyph = child.first_glyph;
    }
    if child.last_glyph.is_some() {
      self.last_glyph = child.last_glyph;
    }
  }

  /// Shifts every fragment, for post-hoc adjustments inside one box.
  pub fn translate(&mut self, dx: f32, dy: f32) {
    for fragment in &mut self.fragments {
      fragment.translate(dx, dy);
    }
  }

  /// Moves the baseline by `dy` (down-positive) while the ink stays put:
  /// fragments and extents are adjusted together.
  pub fn rebase(&mut self, dy: f32) {
    self.translate(0.0, -dy);
    self.ascent -= dy;
    self.descent += dy;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn glyph_box(width: f32, ascent: f32, descent: f32) -> LayoutBox {
    LayoutBox {
      width,
      ascent,
      descent,
      ..LayoutBox::default()
    }
  }

  #[test]
  fn push_box_grows_extents() {
    let mut parent = glyph_box(10.0, 8.0, 2.0);
    // Raised child: baseline 5 above the parent's.
    parent.push_box(10.0, -5.0, glyph_box(4.0, 6.0, 1.0));
    assert!((parent.ascent - 11.0).abs() < 1e-6);
    assert!((parent.descent - 2.0).abs() < 1e-6);
    // Lowered child.
    parent.push_box(14.0, 3.0, glyph_box(4.0, 2.0, 2.0));
    assert!((parent.descent - 5.0).abs() < 1e-6);
  }

  #[test]
  fn push_box_invariant_holds() {
    // ascent >= max(-dy + child.ascent), descent >= max(dy + child.descent)
    let mut parent = LayoutBox::empty();
    let children = [(0.0, -3.0, 5.0, 1.0), (6.0, 2.0, 4.0, 4.0), (9.0, 0.0, 1.0, 0.5)];
    for (dx, dy, ascent, descent) in children {
      parent.push_box(dx, dy, glyph_box(3.0, ascent, descent));
    }
    for (_, dy, ascent, descent) in children {
      assert!(parent.ascent >= ascent - dy - 1e-6);
      assert!(parent.descent >= descent + dy - 1e-6);
    }
  }

  #[test]
  fn fragments_translate_with_push() {
    let mut child = LayoutBox::empty();
    child.fragments.push(Fragment::Rule {
      x: 1.0,
      y: 2.0,
      width: 3.0,
      height: 4.0,
      color: None,
    });
    let mut parent = LayoutBox::empty();
    parent.push_box(10.0, -5.0, child);
    let Fragment::Rule { x, y, .. } = &parent.fragments[0] else {
      panic!("expected rule");
    };
    assert!((x - 11.0).abs() < 1e-6);
    assert!((y - -3.0).abs() < 1e-6);
  }

  #[test]
  fn rebase_moves_baseline() {
    let mut b = glyph_box(5.0, 4.0, 2.0);
    b.fragments.push(Fragment::Rule {
      x: 0.0,
      y: 0.0,
      width: 5.0,
      height: 1.0,
      color: None,
    });
    b.rebase(-2.0);
    assert!((b.ascent - 6.0).abs() < 1e-6);
    assert!((b.descent - 0.0).abs() < 1e-6);
    let Fragment::Rule { y, .. } = &b.fragments[0] else {
      panic!();
    };
    assert!((y - 2.0).abs() < 1e-6);
  }

  #[test]
  fn empty_box_is_zero() {
    let b = LayoutBox::empty();
    assert_eq!(b.width, 0.0);
    assert_eq!(b.height(), 0.0);
    assert!(b.fragments.is_empty());
  }
}
