//! Layout style context
//!
//! An immutable scope object threaded down the node tree. Each node derives
//! a child style from its parent's plus its own attributes; nothing is
//! mutated in place.

use crate::config::Config;
use crate::font::MathConstants;
use crate::length::parse_length;
use crate::mathml::NodeAttrs;
use crate::variant::MathVariant;

/// Style scope for one subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
  /// Base font size in px (scripts scale `glyph_size`, not this).
  pub font_size: f32,
  /// Script nesting depth; sizes clamp at level 2.
  pub script_level: u8,
  /// Display (block) vs text (inline) layout mode.
  pub display_style: bool,
  /// Cramped contexts (under radicals, subscripts) keep superscripts low.
  pub cramped: bool,
  /// Inherited mathvariant; `None` leaves tokens to their defaults.
  pub variant: Option<MathVariant>,
  /// Fill color; empty inherits the SVG default.
  pub color: String,
  /// Background color; "none" draws nothing.
  pub background: String,
  /// Inside a sub/superscript: operator lspace/rspace is suppressed.
  pub in_script: bool,
}

impl Style {
  /// Root style for a render at `font_size`.
  pub fn root(font_size: f32, display_style: bool, config: &Config) -> Self {
    Self {
      font_size,
      script_level: 0,
      display_style,
      cramped: false,
      variant: if config.math.variant.is_empty() {
        None
      } else {
        MathVariant::parse(&config.math.variant)
      },
      color: config.math.color.clone(),
      background: config.math.background.clone(),
      in_script: false,
    }
  }

  /// Glyph size at this scope's script level, scaled by the font's
  /// percent-scale-down constants and clamped to
  /// `min_size_fraction x base size`.
  pub fn glyph_size(&self, constants: &MathConstants, config: &Config) -> f32 {
    let scale = match self.script_level {
      0 => 1.0,
      1 => constants.script_percent_scale_down / 100.0,
      _ => constants.script_script_percent_scale_down / 100.0,
    };
    let scale = if scale <= 0.0 { 0.71 } else { scale };
    (self.font_size * scale).max(self.font_size * config.min_size_fraction)
  }

  /// Child style one script level deeper. Does not flag sub/superscript
  /// context by itself: fractions reduce size but keep operator spacing.
  pub fn script(&self, cramped: bool) -> Self {
    let mut next = self.clone();
    next.script_level = self.script_level.saturating_add(1);
    next.display_style = false;
    next.cramped = self.cramped || cramped;
    next
  }

  /// Marks a true sub/superscript scope, where operator lspace/rspace is
  /// suppressed.
  pub fn scripted(&self, cramped: bool) -> Self {
    let mut next = self.script(cramped);
    next.in_script = true;
    next
  }

  /// Child style with cramping only (radicands, denominators keep size).
  pub fn cramp(&self) -> Self {
    let mut next = self.clone();
    next.cramped = true;
    next
  }

  /// Applies one element's style attributes, producing the child scope.
  /// Explicit `scriptlevel` overrides the inherited level.
  pub fn for_attrs(&self, attrs: &NodeAttrs) -> Self {
    let mut next = self.clone();
    if let Some(value) = attrs.get("mathvariant") {
      if let Some(variant) = MathVariant::parse(value) {
        next.variant = Some(variant);
      } else if value.to_ascii_lowercase().contains("bold") {
        next.variant = Some(next.variant.unwrap_or(MathVariant::Normal).embolden());
      } else {
        tracing::warn!(mathvariant = value, "unknown mathvariant");
      }
    }
    if let Some(value) = attrs.get("displaystyle") {
      next.display_style = value.eq_ignore_ascii_case("true");
    }
    if let Some(value) = attrs.get("scriptlevel") {
      if let Ok(level) = value.trim().parse::<u8>() {
        next.script_level = level;
      }
    }
    if let Some(value) = attrs.get("mathcolor") {
      next.color = value.to_string();
    }
    if let Some(value) = attrs.get("mathbackground") {
      next.background = value.to_string();
    }
    if let Some(value) = attrs.get("mathsize") {
      next.font_size = match value.trim() {
        "small" => next.font_size * 0.8,
        "normal" => next.font_size,
        "big" => next.font_size * 1.2,
        other => parse_length(other)
          .map(|len| len.resolve(next.font_size, next.font_size * 0.5).max(1.0))
          .unwrap_or(next.font_size),
      };
    }
    next
  }
}
