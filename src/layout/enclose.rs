//! Enclosure notations
//!
//! `menclose` draws its child, then overlays the requested notations:
//! boxes, circles, single edges, strikes, actuarial/long-division marks,
//! or a radical wrap. Padding defaults to 0.4 em per side.

use crate::layout::boxes::{Fragment, LayoutBox};
use crate::layout::{color_of, MathLayoutContext};
use crate::mathml::{MathNode, NodeAttrs};
use crate::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notation {
  Box,
  RoundedBox,
  Circle,
  Top,
  Bottom,
  Left,
  Right,
  HorizontalStrike,
  VerticalStrike,
  UpDiagonalStrike,
  DownDiagonalStrike,
  Actuarial,
  LongDiv,
  Radical,
}

fn parse_notations(value: Option<&str>) -> Vec<Notation> {
  let Some(value) = value else {
    return vec![Notation::Box];
  };
  let parsed: Vec<Notation> = value
    .split_whitespace()
    .filter_map(|item| match item {
      "box" => Some(Notation::Box),
      "roundedbox" => Some(Notation::RoundedBox),
      "circle" => Some(Notation::Circle),
      "top" => Some(Notation::Top),
      "bottom" => Some(Notation::Bottom),
      "left" => Some(Notation::Left),
      "right" => Some(Notation::Right),
      "horizontalstrike" => Some(Notation::HorizontalStrike),
      "verticalstrike" => Some(Notation::VerticalStrike),
      "updiagonalstrike" => Some(Notation::UpDiagonalStrike),
      "downdiagonalstrike" => Some(Notation::DownDiagonalStrike),
      "actuarial" => Some(Notation::Actuarial),
      "longdiv" => Some(Notation::LongDiv),
      "radical" => Some(Notation::Radical),
      other => {
        tracing::warn!(notation = other, "unknown menclose notation");
        None
      }
    })
    .collect();
  if parsed.is_empty() {
    vec![Notation::Box]
  } else {
    parsed
  }
}

impl<'a> MathLayoutContext<'a> {
  pub(crate) fn layout_enclose(
    &self,
    child: &MathNode,
    attrs: &NodeAttrs,
    style: &Style,
  ) -> LayoutBox {
    let notations = parse_notations(attrs.get("notation"));
    if notations.contains(&Notation::Radical) {
      return self.layout_sqrt(child, style);
    }

    let content = self.layout(child, style);
    let size = style.glyph_size(&self.constants, &self.config);
    let pad = size * 0.4;
    let stroke = self.constants.radical_rule_thickness * self.em_scale(style);
    let color = color_of(style);

    let width = content.width + pad * 2.0;
    let ascent = content.ascent + pad;
    let descent = content.descent + pad;
    let top = -ascent;

    let mut out = LayoutBox::empty();
    out.push_box(pad, 0.0, content);
    out.width = width;
    out.ascent = ascent;
    out.descent = descent;

    let height = ascent + descent;
    for notation in notations {
      let fragment = match notation {
        Notation::Box => Fragment::StrokeRect {
          x: 0.0,
          y: top,
          width,
          height,
          radius: 0.0,
          line_width: stroke,
          color: color.clone(),
          fill: None,
        },
        Notation::RoundedBox => Fragment::StrokeRect {
          x: 0.0,
          y: top,
          width,
          height,
          radius: stroke * 4.0,
          line_width: stroke,
          color: color.clone(),
          fill: None,
        },
        Notation::Circle => Fragment::Ellipse {
          cx: width / 2.0,
          cy: top + height / 2.0,
          rx: width / 2.0,
          ry: height / 2.0,
          line_width: stroke,
          color: color.clone(),
        },
        Notation::Top => rule(0.0, top, width, stroke, &color),
        Notation::Bottom => rule(0.0, descent - stroke, width, stroke, &color),
        Notation::Left => vrule(0.0, top, height, stroke, &color),
        Notation::Right => vrule(width - stroke, top, height, stroke, &color),
        Notation::HorizontalStrike => rule(0.0, top + height / 2.0 - stroke / 2.0, width, stroke, &color),
        Notation::VerticalStrike => vrule(width / 2.0 - stroke / 2.0, top, height, stroke, &color),
        Notation::UpDiagonalStrike => Fragment::Line {
          x1: 0.0,
          y1: descent,
          x2: width,
          y2: top,
          line_width: stroke,
          color: color.clone(),
        },
        Notation::DownDiagonalStrike => Fragment::Line {
          x1: 0.0,
          y1: top,
          x2: width,
          y2: descent,
          line_width: stroke,
          color: color.clone(),
        },
        Notation::Actuarial => {
          out.fragments.push(rule(0.0, top, width, stroke, &color));
          vrule(width - stroke, top, height, stroke, &color)
        }
        Notation::LongDiv => {
          out.fragments.push(rule(0.0, top, width, stroke, &color));
          vrule(0.0, top, height, stroke, &color)
        }
        Notation::Radical => continue,
      };
      out.fragments.push(fragment);
    }
    out
  }
}

fn rule(x: f32, y: f32, width: f32, stroke: f32, color: &Option<String>) -> Fragment {
  Fragment::Rule {
    x,
    y,
    width,
    height: stroke,
    color: color.clone(),
  }
}

fn vrule(x: f32, y: f32, height: f32, stroke: f32, color: &Option<String>) -> Fragment {
  Fragment::Rule {
    x,
    y,
    width: stroke,
    height,
    color: color.clone(),
  }
}
