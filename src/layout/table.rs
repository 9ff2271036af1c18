//! Table layout
//!
//! Two passes: measure every cell to size columns and rows, then place
//! cells honoring per-table/row/cell alignment attributes. The table's
//! baseline sits so its vertical center lands on the math axis. Rows of
//! unequal length behave as if padded with empty cells.

use crate::layout::boxes::LayoutBox;
use crate::layout::MathLayoutContext;
use crate::length::parse_length;
use crate::mathml::{NodeAttrs, TableRow};
use crate::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnAlign {
  Left,
  Center,
  Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowAlign {
  Baseline,
  Top,
  Bottom,
  Center,
  Axis,
}

fn parse_column_aligns(value: Option<&str>) -> Vec<ColumnAlign> {
  value
    .map(|v| {
      v.split([' ', ','])
        .filter_map(|item| match item.trim() {
          "left" => Some(ColumnAlign::Left),
          "center" => Some(ColumnAlign::Center),
          "right" => Some(ColumnAlign::Right),
          _ => None,
        })
        .collect()
    })
    .unwrap_or_default()
}

fn parse_row_aligns(value: Option<&str>) -> Vec<RowAlign> {
  value
    .map(|v| {
      v.split([' ', ','])
        .filter_map(|item| match item.trim() {
          "baseline" => Some(RowAlign::Baseline),
          "top" => Some(RowAlign::Top),
          "bottom" => Some(RowAlign::Bottom),
          "center" => Some(RowAlign::Center),
          "axis" => Some(RowAlign::Axis),
          _ => None,
        })
        .collect()
    })
    .unwrap_or_default()
}

/// Alignment lists repeat their last entry past the end.
fn repeating<T: Copy>(values: &[T], index: usize) -> Option<T> {
  values.get(index).or(values.last()).copied()
}

impl<'a> MathLayoutContext<'a> {
  pub(crate) fn layout_table(
    &self,
    rows: &[TableRow],
    attrs: &NodeAttrs,
    style: &Style,
  ) -> LayoutBox {
    if rows.is_empty() {
      return LayoutBox::empty();
    }
    let size = style.glyph_size(&self.constants, &self.config);
    let em = self.em_scale(style);
    let x_height = self.face.x_height() * em;
    let spacing = |name: &str, default_em: f32| {
      attrs
        .get(name)
        .and_then(|v| parse_length(v).ok())
        .map(|len| len.resolve(size, x_height))
        .unwrap_or(default_em * size)
    };
    let col_spacing = spacing("columnspacing", 0.8);
    let row_spacing = spacing("rowspacing", 0.2);

    let table_col_aligns = parse_column_aligns(attrs.get("columnalign"));
    let table_row_aligns = parse_row_aligns(attrs.get("rowalign"));

    // First pass: lay out cells, collect per-column widths and per-row
    // extents above/below the row baseline.
    let mut cells: Vec<Vec<LayoutBox>> = Vec::with_capacity(rows.len());
    let mut col_widths: Vec<f32> = Vec::new();
    let mut row_ascents: Vec<f32> = Vec::with_capacity(rows.len());
    let mut row_descents: Vec<f32> = Vec::with_capacity(rows.len());
    for row in rows {
      let mut laid_row = Vec::with_capacity(row.cells.len());
      let mut ascent: f32 = 0.0;
      let mut descent: f32 = 0.0;
      for (col, cell) in row.cells.iter().enumerate() {
        let laid = self.layout(&cell.content, style);
        if col >= col_widths.len() {
          col_widths.push(laid.width);
        } else {
          col_widths[col] = col_widths[col].max(laid.width);
        }
        ascent = ascent.max(laid.ascent);
        descent = descent.max(laid.descent);
        laid_row.push(laid);
      }
      if row.cells.is_empty() {
        // An empty row still occupies one line.
        ascent = self.face.ascender() * em;
        descent = -self.face.descender() * em;
      }
      row_ascents.push(ascent);
      row_descents.push(descent);
      cells.push(laid_row);
    }

    if attrs
      .get("equalrows")
      .map(|v| v.eq_ignore_ascii_case("true"))
      .unwrap_or(false)
    {
      let ascent = row_ascents.iter().copied().fold(0.0, f32::max);
      let descent = row_descents.iter().copied().fold(0.0, f32::max);
      row_ascents.iter_mut().for_each(|v| *v = ascent);
      row_descents.iter_mut().for_each(|v| *v = descent);
    }
    if attrs
      .get("equalcolumns")
      .map(|v| v.eq_ignore_ascii_case("true"))
      .unwrap_or(false)
    {
      let width = col_widths.iter().copied().fold(0.0, f32::max);
      col_widths.iter_mut().for_each(|v| *v = width);
    }

    let total_height: f32 = row_ascents
      .iter()
      .zip(&row_descents)
      .map(|(a, d)| a + d)
      .sum::<f32>()
      + row_spacing * rows.len().saturating_sub(1) as f32;
    let width: f32 = col_widths.iter().sum::<f32>()
      + col_spacing * col_widths.len().saturating_sub(1) as f32;

    // The table baseline: vertical center offset by the math axis.
    let axis = self.axis_height(style);
    let top = -(total_height / 2.0 + axis);

    // Second pass: place cells.
    let mut out = LayoutBox::empty();
    let mut row_top = top;
    for (row_idx, (row, laid_row)) in rows.iter().zip(cells).enumerate() {
      let row_baseline = row_top + row_ascents[row_idx];
      let row_height = row_ascents[row_idx] + row_descents[row_idx];
      let row_align_default = repeating(&table_row_aligns, row_idx)
        .or_else(|| parse_row_aligns(row.attrs.get("rowalign")).first().copied())
        .unwrap_or(RowAlign::Baseline);
      let row_col_aligns = parse_column_aligns(row.attrs.get("columnalign"));
      let mut x = 0.0;
      for (col_idx, (cell, laid)) in row.cells.iter().zip(laid_row).enumerate() {
        let col_width = col_widths.get(col_idx).copied().unwrap_or(laid.width);
        let col_align = parse_column_aligns(cell.attrs.get("columnalign"))
          .first()
          .copied()
          .or_else(|| repeating(&row_col_aligns, col_idx))
          .or_else(|| repeating(&table_col_aligns, col_idx))
          .unwrap_or(ColumnAlign::Center);
        let row_align = parse_row_aligns(cell.attrs.get("rowalign"))
          .first()
          .copied()
          .unwrap_or(row_align_default);
        let cell_x = x
          + match col_align {
            ColumnAlign::Left => 0.0,
            ColumnAlign::Center => (col_width - laid.width) / 2.0,
            ColumnAlign::Right => (col_width - laid.width).max(0.0),
          };
        let cell_y = match row_align {
          RowAlign::Baseline => row_baseline,
          RowAlign::Axis => row_baseline - axis,
          RowAlign::Top => row_top + laid.ascent,
          RowAlign::Bottom => row_top + row_height - laid.descent,
          RowAlign::Center => row_top + (row_height - laid.height()) / 2.0 + laid.ascent,
        };
        out.push_box(cell_x, cell_y, laid);
        x += col_width + col_spacing;
      }
      row_top += row_height + row_spacing;
    }

    out.width = width;
    out.ascent = out.ascent.max(total_height / 2.0 + axis);
    out.descent = out.descent.max(total_height / 2.0 - axis);
    out.first_glyph = None;
    out.last_glyph = None;
    out
  }
}
