//! Snapshot of the OpenType MATH constants table
//!
//! Loaded once per font and passed around as a plain record; values are in
//! font design units except the percentage fields.

use rustybuzz::ttf_parser::math;

/// All MATH constants used by the layout engine, in design units.
///
/// `script_percent_scale_down`, `script_script_percent_scale_down` and
/// `radical_degree_bottom_raise_percent` are percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathConstants {
  pub script_percent_scale_down: f32,
  pub script_script_percent_scale_down: f32,
  pub delimited_sub_formula_min_height: f32,
  pub display_operator_min_height: f32,
  pub math_leading: f32,
  pub axis_height: f32,
  pub accent_base_height: f32,
  pub flattened_accent_base_height: f32,
  pub subscript_shift_down: f32,
  pub subscript_top_max: f32,
  pub subscript_baseline_drop_min: f32,
  pub superscript_shift_up: f32,
  pub superscript_shift_up_cramped: f32,
  pub superscript_bottom_min: f32,
  pub superscript_baseline_drop_max: f32,
  pub sub_superscript_gap_min: f32,
  pub superscript_bottom_max_with_subscript: f32,
  pub space_after_script: f32,
  pub upper_limit_gap_min: f32,
  pub upper_limit_baseline_rise_min: f32,
  pub lower_limit_gap_min: f32,
  pub lower_limit_baseline_drop_min: f32,
  pub stack_top_shift_up: f32,
  pub stack_top_display_style_shift_up: f32,
  pub stack_bottom_shift_down: f32,
  pub stack_bottom_display_style_shift_down: f32,
  pub stack_gap_min: f32,
  pub stack_display_style_gap_min: f32,
  pub stretch_stack_top_shift_up: f32,
  pub stretch_stack_bottom_shift_down: f32,
  pub stretch_stack_gap_above_min: f32,
  pub stretch_stack_gap_below_min: f32,
  pub fraction_numerator_shift_up: f32,
  pub fraction_numerator_display_style_shift_up: f32,
  pub fraction_denominator_shift_down: f32,
  pub fraction_denominator_display_style_shift_down: f32,
  pub fraction_numerator_gap_min: f32,
  pub fraction_num_display_style_gap_min: f32,
  pub fraction_rule_thickness: f32,
  pub fraction_denominator_gap_min: f32,
  pub fraction_denom_display_style_gap_min: f32,
  pub skewed_fraction_horizontal_gap: f32,
  pub skewed_fraction_vertical_gap: f32,
  pub overbar_vertical_gap: f32,
  pub overbar_rule_thickness: f32,
  pub overbar_extra_ascender: f32,
  pub underbar_vertical_gap: f32,
  pub underbar_rule_thickness: f32,
  pub underbar_extra_descender: f32,
  pub radical_vertical_gap: f32,
  pub radical_display_style_vertical_gap: f32,
  pub radical_rule_thickness: f32,
  pub radical_extra_ascender: f32,
  pub radical_kern_before_degree: f32,
  pub radical_kern_after_degree: f32,
  pub radical_degree_bottom_raise_percent: f32,
}

impl MathConstants {
  /// Reads the constants sub-table. `None` when the font omits it.
  pub fn from_table(table: &math::Table) -> Option<Self> {
    let c = table.constants?;
    let v = |value: math::MathValue| value.value as f32;
    Some(Self {
      script_percent_scale_down: c.script_percent_scale_down() as f32,
      script_script_percent_scale_down: c.script_script_percent_scale_down() as f32,
      delimited_sub_formula_min_height: c.delimited_sub_formula_min_height() as f32,
      display_operator_min_height: c.display_operator_min_height() as f32,
      math_leading: v(c.math_leading()),
      axis_height: v(c.axis_height()),
      accent_base_height: v(c.accent_base_height()),
      flattened_accent_base_height: v(c.flattened_accent_base_height()),
      subscript_shift_down: v(c.subscript_shift_down()),
      subscript_top_max: v(c.subscript_top_max()),
      subscript_baseline_drop_min: v(c.subscript_baseline_drop_min()),
      superscript_shift_up: v(c.superscript_shift_up()),
      superscript_shift_up_cramped: v(c.superscript_shift_up_cramped()),
      superscript_bottom_min: v(c.superscript_bottom_min()),
      superscript_baseline_drop_max: v(c.superscript_baseline_drop_max()),
      sub_superscript_gap_min: v(c.sub_superscript_gap_min()),
      superscript_bottom_max_with_subscript: v(c.superscript_bottom_max_with_subscript()),
      space_after_script: v(c.space_after_script()),
      upper_limit_gap_min: v(c.upper_limit_gap_min()),
      upper_limit_baseline_rise_min: v(c.upper_limit_baseline_rise_min()),
      lower_limit_gap_min: v(c.lower_limit_gap_min()),
      lower_limit_baseline_drop_min: v(c.lower_limit_baseline_drop_min()),
      stack_top_shift_up: v(c.stack_top_shift_up()),
      stack_top_display_style_shift_up: v(c.stack_top_display_style_shift_up()),
      stack_bottom_shift_down: v(c.stack_bottom_shift_down()),
      stack_bottom_display_style_shift_down: v(c.stack_bottom_display_style_shift_down()),
      stack_gap_min: v(c.stack_gap_min()),
      stack_display_style_gap_min: v(c.stack_display_style_gap_min()),
      stretch_stack_top_shift_up: v(c.stretch_stack_top_shift_up()),
      stretch_stack_bottom_shift_down: v(c.stretch_stack_bottom_shift_down()),
      stretch_stack_gap_above_min: v(c.stretch_stack_gap_above_min()),
      stretch_stack_gap_below_min: v(c.stretch_stack_gap_below_min()),
      fraction_numerator_shift_up: v(c.fraction_numerator_shift_up()),
      fraction_numerator_display_style_shift_up: v(c.fraction_numerator_display_style_shift_up()),
      fraction_denominator_shift_down: v(c.fraction_denominator_shift_down()),
      fraction_denominator_display_style_shift_down: v(
        c.fraction_denominator_display_style_shift_down(),
      ),
      fraction_numerator_gap_min: v(c.fraction_numerator_gap_min()),
      fraction_num_display_style_gap_min: v(c.fraction_num_display_style_gap_min()),
      fraction_rule_thickness: v(c.fraction_rule_thickness()),
      fraction_denominator_gap_min: v(c.fraction_denominator_gap_min()),
      fraction_denom_display_style_gap_min: v(c.fraction_denom_display_style_gap_min()),
      skewed_fraction_horizontal_gap: v(c.skewed_fraction_horizontal_gap()),
      skewed_fraction_vertical_gap: v(c.skewed_fraction_vertical_gap()),
      overbar_vertical_gap: v(c.overbar_vertical_gap()),
      overbar_rule_thickness: v(c.overbar_rule_thickness()),
      overbar_extra_ascender: v(c.overbar_extra_ascender()),
      underbar_vertical_gap: v(c.underbar_vertical_gap()),
      underbar_rule_thickness: v(c.underbar_rule_thickness()),
      underbar_extra_descender: v(c.underbar_extra_descender()),
      radical_vertical_gap: v(c.radical_vertical_gap()),
      radical_display_style_vertical_gap: v(c.radical_display_style_vertical_gap()),
      radical_rule_thickness: v(c.radical_rule_thickness()),
      radical_extra_ascender: v(c.radical_extra_ascender()),
      radical_kern_before_degree: v(c.radical_kern_before_degree()),
      radical_kern_after_degree: v(c.radical_kern_after_degree()),
      radical_degree_bottom_raise_percent: c.radical_degree_bottom_raise_percent() as f32,
    })
  }
}
