//! Process-global configuration
//!
//! Configuration is a process-wide snapshot: renders call [`Config::get`]
//! once at the start and use the clone throughout, so mid-render mutation
//! from another thread cannot produce inconsistent output. The equation
//! counter is the only other mutable process state, held in an atomic with
//! an explicit reset.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Style settings for math spans.
#[derive(Debug, Clone)]
pub struct MathSettings {
  /// Path to the math font file. `None` discovers an installed MATH font.
  pub mathfont: Option<String>,
  /// Default mathvariant applied to the whole expression ("" for none).
  pub variant: String,
  /// Base font size in px.
  pub fontsize: f32,
  /// Fill color ("" inherits).
  pub color: String,
  /// Background color ("none" for transparent).
  pub background: String,
}

impl Default for MathSettings {
  fn default() -> Self {
    Self {
      mathfont: None,
      variant: String::new(),
      fontsize: 24.0,
      color: String::new(),
      background: "none".to_string(),
    }
  }
}

/// Style settings for prose spans in mixed text mode.
#[derive(Debug, Clone)]
pub struct TextSettings {
  /// Path to the text font file. `None` falls back to the math font.
  pub textfont: Option<String>,
  /// Default variant for prose ("serif" upright by default).
  pub variant: String,
  pub fontsize: f32,
  pub color: String,
  /// Line leading as a multiple of the font size.
  pub linespacing: f32,
}

impl Default for TextSettings {
  fn default() -> Self {
    Self {
      textfont: None,
      variant: "serif".to_string(),
      fontsize: 24.0,
      color: "black".to_string(),
      linespacing: 1.0,
    }
  }
}

/// Equation numbering settings.
#[derive(Debug, Clone)]
pub struct NumberingSettings {
  /// Number every rendered equation automatically.
  pub autonumber: bool,
  /// Format string; `{}` or `{0}` is replaced with the number.
  pub format: String,
  /// Custom formatter taking precedence over `format`.
  pub format_func: Option<fn(usize) -> String>,
  /// Column width; the tag's right edge lands here.
  pub columnwidth: String,
}

impl NumberingSettings {
  /// Formats the label for equation number `n`.
  pub fn label(&self, n: usize) -> String {
    if let Some(func) = self.format_func {
      return func(n);
    }
    self.label_str(&n.to_string())
  }

  /// Formats an explicit tag (for example from `\tag{…}`) with the same
  /// format string as automatic numbers.
  pub fn label_str(&self, tag: &str) -> String {
    if self.format.contains("{0}") {
      self.format.replace("{0}", tag)
    } else if self.format.contains("{}") {
      self.format.replace("{}", tag)
    } else {
      format!("({tag})")
    }
  }
}

impl Default for NumberingSettings {
  fn default() -> Self {
    Self {
      autonumber: false,
      format: "({0})".to_string(),
      format_func: None,
      columnwidth: "6.5in".to_string(),
    }
  }
}

/// Global configuration snapshot.
#[derive(Debug, Clone)]
pub struct Config {
  pub math: MathSettings,
  pub text: TextSettings,
  pub numbering: NumberingSettings,
  /// Emit SVG2 `<symbol>`/`<use>` sharing; disable for SVG 1.1 output.
  pub svg2: bool,
  /// Decimal places for SVG coordinates.
  pub precision: usize,
  /// Smallest allowed glyph size as a fraction of the base size, clamping
  /// nested script scaling.
  pub min_size_fraction: f32,
  /// `'.'` or `','`; with `','`, no space follows a comma between digits.
  pub decimal_separator: char,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      math: MathSettings::default(),
      text: TextSettings::default(),
      numbering: NumberingSettings::default(),
      svg2: true,
      precision: 4,
      min_size_fraction: 0.3,
      decimal_separator: '.',
    }
  }
}

static CONFIG: RwLock<Option<Config>> = RwLock::new(None);

impl Config {
  /// Returns a snapshot of the current global configuration.
  pub fn get() -> Config {
    if let Some(config) = CONFIG.read().as_ref() {
      return config.clone();
    }
    let mut guard = CONFIG.write();
    guard.get_or_insert_with(Config::default).clone()
  }

  /// Replaces the global configuration.
  pub fn set(config: Config) {
    *CONFIG.write() = Some(config);
  }

  /// Mutates the global configuration in place.
  pub fn update(f: impl FnOnce(&mut Config)) {
    let mut guard = CONFIG.write();
    let config = guard.get_or_insert_with(Config::default);
    f(config);
  }
}

/// Next equation number handed out by autonumbering. Holds the number the
/// next equation will receive.
static EQUATION_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Takes the next equation number and advances the counter.
pub fn next_equation_number() -> usize {
  EQUATION_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Resets the counter so the next equation is numbered `n`.
pub fn reset_numbering(n: usize) {
  EQUATION_COUNTER.store(n, Ordering::SeqCst);
}
