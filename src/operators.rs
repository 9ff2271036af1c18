//! Operator dictionary
//!
//! Spacing and behavior flags for operators, keyed by `(character, form)`.
//! The table is compiled into the binary sorted by key and searched with a
//! binary search; spacing values are in math units (18 mu = 1 em at the
//! current size). Operators missing from the table fall back to 5 mu on
//! each side with no flags, per the MathML default.

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::length::parse_space_mu;

/// Prefix/infix/postfix classification of an operator occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Form {
  Prefix,
  Infix,
  Postfix,
}

impl Form {
  pub fn parse(value: &str) -> Option<Form> {
    match value.trim().to_ascii_lowercase().as_str() {
      "prefix" => Some(Form::Prefix),
      "infix" => Some(Form::Infix),
      "postfix" => Some(Form::Postfix),
      _ => None,
    }
  }
}

/// Behavior flags from the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorFlags(pub u8);

impl OperatorFlags {
  pub const STRETCHY: OperatorFlags = OperatorFlags(1 << 0);
  pub const FENCE: OperatorFlags = OperatorFlags(1 << 1);
  pub const SYMMETRIC: OperatorFlags = OperatorFlags(1 << 2);
  pub const LARGEOP: OperatorFlags = OperatorFlags(1 << 3);
  pub const MOVABLE_LIMITS: OperatorFlags = OperatorFlags(1 << 4);
  pub const ACCENT: OperatorFlags = OperatorFlags(1 << 5);
  pub const SEPARATOR: OperatorFlags = OperatorFlags(1 << 6);

  pub const fn empty() -> Self {
    OperatorFlags(0)
  }

  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }
}

impl core::ops::BitOr for OperatorFlags {
  type Output = Self;
  fn bitor(self, rhs: Self) -> Self {
    Self(self.0 | rhs.0)
  }
}

/// Resolved operator properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorRecord {
  /// Space before, in mu.
  pub lspace: f32,
  /// Space after, in mu.
  pub rspace: f32,
  pub flags: OperatorFlags,
}

impl OperatorRecord {
  pub fn stretchy(&self) -> bool {
    self.flags.contains(OperatorFlags::STRETCHY)
  }
  pub fn symmetric(&self) -> bool {
    self.flags.contains(OperatorFlags::SYMMETRIC)
  }
  pub fn largeop(&self) -> bool {
    self.flags.contains(OperatorFlags::LARGEOP)
  }
  pub fn movable_limits(&self) -> bool {
    self.flags.contains(OperatorFlags::MOVABLE_LIMITS)
  }
  pub fn accent(&self) -> bool {
    self.flags.contains(OperatorFlags::ACCENT)
  }
  pub fn fence(&self) -> bool {
    self.flags.contains(OperatorFlags::FENCE)
  }
}

/// Default record for operators not in the dictionary: 5/18 em per side.
pub const DEFAULT_RECORD: OperatorRecord = OperatorRecord {
  lspace: 5.0,
  rspace: 5.0,
  flags: OperatorFlags::empty(),
};

const S: OperatorFlags = OperatorFlags::STRETCHY;
const F: OperatorFlags = OperatorFlags::FENCE;
const Y: OperatorFlags = OperatorFlags::SYMMETRIC;
const L: OperatorFlags = OperatorFlags::LARGEOP;
const M: OperatorFlags = OperatorFlags::MOVABLE_LIMITS;
const A: OperatorFlags = OperatorFlags::ACCENT;
const P: OperatorFlags = OperatorFlags::SEPARATOR;
const N: OperatorFlags = OperatorFlags::empty();

/// One dictionary row: character, form, lspace (mu), rspace (mu), flags.
type Entry = (char, Form, u8, u8, OperatorFlags);

// Sorted by (char, form). Values follow the MathML Core operator
// dictionary, collapsed to the characters this engine ships.
#[rustfmt::skip]
static OPERATOR_TABLE: &[Entry] = &[
  ('!', Form::Postfix, 1, 0, N),
  ('&', Form::Infix, 4, 4, N),
  ('(', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  (')', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('*', Form::Infix, 3, 3, N),
  ('+', Form::Prefix, 0, 1, N),
  ('+', Form::Infix, 4, 4, N),
  (',', Form::Infix, 0, 3, P),
  ('-', Form::Prefix, 0, 1, N),
  ('-', Form::Infix, 4, 4, N),
  ('.', Form::Infix, 0, 3, P),
  ('/', Form::Infix, 1, 1, N),
  (':', Form::Infix, 1, 2, N),
  (';', Form::Infix, 0, 3, P),
  ('<', Form::Infix, 5, 5, N),
  ('=', Form::Infix, 5, 5, N),
  ('>', Form::Infix, 5, 5, N),
  ('?', Form::Infix, 1, 1, N),
  ('[', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('\\', Form::Infix, 0, 0, N),
  (']', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('^', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)),
  ('_', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)),
  ('{', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('|', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('|', Form::Infix, 2, 2, OperatorFlags(S.0 | F.0 | Y.0)),
  ('|', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('}', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('~', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)),
  ('\u{00AC}', Form::Prefix, 2, 1, N),          // not sign
  ('\u{00AF}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // macron
  ('\u{00B1}', Form::Prefix, 0, 1, N),          // plus-minus
  ('\u{00B1}', Form::Infix, 4, 4, N),
  ('\u{00B4}', Form::Postfix, 0, 0, A),         // acute
  ('\u{00D7}', Form::Infix, 4, 4, N),           // times
  ('\u{00F7}', Form::Infix, 4, 4, N),           // divide
  ('\u{02C7}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // caron
  ('\u{02D8}', Form::Postfix, 0, 0, A),         // breve
  ('\u{02D9}', Form::Postfix, 0, 0, A),         // dot above
  ('\u{02DA}', Form::Postfix, 0, 0, A),         // ring above
  ('\u{0302}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // combining hat
  ('\u{0303}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // combining tilde
  ('\u{2016}', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // double bar
  ('\u{2016}', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)),
  ('\u{2032}', Form::Postfix, 0, 0, N),         // prime
  ('\u{2033}', Form::Postfix, 0, 0, N),         // double prime
  ('\u{203E}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // overline
  ('\u{2044}', Form::Infix, 1, 1, S),           // fraction slash
  ('\u{20D7}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // combining arrow
  ('\u{2146}', Form::Prefix, 2, 0, N),          // differential d
  ('\u{2190}', Form::Infix, 5, 5, OperatorFlags(S.0 | A.0)), // leftwards arrow
  ('\u{2191}', Form::Infix, 5, 5, S),           // upwards arrow
  ('\u{2192}', Form::Infix, 5, 5, OperatorFlags(S.0 | A.0)), // rightwards arrow
  ('\u{2193}', Form::Infix, 5, 5, S),           // downwards arrow
  ('\u{2194}', Form::Infix, 5, 5, OperatorFlags(S.0 | A.0)), // left right arrow
  ('\u{21A6}', Form::Infix, 5, 5, S),           // maps to
  ('\u{21D0}', Form::Infix, 5, 5, S),           // leftwards double arrow
  ('\u{21D2}', Form::Infix, 5, 5, S),           // rightwards double arrow
  ('\u{21D4}', Form::Infix, 5, 5, S),           // left right double arrow
  ('\u{2200}', Form::Prefix, 2, 1, N),          // for all
  ('\u{2202}', Form::Prefix, 2, 1, N),          // partial differential
  ('\u{2203}', Form::Prefix, 2, 1, N),          // there exists
  ('\u{2207}', Form::Prefix, 2, 1, N),          // nabla
  ('\u{2208}', Form::Infix, 5, 5, N),           // element of
  ('\u{2209}', Form::Infix, 5, 5, N),           // not element of
  ('\u{220B}', Form::Infix, 5, 5, N),           // contains
  ('\u{220F}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary product
  ('\u{2210}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary coproduct
  ('\u{2211}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary summation
  ('\u{2212}', Form::Prefix, 0, 1, N),          // minus
  ('\u{2212}', Form::Infix, 4, 4, N),
  ('\u{2213}', Form::Infix, 4, 4, N),           // minus-plus
  ('\u{2215}', Form::Infix, 1, 1, S),           // division slash
  ('\u{2216}', Form::Infix, 4, 4, N),           // set minus
  ('\u{2217}', Form::Infix, 4, 4, N),           // asterisk operator
  ('\u{2218}', Form::Infix, 3, 3, N),           // ring operator
  ('\u{2219}', Form::Infix, 4, 4, N),           // bullet operator
  ('\u{221A}', Form::Prefix, 1, 1, OperatorFlags(S.0 | Y.0)), // radical
  ('\u{221D}', Form::Infix, 5, 5, N),           // proportional to
  ('\u{2223}', Form::Infix, 2, 2, OperatorFlags(S.0 | Y.0)), // divides
  ('\u{2225}', Form::Infix, 2, 2, OperatorFlags(S.0 | F.0 | Y.0)), // parallel to
  ('\u{2227}', Form::Infix, 4, 4, N),           // logical and
  ('\u{2228}', Form::Infix, 4, 4, N),           // logical or
  ('\u{2229}', Form::Infix, 4, 4, N),           // intersection
  ('\u{222A}', Form::Infix, 4, 4, N),           // union
  ('\u{222B}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // integral
  ('\u{222C}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // double integral
  ('\u{222D}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // triple integral
  ('\u{222E}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // contour integral
  ('\u{222F}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // surface integral
  ('\u{2230}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // volume integral
  ('\u{223C}', Form::Infix, 5, 5, N),           // tilde operator
  ('\u{2243}', Form::Infix, 5, 5, N),           // asymptotically equal
  ('\u{2245}', Form::Infix, 5, 5, N),           // approximately equal
  ('\u{2248}', Form::Infix, 5, 5, N),           // almost equal
  ('\u{2260}', Form::Infix, 5, 5, N),           // not equal
  ('\u{2261}', Form::Infix, 5, 5, N),           // identical to
  ('\u{2264}', Form::Infix, 5, 5, N),           // less or equal
  ('\u{2265}', Form::Infix, 5, 5, N),           // greater or equal
  ('\u{226A}', Form::Infix, 5, 5, N),           // much less
  ('\u{226B}', Form::Infix, 5, 5, N),           // much greater
  ('\u{2282}', Form::Infix, 5, 5, N),           // subset
  ('\u{2283}', Form::Infix, 5, 5, N),           // superset
  ('\u{2286}', Form::Infix, 5, 5, N),           // subset or equal
  ('\u{2287}', Form::Infix, 5, 5, N),           // superset or equal
  ('\u{2295}', Form::Infix, 4, 4, N),           // circled plus
  ('\u{2296}', Form::Infix, 4, 4, N),           // circled minus
  ('\u{2297}', Form::Infix, 4, 4, N),           // circled times
  ('\u{2299}', Form::Infix, 4, 4, N),           // circled dot
  ('\u{22C0}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary and
  ('\u{22C1}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary or
  ('\u{22C2}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary intersection
  ('\u{22C3}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary union
  ('\u{22C5}', Form::Infix, 4, 4, N),           // dot operator
  ('\u{2308}', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // left ceiling
  ('\u{2309}', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // right ceiling
  ('\u{230A}', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // left floor
  ('\u{230B}', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // right floor
  ('\u{23DE}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // over brace
  ('\u{23DF}', Form::Postfix, 0, 0, OperatorFlags(S.0 | A.0)), // under brace
  ('\u{27E8}', Form::Prefix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // left angle
  ('\u{27E9}', Form::Postfix, 0, 0, OperatorFlags(S.0 | F.0 | Y.0)), // right angle
  ('\u{2A00}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary circled dot
  ('\u{2A01}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary circled plus
  ('\u{2A02}', Form::Prefix, 1, 2, OperatorFlags(L.0 | M.0 | Y.0)), // n-ary circled times
  ('\u{2A0C}', Form::Prefix, 1, 2, OperatorFlags(L.0 | Y.0)), // quadruple integral
];

/// Integral characters: italic correction is applied differently around
/// their scripts (skipped on superscripts, subtracted on subscripts).
pub const INTEGRALS: &[char] = &[
  '\u{222B}', '\u{222C}', '\u{222D}', '\u{222E}', '\u{222F}', '\u{2230}', '\u{2A0C}',
];

pub fn is_integral(ch: char) -> bool {
  INTEGRALS.contains(&ch)
}

/// Looks up an operator record for `(character, form)`.
///
/// A same-character entry with another form is preferred over the default
/// record, matching the dictionary's fallback order.
pub fn lookup(ch: char, form: Form) -> OperatorRecord {
  let to_record =
    |e: &Entry| OperatorRecord { lspace: e.2 as f32, rspace: e.3 as f32, flags: e.4 };
  if let Ok(idx) = OPERATOR_TABLE.binary_search_by(|e| (e.0, e.1).cmp(&(ch, form))) {
    return to_record(&OPERATOR_TABLE[idx]);
  }
  // Any-form fallback: the table is sorted, so entries for ch are adjacent.
  if let Some(entry) = OPERATOR_TABLE.iter().find(|e| e.0 == ch) {
    return to_record(entry);
  }
  DEFAULT_RECORD
}

/// Applies `lspace`/`rspace`/flag attribute overrides onto a record.
pub fn apply_attributes(
  mut record: OperatorRecord,
  attr: impl Fn(&str) -> Option<String>,
) -> OperatorRecord {
  if let Some(value) = attr("lspace") {
    if let Some(mu) = parse_space_mu(&value) {
      record.lspace = mu;
    }
  }
  if let Some(value) = attr("rspace") {
    if let Some(mu) = parse_space_mu(&value) {
      record.rspace = mu;
    }
  }
  let mut set_flag = |name: &str, flag: OperatorFlags| {
    if let Some(value) = attr(name) {
      if value.eq_ignore_ascii_case("true") {
        record.flags = record.flags | flag;
      } else if value.eq_ignore_ascii_case("false") {
        record.flags = OperatorFlags(record.flags.0 & !flag.0);
      }
    }
  };
  set_flag("stretchy", OperatorFlags::STRETCHY);
  set_flag("symmetric", OperatorFlags::SYMMETRIC);
  set_flag("largeop", OperatorFlags::LARGEOP);
  set_flag("movablelimits", OperatorFlags::MOVABLE_LIMITS);
  set_flag("accent", OperatorFlags::ACCENT);
  set_flag("fence", OperatorFlags::FENCE);
  record
}

// Function names that latex2mathml emits as identifiers. `<mi>` matching
// one of these is treated as an operator with function spacing.
static FUNCTION_NAMES: &[&str] = &[
  "arccos", "arcsin", "arctan", "arg", "cos", "cosh", "cot", "coth", "csc", "deg", "det",
  "dim", "exp", "gcd", "hom", "inf", "ker", "lg", "lim", "liminf", "limsup", "ln", "log",
  "max", "min", "mod", "sec", "sin", "sinh", "sup", "tan", "tanh",
];

static DECLARED_OPERATORS: RwLock<Option<FxHashSet<String>>> = RwLock::new(None);

/// Registers an application-defined operator name, like LaTeX's
/// `\DeclareMathOperator`. A leading backslash is accepted and stripped.
pub fn declare_operator(name: &str) {
  let name = name.trim_start_matches('\\').to_string();
  if name.is_empty() {
    return;
  }
  DECLARED_OPERATORS
    .write()
    .get_or_insert_with(FxHashSet::default)
    .insert(name);
}

/// Whether an identifier's text names a known function-style operator.
pub fn is_operator_name(text: &str) -> bool {
  if FUNCTION_NAMES.binary_search(&text).is_ok() {
    return true;
  }
  DECLARED_OPERATORS
    .read()
    .as_ref()
    .map(|set| set.contains(text))
    .unwrap_or(false)
}

/// Record used for function-name operators (lim, sin, …).
pub fn function_record(movable: bool) -> OperatorRecord {
  let flags = if movable {
    OperatorFlags::MOVABLE_LIMITS
  } else {
    OperatorFlags::empty()
  };
  OperatorRecord {
    lspace: 0.0,
    rspace: 3.0,
    flags,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn table_is_sorted_by_key() {
    for pair in OPERATOR_TABLE.windows(2) {
      assert!(
        (pair[0].0, pair[0].1) < (pair[1].0, pair[1].1),
        "table out of order at {:?} / {:?}",
        pair[0].0,
        pair[1].0
      );
    }
  }

  #[test]
  fn function_names_are_sorted() {
    for pair in FUNCTION_NAMES.windows(2) {
      assert!(pair[0] < pair[1]);
    }
  }

  #[test]
  fn looks_up_exact_form() {
    let plus = lookup('+', Form::Infix);
    assert_eq!(plus.lspace, 4.0);
    assert_eq!(plus.rspace, 4.0);
    let plus_prefix = lookup('+', Form::Prefix);
    assert_eq!(plus_prefix.lspace, 0.0);
  }

  #[test]
  fn falls_back_to_other_form_then_default() {
    // '(' only has a prefix entry; infix lookup still finds it.
    let paren = lookup('(', Form::Infix);
    assert!(paren.stretchy());
    // Unknown operator gets the 5/18 em default.
    let unknown = lookup('\u{2AFF}', Form::Infix);
    assert_eq!(unknown, DEFAULT_RECORD);
  }

  #[test]
  fn sum_is_largeop_with_movable_limits() {
    let sum = lookup('\u{2211}', Form::Prefix);
    assert!(sum.largeop());
    assert!(sum.movable_limits());
    assert!(sum.symmetric());
  }

  #[test]
  fn integral_is_largeop_without_movable_limits() {
    let int = lookup('\u{222B}', Form::Prefix);
    assert!(int.largeop());
    assert!(!int.movable_limits());
    assert!(is_integral('\u{222B}'));
    assert!(!is_integral('\u{2211}'));
  }

  #[test]
  fn fences_are_stretchy_and_symmetric() {
    for ch in ['(', ')', '[', ']', '{', '}', '\u{27E8}', '\u{27E9}'] {
      let record = lookup(ch, Form::Prefix);
      assert!(record.stretchy(), "{ch} should stretch");
      assert!(record.symmetric(), "{ch} should be symmetric");
      assert_eq!(record.lspace, 0.0);
    }
  }

  #[test]
  fn attribute_overrides() {
    let record = lookup('+', Form::Infix);
    let over = apply_attributes(record, |name| match name {
      "lspace" => Some("0em".to_string()),
      "stretchy" => Some("true".to_string()),
      _ => None,
    });
    assert_eq!(over.lspace, 0.0);
    assert_eq!(over.rspace, 4.0);
    assert!(over.stretchy());
  }

  #[test]
  fn declared_operators_extend_names() {
    assert!(is_operator_name("sin"));
    assert!(!is_operator_name("myfunc"));
    declare_operator(r"\myfunc");
    assert!(is_operator_name("myfunc"));
  }
}
