//! MathML parsing
//!
//! Parses the presentation-MathML subset into a [`MathNode`] tree: a sum
//! type with one variant per element kind, each node keeping its attribute
//! map for style resolution during layout. Named character entities are
//! replaced before the XML parse since the XML parser only knows the five
//! predefined ones.

use roxmltree::Document;

use crate::error::ParseError;
use crate::operators;

/// Attribute map for one element. Elements carry a handful of attributes
/// at most, so a linear scan beats a hash map here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttrs(Vec<(String, String)>);

impl NodeAttrs {
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  pub fn set(&mut self, name: &str, value: &str) {
    if let Some(entry) = self.0.iter_mut().find(|(key, _)| key == name) {
      entry.1 = value.to_string();
    } else {
      self.0.push((name.to_string(), value.to_string()));
    }
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// A table cell with its alignment attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
  pub content: MathNode,
  pub attrs: NodeAttrs,
}

/// A table row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
  pub cells: Vec<TableCell>,
  pub attrs: NodeAttrs,
}

/// Parsed MathML element.
#[derive(Debug, Clone, PartialEq)]
pub struct MathNode {
  pub kind: NodeKind,
  pub attrs: NodeAttrs,
}

impl MathNode {
  pub fn new(kind: NodeKind) -> Self {
    Self {
      kind,
      attrs: NodeAttrs::default(),
    }
  }

  pub fn with_attrs(kind: NodeKind, attrs: NodeAttrs) -> Self {
    Self { kind, attrs }
  }

  /// An empty node, used for `<none/>` and missing children.
  pub fn empty() -> Self {
    Self::new(NodeKind::Row(Vec::new()))
  }
}

/// Element kinds of the supported MathML subset.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
  /// `<math>` root; display true for block display.
  Math {
    display: bool,
    children: Vec<MathNode>,
  },
  Row(Vec<MathNode>),
  Identifier(String),
  Number(String),
  Operator(String),
  Text(String),
  Space,
  Fraction {
    numerator: Box<MathNode>,
    denominator: Box<MathNode>,
  },
  Sqrt(Box<MathNode>),
  Root {
    radicand: Box<MathNode>,
    degree: Box<MathNode>,
  },
  Sub {
    base: Box<MathNode>,
    subscript: Box<MathNode>,
  },
  Sup {
    base: Box<MathNode>,
    superscript: Box<MathNode>,
  },
  SubSup {
    base: Box<MathNode>,
    subscript: Box<MathNode>,
    superscript: Box<MathNode>,
  },
  Under {
    base: Box<MathNode>,
    under: Box<MathNode>,
  },
  Over {
    base: Box<MathNode>,
    over: Box<MathNode>,
  },
  UnderOver {
    base: Box<MathNode>,
    under: Box<MathNode>,
    over: Box<MathNode>,
  },
  Multiscripts {
    base: Box<MathNode>,
    prescripts: Vec<(Option<MathNode>, Option<MathNode>)>,
    postscripts: Vec<(Option<MathNode>, Option<MathNode>)>,
  },
  Enclose(Box<MathNode>),
  Table(Vec<TableRow>),
  Style(Vec<MathNode>),
  Padded(Vec<MathNode>),
  Phantom(Vec<MathNode>),
  None,
}

/// Parses a MathML document into a node tree.
///
/// The root element must be `<math>`; a namespace prefix or default MathML
/// namespace is accepted and ignored.
pub fn parse_mathml(source: &str) -> Result<MathNode, ParseError> {
  let unescaped = unescape_entities(source);
  let doc = Document::parse(&unescaped).map_err(|e| ParseError::InvalidXml {
    message: e.to_string(),
  })?;
  let root = doc.root_element();
  if !root.tag_name().name().eq_ignore_ascii_case("math") {
    return Err(ParseError::UnexpectedRoot {
      tag: root.tag_name().name().to_string(),
    });
  }
  parse_element(root).ok_or_else(|| ParseError::InvalidXml {
    message: "empty math element".to_string(),
  })
}

fn collect_attrs(node: roxmltree::Node) -> NodeAttrs {
  let mut attrs = NodeAttrs::default();
  for attribute in node.attributes() {
    attrs.set(attribute.name(), attribute.value());
  }
  attrs
}

fn element_text(node: roxmltree::Node, preserve_space: bool) -> String {
  let mut text = String::new();
  for child in node.descendants() {
    if let Some(t) = child.text() {
      text.push_str(t);
    }
  }
  if preserve_space {
    text
  } else {
    text.trim().to_string()
  }
}

fn child_elements<'a>(
  node: roxmltree::Node<'a, 'a>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> {
  node.children().filter(|n| n.is_element())
}

fn parse_children(node: roxmltree::Node) -> Vec<MathNode> {
  child_elements(node).filter_map(parse_element).collect()
}

fn wrap_row_or_single(mut children: Vec<MathNode>) -> MathNode {
  if children.len() == 1 {
    children.remove(0)
  } else {
    MathNode::new(NodeKind::Row(children))
  }
}

fn nth_or_empty(children: &mut Vec<MathNode>) -> Box<MathNode> {
  if children.is_empty() {
    Box::new(MathNode::empty())
  } else {
    Box::new(children.remove(0))
  }
}

fn is_annotation(node: roxmltree::Node) -> bool {
  matches!(node.tag_name().name(), "annotation" | "annotation-xml")
}

/// Parses script pairs for mmultiscripts: alternating subscript,
/// superscript elements where `<none/>` leaves a slot empty.
fn parse_script_pairs(
  elements: &[roxmltree::Node],
) -> Vec<(Option<MathNode>, Option<MathNode>)> {
  let mut pairs = Vec::new();
  let mut idx = 0;
  while idx < elements.len() {
    let sub = elements
      .get(idx)
      .and_then(|n| parse_element(*n))
      .filter(|n| n.kind != NodeKind::None);
    let sup = elements
      .get(idx + 1)
      .and_then(|n| parse_element(*n))
      .filter(|n| n.kind != NodeKind::None);
    pairs.push((sub, sup));
    idx += 2;
  }
  pairs
}

/// Synthesizes the fenced row for `<mfenced>`: open fence, children with
/// separators between them, close fence.
fn synthesize_fenced(node: roxmltree::Node, attrs: &NodeAttrs) -> MathNode {
  let open = attrs.get("open").unwrap_or("(");
  let close = attrs.get("close").unwrap_or(")");
  let separators: Vec<char> = attrs
    .get("separators")
    .unwrap_or(",")
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect();

  let inner = parse_children(node);
  let mut row = Vec::new();
  let fence_op = |text: &str, form: &str| {
    let mut attrs = NodeAttrs::default();
    attrs.set("form", form);
    attrs.set("stretchy", "true");
    MathNode::with_attrs(NodeKind::Operator(text.to_string()), attrs)
  };
  if !open.is_empty() {
    row.push(fence_op(open, "prefix"));
  }
  for (idx, child) in inner.into_iter().enumerate() {
    if idx > 0 && !separators.is_empty() {
      let sep = separators
        .get(idx - 1)
        .or_else(|| separators.last())
        .copied()
        .unwrap_or(',');
      row.push(MathNode::new(NodeKind::Operator(sep.to_string())));
    }
    row.push(child);
  }
  if !close.is_empty() {
    row.push(fence_op(close, "postfix"));
  }
  MathNode::new(NodeKind::Row(row))
}

fn parse_table(node: roxmltree::Node) -> NodeKind {
  let mut rows = Vec::new();
  for row_node in child_elements(node) {
    if !row_node.tag_name().name().eq_ignore_ascii_case("mtr") {
      // A bare cell or stray element becomes a single-cell row.
      if let Some(content) = parse_element(row_node) {
        rows.push(TableRow {
          cells: vec![TableCell {
            content,
            attrs: NodeAttrs::default(),
          }],
          attrs: NodeAttrs::default(),
        });
      }
      continue;
    }
    let row_attrs = collect_attrs(row_node);
    let mut cells = Vec::new();
    for cell_node in child_elements(row_node) {
      let cell_attrs = collect_attrs(cell_node);
      let content = wrap_row_or_single(parse_children(cell_node));
      cells.push(TableCell {
        content,
        attrs: cell_attrs,
      });
    }
    rows.push(TableRow {
      cells,
      attrs: row_attrs,
    });
  }
  NodeKind::Table(rows)
}

fn parse_element(node: roxmltree::Node) -> Option<MathNode> {
  let tag = node.tag_name().name().to_ascii_lowercase();
  let attrs = collect_attrs(node);

  let kind = match tag.as_str() {
    "math" => {
      let display = node
        .attribute("display")
        .map(|v| !v.eq_ignore_ascii_case("inline"))
        .unwrap_or(true);
      NodeKind::Math {
        display,
        children: parse_children(node),
      }
    }
    "mrow" | "merror" | "mtd" => NodeKind::Row(parse_children(node)),
    "semantics" => {
      let first = child_elements(node).find(|n| !is_annotation(*n));
      return first.and_then(parse_element);
    }
    "annotation" | "annotation-xml" => return None,
    "mi" => {
      let text = element_text(node, false);
      // latex2mathml emits function names (sin, lim, ...) as identifiers.
      if operators::is_operator_name(&text) {
        NodeKind::Operator(text)
      } else {
        NodeKind::Identifier(text)
      }
    }
    "mn" => NodeKind::Number(element_text(node, false)),
    "mo" => NodeKind::Operator(element_text(node, false)),
    "mtext" | "ms" => NodeKind::Text(element_text(node, true)),
    "mspace" => NodeKind::Space,
    "mfrac" => {
      let mut children = parse_children(node);
      NodeKind::Fraction {
        numerator: nth_or_empty(&mut children),
        denominator: nth_or_empty(&mut children),
      }
    }
    "msqrt" => NodeKind::Sqrt(Box::new(wrap_row_or_single(parse_children(node)))),
    "mroot" => {
      let mut children = parse_children(node);
      NodeKind::Root {
        radicand: nth_or_empty(&mut children),
        degree: nth_or_empty(&mut children),
      }
    }
    "msub" => {
      let mut children = parse_children(node);
      NodeKind::Sub {
        base: nth_or_empty(&mut children),
        subscript: nth_or_empty(&mut children),
      }
    }
    "msup" => {
      let mut children = parse_children(node);
      NodeKind::Sup {
        base: nth_or_empty(&mut children),
        superscript: nth_or_empty(&mut children),
      }
    }
    "msubsup" => {
      let mut children = parse_children(node);
      NodeKind::SubSup {
        base: nth_or_empty(&mut children),
        subscript: nth_or_empty(&mut children),
        superscript: nth_or_empty(&mut children),
      }
    }
    "munder" => {
      let mut children = parse_children(node);
      NodeKind::Under {
        base: nth_or_empty(&mut children),
        under: nth_or_empty(&mut children),
      }
    }
    "mover" => {
      let mut children = parse_children(node);
      NodeKind::Over {
        base: nth_or_empty(&mut children),
        over: nth_or_empty(&mut children),
      }
    }
    "munderover" => {
      let mut children = parse_children(node);
      NodeKind::UnderOver {
        base: nth_or_empty(&mut children),
        under: nth_or_empty(&mut children),
        over: nth_or_empty(&mut children),
      }
    }
    "mmultiscripts" => {
      let elements: Vec<roxmltree::Node> = child_elements(node).collect();
      let base = elements
        .first()
        .and_then(|n| parse_element(*n))
        .unwrap_or_else(MathNode::empty);
      let prescript_start = elements
        .iter()
        .position(|n| n.tag_name().name().eq_ignore_ascii_case("mprescripts"));
      let post_slice = match prescript_start {
        Some(pos) => &elements[1..pos],
        None => &elements[1..],
      };
      let pre_slice = match prescript_start {
        Some(pos) => &elements[pos + 1..],
        None => &[][..],
      };
      NodeKind::Multiscripts {
        base: Box::new(base),
        prescripts: parse_script_pairs(pre_slice),
        postscripts: parse_script_pairs(post_slice),
      }
    }
    "mfenced" => return Some(synthesize_fenced(node, &attrs)),
    "menclose" => NodeKind::Enclose(Box::new(wrap_row_or_single(parse_children(node)))),
    "mtable" => parse_table(node),
    "mstyle" => NodeKind::Style(parse_children(node)),
    "mpadded" => NodeKind::Padded(parse_children(node)),
    "mphantom" => NodeKind::Phantom(parse_children(node)),
    "none" => NodeKind::None,
    "mprescripts" => return None,
    other => {
      // Unknown elements render as a row over their children.
      tracing::warn!(element = other, "unknown MathML element, treating as mrow");
      NodeKind::Row(parse_children(node))
    }
  };
  Some(MathNode::with_attrs(kind, attrs))
}

/// Named character entities recognized in MathML sources, beyond the five
/// the XML parser already knows. Sorted by name for binary search.
#[rustfmt::skip]
static ENTITIES: &[(&str, &str)] = &[
  ("ApplyFunction", "\u{2061}"),
  ("Delta", "\u{0394}"),
  ("DifferentialD", "\u{2146}"),
  ("ExponentialE", "\u{2147}"),
  ("Gamma", "\u{0393}"),
  ("ImaginaryI", "\u{2148}"),
  ("InvisibleComma", ""),
  ("InvisibleTimes", ""),
  ("Lambda", "\u{039B}"),
  ("Omega", "\u{03A9}"),
  ("Phi", "\u{03A6}"),
  ("Pi", "\u{03A0}"),
  ("Prime", "\u{2033}"),
  ("Psi", "\u{03A8}"),
  ("Sigma", "\u{03A3}"),
  ("Theta", "\u{0398}"),
  ("ThinSpace", "\u{2009}"),
  ("Upsilon", "\u{03A5}"),
  ("Vert", "\u{2016}"),
  ("Xi", "\u{039E}"),
  ("ZeroWidthSpace", "\u{200B}"),
  ("alpha", "\u{03B1}"),
  ("angle", "\u{2220}"),
  ("approx", "\u{2248}"),
  ("beta", "\u{03B2}"),
  ("cap", "\u{2229}"),
  ("cdot", "\u{22C5}"),
  ("chi", "\u{03C7}"),
  ("cong", "\u{2245}"),
  ("cup", "\u{222A}"),
  ("delta", "\u{03B4}"),
  ("divide", "\u{00F7}"),
  ("emsp", "\u{2003}"),
  ("ensp", "\u{2002}"),
  ("epsilon", "\u{03B5}"),
  ("equiv", "\u{2261}"),
  ("eta", "\u{03B7}"),
  ("exist", "\u{2203}"),
  ("forall", "\u{2200}"),
  ("gamma", "\u{03B3}"),
  ("ge", "\u{2265}"),
  ("geq", "\u{2265}"),
  ("harr", "\u{2194}"),
  ("hellip", "\u{2026}"),
  ("infin", "\u{221E}"),
  ("int", "\u{222B}"),
  ("iota", "\u{03B9}"),
  ("isin", "\u{2208}"),
  ("kappa", "\u{03BA}"),
  ("lambda", "\u{03BB}"),
  ("lArr", "\u{21D0}"),
  ("lang", "\u{27E8}"),
  ("larr", "\u{2190}"),
  ("lceil", "\u{2308}"),
  ("le", "\u{2264}"),
  ("leq", "\u{2264}"),
  ("lfloor", "\u{230A}"),
  ("mid", "\u{2223}"),
  ("minus", "\u{2212}"),
  ("mu", "\u{03BC}"),
  ("nabla", "\u{2207}"),
  ("ne", "\u{2260}"),
  ("notin", "\u{2209}"),
  ("nu", "\u{03BD}"),
  ("omega", "\u{03C9}"),
  ("oplus", "\u{2295}"),
  ("otimes", "\u{2297}"),
  ("part", "\u{2202}"),
  ("perp", "\u{22A5}"),
  ("phi", "\u{03C6}"),
  ("pi", "\u{03C0}"),
  ("plusmn", "\u{00B1}"),
  ("prime", "\u{2032}"),
  ("prod", "\u{220F}"),
  ("prop", "\u{221D}"),
  ("psi", "\u{03C8}"),
  ("rArr", "\u{21D2}"),
  ("radic", "\u{221A}"),
  ("rang", "\u{27E9}"),
  ("rarr", "\u{2192}"),
  ("rceil", "\u{2309}"),
  ("rfloor", "\u{230B}"),
  ("rho", "\u{03C1}"),
  ("sigma", "\u{03C3}"),
  ("sim", "\u{223C}"),
  ("sub", "\u{2282}"),
  ("sube", "\u{2286}"),
  ("sum", "\u{2211}"),
  ("sup", "\u{2283}"),
  ("supe", "\u{2287}"),
  ("tau", "\u{03C4}"),
  ("theta", "\u{03B8}"),
  ("thinsp", "\u{2009}"),
  ("times", "\u{00D7}"),
  ("upsilon", "\u{03C5}"),
  ("xi", "\u{03BE}"),
  ("zeta", "\u{03B6}"),
];

/// Replaces recognized named entities; numeric references and the XML
/// predefined five pass through for the XML parser.
pub fn unescape_entities(source: &str) -> String {
  let mut out = String::with_capacity(source.len());
  let mut rest = source;
  while let Some(start) = rest.find('&') {
    out.push_str(&rest[..start]);
    let tail = &rest[start..];
    let Some(end) = tail.find(';').filter(|idx| *idx <= 48) else {
      out.push('&');
      rest = &tail[1..];
      continue;
    };
    let name = &tail[1..end];
    let passthrough = name.starts_with('#')
      || matches!(name, "amp" | "lt" | "gt" | "quot" | "apos");
    if passthrough {
      out.push_str(&tail[..=end]);
    } else if let Ok(idx) = ENTITIES.binary_search_by(|(key, _)| (*key).cmp(name)) {
      out.push_str(ENTITIES[idx].1);
    } else {
      // Unknown entity; leave it for the parser to report.
      out.push_str(&tail[..=end]);
    }
    rest = &tail[end + 1..];
  }
  out.push_str(rest);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(src: &str) -> MathNode {
    parse_mathml(src).expect("parses")
  }

  fn math_children(node: MathNode) -> Vec<MathNode> {
    match node.kind {
      NodeKind::Math { children, .. } => children,
      other => panic!("expected math root, got {other:?}"),
    }
  }

  #[test]
  fn entity_table_is_sorted() {
    for pair in ENTITIES.windows(2) {
      assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
    }
  }

  #[test]
  fn unescapes_known_entities() {
    assert_eq!(unescape_entities("&alpha;&beta;"), "\u{03B1}\u{03B2}");
    assert_eq!(unescape_entities("a &amp; b"), "a &amp; b");
    assert_eq!(unescape_entities("&#x3B1;"), "&#x3B1;");
    assert_eq!(unescape_entities("&InvisibleTimes;"), "");
  }

  #[test]
  fn parses_simple_expression() {
    let children = math_children(parse("<math><mi>x</mi><mo>+</mo><mn>2</mn></math>"));
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].kind, NodeKind::Identifier("x".to_string()));
    assert_eq!(children[1].kind, NodeKind::Operator("+".to_string()));
    assert_eq!(children[2].kind, NodeKind::Number("2".to_string()));
  }

  #[test]
  fn display_attribute_defaults_block() {
    let node = parse("<math display=\"inline\"><mi>x</mi></math>");
    assert!(matches!(node.kind, NodeKind::Math { display: false, .. }));
    let node = parse("<math><mi>x</mi></math>");
    assert!(matches!(node.kind, NodeKind::Math { display: true, .. }));
  }

  #[test]
  fn accepts_namespaced_root() {
    let node = parse("<math xmlns=\"http://www.w3.org/1998/Math/MathML\"><mn>1</mn></math>");
    assert!(matches!(node.kind, NodeKind::Math { .. }));
  }

  #[test]
  fn rejects_non_math_root() {
    assert!(matches!(
      parse_mathml("<svg><mi>x</mi></svg>"),
      Err(ParseError::UnexpectedRoot { .. })
    ));
  }

  #[test]
  fn msup_structure() {
    let children = math_children(parse(
      "<math><msup><mi>x</mi><mn>2</mn></msup></math>",
    ));
    let NodeKind::Sup { base, superscript } = &children[0].kind else {
      panic!("expected msup");
    };
    assert_eq!(base.kind, NodeKind::Identifier("x".to_string()));
    assert_eq!(superscript.kind, NodeKind::Number("2".to_string()));
  }

  #[test]
  fn semantics_takes_presentation_child() {
    let children = math_children(parse(
      "<math><semantics><mrow><mi>x</mi></mrow>\
       <annotation encoding=\"application/x-tex\">x</annotation></semantics></math>",
    ));
    assert_eq!(children.len(), 1);
    assert!(matches!(children[0].kind, NodeKind::Row(_)));
  }

  #[test]
  fn mfenced_synthesizes_row_with_separators() {
    let children = math_children(parse(
      "<math><mfenced open=\"[\" close=\"]\"><mi>a</mi><mi>b</mi></mfenced></math>",
    ));
    let NodeKind::Row(items) = &children[0].kind else {
      panic!("expected synthesized row");
    };
    assert_eq!(items.len(), 5);
    assert_eq!(items[0].kind, NodeKind::Operator("[".to_string()));
    assert_eq!(items[0].attrs.get("form"), Some("prefix"));
    assert_eq!(items[2].kind, NodeKind::Operator(",".to_string()));
    assert_eq!(items[4].kind, NodeKind::Operator("]".to_string()));
  }

  #[test]
  fn known_function_identifier_becomes_operator() {
    let children = math_children(parse("<math><mi>sin</mi><mi>x</mi></math>"));
    assert_eq!(children[0].kind, NodeKind::Operator("sin".to_string()));
    assert_eq!(children[1].kind, NodeKind::Identifier("x".to_string()));
  }

  #[test]
  fn multiscripts_with_prescripts() {
    let children = math_children(parse(
      "<math><mmultiscripts><mi>F</mi><mn>1</mn><none/>\
       <mprescripts/><none/><mn>2</mn></mmultiscripts></math>",
    ));
    let NodeKind::Multiscripts {
      prescripts,
      postscripts,
      ..
    } = &children[0].kind
    else {
      panic!("expected multiscripts");
    };
    assert_eq!(postscripts.len(), 1);
    assert!(postscripts[0].0.is_some());
    assert!(postscripts[0].1.is_none());
    assert_eq!(prescripts.len(), 1);
    assert!(prescripts[0].0.is_none());
    assert!(prescripts[0].1.is_some());
  }

  #[test]
  fn table_rows_and_cells() {
    let children = math_children(parse(
      "<math><mtable><mtr><mtd><mn>1</mn></mtd><mtd><mn>2</mn></mtd></mtr>\
       <mtr><mtd><mn>3</mn></mtd></mtr></mtable></math>",
    ));
    let NodeKind::Table(rows) = &children[0].kind else {
      panic!("expected table");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells.len(), 2);
    assert_eq!(rows[1].cells.len(), 1);
  }

  #[test]
  fn unknown_element_becomes_row() {
    let children = math_children(parse(
      "<math><mfancy><mi>x</mi><mn>1</mn></mfancy></math>",
    ));
    let NodeKind::Row(items) = &children[0].kind else {
      panic!("expected row fallback");
    };
    assert_eq!(items.len(), 2);
  }

  #[test]
  fn none_parses_to_none_kind() {
    let children = math_children(parse("<math><none/></math>"));
    assert_eq!(children[0].kind, NodeKind::None);
  }

  #[test]
  fn mstyle_keeps_attrs() {
    let children = math_children(parse(
      "<math><mstyle mathvariant=\"bold\" displaystyle=\"false\"><mi>x</mi></mstyle></math>",
    ));
    assert!(matches!(children[0].kind, NodeKind::Style(_)));
    assert_eq!(children[0].attrs.get("mathvariant"), Some("bold"));
    assert_eq!(children[0].attrs.get("displaystyle"), Some("false"));
  }
}
