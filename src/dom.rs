//! DOM tree parsing and traversal
//!
//! Parses HTML with html5ever into an owned [`DomNode`] tree and provides
//! the element wrapper used for CSS selector matching, plus serialization
//! back to HTML text for the exported document.

use crate::css::selectors::PseudoClass;
use crate::css::selectors::PseudoElement;
use crate::css::selectors::SnapSelectorImpl;
use crate::css::types::CssString;
use crate::error::ParseError;
use crate::error::Result;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::Handle;
use markup5ever_rcdom::NodeData;
use markup5ever_rcdom::RcDom;
use selectors::attr::AttrSelectorOperation;
use selectors::attr::CaseSensitivity;
use selectors::bloom::BloomFilter;
use selectors::context::QuirksMode;
use selectors::context::SelectorCaches;
use selectors::matching::matches_selector;
use selectors::matching::MatchingContext;
use selectors::matching::MatchingMode;
use selectors::parser::SelectorList;
use selectors::Element;
use selectors::OpaqueElement;
use std::borrow::Borrow;
use std::fmt::Write as _;
use std::io;
use std::ptr;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
  "track", "wbr",
];

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An owned DOM node: the document root, an element, text, or a comment.
#[derive(Debug, Clone)]
pub struct DomNode {
  pub node_type: DomNodeType,
  pub children: Vec<DomNode>,
}

#[derive(Debug, Clone)]
pub enum DomNodeType {
  Document,
  Element {
    tag_name: String,
    /// Empty for HTML-namespace elements.
    namespace: String,
    attributes: Vec<(String, String)>,
  },
  Text {
    content: String,
  },
  Comment {
    content: String,
  },
}

/// Address of a node inside a document: child indices from the root,
/// counting every child node (elements, text, comments).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
  /// Resolves the path to a node, or None if any index is out of range.
  pub fn resolve<'a>(&self, root: &'a DomNode) -> Option<&'a DomNode> {
    let mut node = root;
    for &idx in &self.0 {
      node = node.children.get(idx)?;
    }
    Some(node)
  }

  pub fn resolve_mut<'a>(&self, root: &'a mut DomNode) -> Option<&'a mut DomNode> {
    let mut node = root;
    for &idx in &self.0 {
      node = node.children.get_mut(idx)?;
    }
    Some(node)
  }

  /// Resolves the path and the chain of nodes above it, root first.
  pub fn resolve_with_ancestors<'a>(
    &self,
    root: &'a DomNode,
  ) -> Option<(Vec<&'a DomNode>, &'a DomNode)> {
    let mut ancestors = Vec::with_capacity(self.0.len());
    let mut node = root;
    for &idx in &self.0 {
      ancestors.push(node);
      node = node.children.get(idx)?;
    }
    Some((ancestors, node))
  }
}

impl DomNode {
  pub fn is_element(&self) -> bool {
    matches!(self.node_type, DomNodeType::Element { .. })
  }

  pub fn tag_name(&self) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Element { tag_name, .. } => Some(tag_name),
      _ => None,
    }
  }

  pub fn namespace(&self) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Element { namespace, .. } => Some(namespace),
      _ => None,
    }
  }

  fn is_html_element(&self) -> bool {
    matches!(
      &self.node_type,
      DomNodeType::Element { namespace, .. } if namespace.is_empty() || namespace == HTML_NAMESPACE
    )
  }

  pub fn attributes_iter(&self) -> impl Iterator<Item = (&str, &str)> {
    let attrs: &[(String, String)] = match &self.node_type {
      DomNodeType::Element { attributes, .. } => attributes,
      _ => &[],
    };
    attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Attribute lookup; ASCII case-insensitive for HTML elements.
  pub fn get_attribute(&self, name: &str) -> Option<&str> {
    let is_html = self.is_html_element();
    self
      .attributes_iter()
      .find(|(k, _)| attr_name_matches(k, name, is_html))
      .map(|(_, v)| v)
  }

  pub fn set_attribute(&mut self, name: &str, value: &str) {
    let is_html = self.is_html_element();
    if let DomNodeType::Element { attributes, .. } = &mut self.node_type {
      if let Some(attr) = attributes
        .iter_mut()
        .find(|(k, _)| attr_name_matches(k, name, is_html))
      {
        attr.1 = value.to_string();
      } else {
        attributes.push((name.to_string(), value.to_string()));
      }
    }
  }

  pub fn remove_attribute(&mut self, name: &str) {
    let is_html = self.is_html_element();
    if let DomNodeType::Element { attributes, .. } = &mut self.node_type {
      attributes.retain(|(k, _)| !attr_name_matches(k, name, is_html));
    }
  }

  pub fn text_content(&self) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Text { content } => Some(content),
      _ => None,
    }
  }

  /// Concatenated text of all descendant text nodes.
  pub fn collect_text(&self) -> String {
    let mut out = String::new();
    self.walk_tree(&mut |node| {
      if let Some(text) = node.text_content() {
        out.push_str(text);
      }
    });
    out
  }

  /// Depth-first pre-order walk over this node and all descendants.
  pub fn walk_tree<F: FnMut(&DomNode)>(&self, f: &mut F) {
    f(self);
    for child in &self.children {
      child.walk_tree(f);
    }
  }

  /// Number of nodes strictly below this one.
  pub fn descendant_count(&self) -> usize {
    self
      .children
      .iter()
      .map(|c| 1 + c.descendant_count())
      .sum()
  }

  /// Finds the first element in document order matching the selector list.
  pub fn select_first(&self, selector: &str) -> Result<Option<NodePath>> {
    let list = crate::css::selectors::parse_selector_list(selector)?;
    Ok(select_first_inner(self, &list, &[], &NodePath::default()))
  }

  /// Value of one property in the inline `style` attribute, if present.
  pub fn style_property(&self, property: &str) -> Option<String> {
    let style = self.get_attribute("style")?;
    split_style_declarations(style)
      .into_iter()
      .find(|(p, _)| p.eq_ignore_ascii_case(property))
      .map(|(_, v)| v)
  }

  /// Sets (or replaces) one property in the inline `style` attribute.
  /// An empty value removes the property, mirroring `style.outline = ''`.
  pub fn set_style_property(&mut self, property: &str, value: &str) {
    if value.trim().is_empty() {
      self.remove_style_property(property);
      return;
    }
    let mut decls = self
      .get_attribute("style")
      .map(split_style_declarations)
      .unwrap_or_default();
    if let Some(decl) = decls
      .iter_mut()
      .find(|(p, _)| p.eq_ignore_ascii_case(property))
    {
      decl.1 = value.trim().to_string();
    } else {
      decls.push((property.to_string(), value.trim().to_string()));
    }
    let text = join_style_declarations(&decls);
    self.set_attribute("style", &text);
  }

  pub fn remove_style_property(&mut self, property: &str) {
    let Some(style) = self.get_attribute("style") else {
      return;
    };
    let mut decls = split_style_declarations(style);
    decls.retain(|(p, _)| !p.eq_ignore_ascii_case(property));
    if decls.is_empty() {
      self.remove_attribute("style");
    } else {
      let text = join_style_declarations(&decls);
      self.set_attribute("style", &text);
    }
  }

  /// Serializes this node (and its subtree) to HTML text.
  pub fn outer_html(&self) -> String {
    let mut out = String::new();
    serialize_node(self, &mut out);
    out
  }
}

fn attr_name_matches(actual: &str, expected: &str, is_html: bool) -> bool {
  if is_html {
    actual.eq_ignore_ascii_case(expected)
  } else {
    actual == expected
  }
}

fn select_first_inner<'a>(
  node: &'a DomNode,
  list: &SelectorList<SnapSelectorImpl>,
  ancestors: &[&'a DomNode],
  path: &NodePath,
) -> Option<NodePath> {
  if node.is_element() {
    let element = ElementRef::with_ancestors(node, ancestors);
    if matching_specificity(list, &element).is_some() {
      return Some(path.clone());
    }
  }
  let mut child_ancestors = ancestors.to_vec();
  child_ancestors.push(node);
  for (idx, child) in node.children.iter().enumerate() {
    let mut child_path = path.clone();
    child_path.0.push(idx);
    if let Some(found) = select_first_inner(child, list, &child_ancestors, &child_path) {
      return Some(found);
    }
  }
  None
}

/// Returns the highest specificity among matching selectors in the list,
/// skipping selectors that carry a pseudo-element.
pub fn matching_specificity(
  list: &SelectorList<SnapSelectorImpl>,
  element: &ElementRef,
) -> Option<u32> {
  let mut caches = SelectorCaches::default();
  let mut context = MatchingContext::new(
    MatchingMode::Normal,
    None,
    &mut caches,
    QuirksMode::NoQuirks,
    selectors::matching::NeedsSelectorFlags::No,
    selectors::matching::MatchingForInvalidation::No,
  );

  let mut best: Option<u32> = None;
  for selector in list.slice().iter() {
    if selector.pseudo_element().is_some() {
      continue;
    }
    if matches_selector(selector, 0, None, element, &mut context) {
      let specificity = selector.specificity();
      best = Some(best.map_or(specificity, |b| b.max(specificity)));
    }
  }
  best
}

// ============================================================================
// HTML parsing
// ============================================================================

/// Parses an HTML document into a [`DomNode`] tree rooted at a Document node.
pub fn parse_html(html: &str) -> Result<DomNode> {
  let opts = ParseOpts {
    tree_builder: TreeBuilderOpts {
      scripting_enabled: false,
      ..Default::default()
    },
    ..Default::default()
  };

  let mut reader = io::Cursor::new(html.as_bytes());
  let dom = parse_document(RcDom::default(), opts)
    .from_utf8()
    .read_from(&mut reader)
    .map_err(|e| ParseError::InvalidHtml {
      message: format!("Failed to parse HTML: {}", e),
    })?;

  convert_handle(&dom.document).ok_or_else(|| {
    ParseError::InvalidHtml {
      message: "DOM has no document root node".to_string(),
    }
    .into()
  })
}

fn convert_handle(handle: &Handle) -> Option<DomNode> {
  let node_type = match &handle.data {
    NodeData::Document => DomNodeType::Document,
    NodeData::Element { name, attrs, .. } => {
      let ns = name.ns.to_string();
      let namespace = if ns == HTML_NAMESPACE { String::new() } else { ns };
      let attributes = attrs
        .borrow()
        .iter()
        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
        .collect();
      DomNodeType::Element {
        tag_name: name.local.to_string(),
        namespace,
        attributes,
      }
    }
    NodeData::Text { contents } => DomNodeType::Text {
      content: contents.borrow().to_string(),
    },
    NodeData::Comment { contents } => DomNodeType::Comment {
      content: contents.to_string(),
    },
    // Doctype and processing instructions carry nothing the exporter needs.
    NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => return None,
  };

  let children = handle
    .children
    .borrow()
    .iter()
    .filter_map(convert_handle)
    .collect();

  Some(DomNode {
    node_type,
    children,
  })
}

// ============================================================================
// HTML serialization
// ============================================================================

fn serialize_node(node: &DomNode, out: &mut String) {
  match &node.node_type {
    DomNodeType::Document => {
      for child in &node.children {
        serialize_node(child, out);
      }
    }
    DomNodeType::Element {
      tag_name,
      attributes,
      ..
    } => {
      out.push('<');
      out.push_str(tag_name);
      for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
      }
      out.push('>');

      let lower = tag_name.to_ascii_lowercase();
      if VOID_ELEMENTS.contains(&lower.as_str()) {
        return;
      }
      let raw_text = RAW_TEXT_ELEMENTS.contains(&lower.as_str());
      for child in &node.children {
        match &child.node_type {
          DomNodeType::Text { content } if raw_text => out.push_str(content),
          _ => serialize_node(child, out),
        }
      }
      let _ = write!(out, "</{}>", tag_name);
    }
    DomNodeType::Text { content } => escape_text(content, out),
    DomNodeType::Comment { content } => {
      let _ = write!(out, "<!--{}-->", content);
    }
  }
}

fn escape_text(text: &str, out: &mut String) {
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      _ => out.push(c),
    }
  }
}

fn escape_attr(value: &str, out: &mut String) {
  for c in value.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '"' => out.push_str("&quot;"),
      _ => out.push(c),
    }
  }
}

// ============================================================================
// Inline style attribute helpers
// ============================================================================

/// Splits a style attribute into (property, value) pairs, honoring
/// parentheses so `url(a;b)` stays intact.
fn split_style_declarations(text: &str) -> Vec<(String, String)> {
  let mut decls = Vec::new();
  let mut depth = 0usize;
  let mut current = String::new();
  let mut parts: Vec<String> = Vec::new();
  for c in text.chars() {
    match c {
      '(' => {
        depth += 1;
        current.push(c);
      }
      ')' => {
        depth = depth.saturating_sub(1);
        current.push(c);
      }
      ';' if depth == 0 => {
        parts.push(std::mem::take(&mut current));
      }
      _ => current.push(c),
    }
  }
  parts.push(current);

  for part in parts {
    let part = part.trim();
    if part.is_empty() {
      continue;
    }
    if let Some((prop, value)) = part.split_once(':') {
      decls.push((prop.trim().to_string(), value.trim().to_string()));
    }
  }
  decls
}

fn join_style_declarations(decls: &[(String, String)]) -> String {
  let mut out = String::new();
  for (prop, value) in decls {
    let _ = write!(out, "{}: {}; ", prop, value);
  }
  out.trim_end().to_string()
}

// ============================================================================
// selectors::Element implementation
// ============================================================================

/// Borrowed element wrapper carrying its ancestor chain (root first) so the
/// selectors crate can walk parents and siblings.
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
  node: &'a DomNode,
  ancestors: &'a [&'a DomNode],
  assume_user_action: bool,
}

impl<'a> ElementRef<'a> {
  pub fn new(node: &'a DomNode) -> Self {
    Self {
      node,
      ancestors: &[],
      assume_user_action: false,
    }
  }

  pub fn with_ancestors(node: &'a DomNode, ancestors: &'a [&'a DomNode]) -> Self {
    Self {
      node,
      ancestors,
      assume_user_action: false,
    }
  }

  /// Treats user-action pseudo-classes (`:hover`, `:focus`, ...) as
  /// matching. Rule collection uses this so interactive rules survive into
  /// the export; the cascade does not, keeping computed styles at rest.
  pub fn assuming_user_action(mut self) -> Self {
    self.assume_user_action = true;
    self
  }

  pub fn node(&self) -> &'a DomNode {
    self.node
  }

  fn parent(&self) -> Option<&'a DomNode> {
    self.ancestors.last().copied()
  }

  /// Index of this element among its parent's element children, with count.
  fn element_index_and_len(&self) -> Option<(usize, usize)> {
    let parent = self.parent()?;
    let mut index = None;
    let mut len = 0usize;
    for child in &parent.children {
      if !child.is_element() {
        continue;
      }
      if ptr::eq(child, self.node) {
        index = Some(len);
      }
      len += 1;
    }
    index.map(|i| (i, len))
  }
}

fn matches_an_plus_b(a: i32, b: i32, index: i32) -> bool {
  if a == 0 {
    return index == b;
  }
  let diff = index - b;
  diff % a == 0 && diff / a >= 0
}

impl<'a> Element for ElementRef<'a> {
  type Impl = SnapSelectorImpl;

  fn opaque(&self) -> OpaqueElement {
    OpaqueElement::new(self.node)
  }

  fn parent_element(&self) -> Option<Self> {
    let parent = self.parent()?;
    if !parent.is_element() {
      return None;
    }
    Some(ElementRef {
      node: parent,
      ancestors: &self.ancestors[..self.ancestors.len() - 1],
      assume_user_action: self.assume_user_action,
    })
  }

  fn parent_node_is_shadow_root(&self) -> bool {
    false
  }

  fn containing_shadow_host(&self) -> Option<Self> {
    None
  }

  fn is_pseudo_element(&self) -> bool {
    false
  }

  fn prev_sibling_element(&self) -> Option<Self> {
    let parent = self.parent()?;
    let mut prev: Option<&DomNode> = None;
    for child in &parent.children {
      if !child.is_element() {
        continue;
      }
      if ptr::eq(child, self.node) {
        return prev.map(|node| ElementRef {
          node,
          ancestors: self.ancestors,
          assume_user_action: self.assume_user_action,
        });
      }
      prev = Some(child);
    }
    None
  }

  fn next_sibling_element(&self) -> Option<Self> {
    let parent = self.parent()?;
    let mut seen_self = false;
    for child in &parent.children {
      if !child.is_element() {
        continue;
      }
      if seen_self {
        return Some(ElementRef {
          node: child,
          ancestors: self.ancestors,
          assume_user_action: self.assume_user_action,
        });
      }
      if ptr::eq(child, self.node) {
        seen_self = true;
      }
    }
    None
  }

  fn first_element_child(&self) -> Option<Self> {
    self
      .node
      .children
      .iter()
      .find(|child| child.is_element())
      .map(|node| ElementRef {
        node,
        ancestors: self.ancestors,
        assume_user_action: self.assume_user_action,
      })
  }

  fn is_html_element_in_html_document(&self) -> bool {
    self.node.is_html_element()
  }

  fn has_local_name(&self, local_name: &str) -> bool {
    self.node.tag_name().is_some_and(|tag| {
      if self.node.is_html_element() {
        tag.eq_ignore_ascii_case(local_name)
      } else {
        tag == local_name
      }
    })
  }

  fn has_namespace(&self, ns: &str) -> bool {
    match self.node.namespace() {
      Some(namespace) => {
        ns.is_empty()
          || namespace == ns
          || (namespace.is_empty() && ns == HTML_NAMESPACE)
      }
      None => false,
    }
  }

  fn is_same_type(&self, other: &Self) -> bool {
    match (self.node.tag_name(), other.node.tag_name()) {
      (Some(a), Some(b)) if self.node.namespace() == other.node.namespace() => {
        if self.node.is_html_element() {
          a.eq_ignore_ascii_case(b)
        } else {
          a == b
        }
      }
      _ => false,
    }
  }

  fn attr_matches(
    &self,
    ns: &selectors::attr::NamespaceConstraint<&CssString>,
    local_name: &CssString,
    operation: &AttrSelectorOperation<&CssString>,
  ) -> bool {
    match ns {
      selectors::attr::NamespaceConstraint::Any => {}
      selectors::attr::NamespaceConstraint::Specific(url) => {
        let url: &str = (*url).borrow();
        if !(url.is_empty() || url == HTML_NAMESPACE) {
          return false;
        }
      }
    }

    let Some(attr_value) = self.node.get_attribute(local_name.as_str()) else {
      return false;
    };

    match operation {
      AttrSelectorOperation::Exists => true,
      AttrSelectorOperation::WithValue {
        operator,
        case_sensitivity,
        value,
      } => {
        let value_str: &str = (**value).borrow();
        operator.eval_str(attr_value, value_str, *case_sensitivity)
      }
    }
  }

  fn match_non_ts_pseudo_class(
    &self,
    pseudo: &PseudoClass,
    _context: &mut MatchingContext<Self::Impl>,
  ) -> bool {
    match pseudo {
      PseudoClass::Root => self.is_root(),
      PseudoClass::FirstChild => self
        .element_index_and_len()
        .map(|(idx, _)| idx == 0)
        .unwrap_or(false),
      PseudoClass::LastChild => self
        .element_index_and_len()
        .map(|(idx, len)| idx == len.saturating_sub(1))
        .unwrap_or(false),
      PseudoClass::OnlyChild => self
        .element_index_and_len()
        .map(|(_, len)| len == 1)
        .unwrap_or(false),
      PseudoClass::NthChild(a, b) => self
        .element_index_and_len()
        .map(|(idx, _)| matches_an_plus_b(*a, *b, (idx + 1) as i32))
        .unwrap_or(false),
      PseudoClass::NthLastChild(a, b) => self
        .element_index_and_len()
        .map(|(idx, len)| matches_an_plus_b(*a, *b, (len - idx) as i32))
        .unwrap_or(false),
      PseudoClass::Link => self.is_link(),
      // User-action states hold only when the caller opts in; a parsed
      // document at rest has none.
      PseudoClass::Hover | PseudoClass::Active | PseudoClass::Focus | PseudoClass::Visited => {
        self.assume_user_action
      }
    }
  }

  fn match_pseudo_element(
    &self,
    _pseudo: &PseudoElement,
    _context: &mut MatchingContext<Self::Impl>,
  ) -> bool {
    // The scanner skips pseudo-element selectors before matching.
    false
  }

  fn apply_selector_flags(&self, _flags: selectors::matching::ElementSelectorFlags) {}

  fn is_link(&self) -> bool {
    let Some(tag) = self.node.tag_name() else {
      return false;
    };
    self.node.get_attribute("href").is_some()
      && (tag.eq_ignore_ascii_case("a")
        || tag.eq_ignore_ascii_case("area")
        || tag.eq_ignore_ascii_case("link"))
  }

  fn is_html_slot_element(&self) -> bool {
    false
  }

  fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
    let Some(actual) = self.node.get_attribute("id") else {
      return false;
    };
    match case_sensitivity {
      CaseSensitivity::CaseSensitive => actual == id.as_str(),
      CaseSensitivity::AsciiCaseInsensitive => actual.eq_ignore_ascii_case(id.as_str()),
    }
  }

  fn has_class(&self, class: &CssString, case_sensitivity: CaseSensitivity) -> bool {
    let Some(classes) = self.node.get_attribute("class") else {
      return false;
    };
    match case_sensitivity {
      CaseSensitivity::CaseSensitive => classes
        .split_ascii_whitespace()
        .any(|c| c == class.as_str()),
      CaseSensitivity::AsciiCaseInsensitive => classes
        .split_ascii_whitespace()
        .any(|c| c.eq_ignore_ascii_case(class.as_str())),
    }
  }

  fn has_custom_state(&self, _name: &CssString) -> bool {
    false
  }

  fn imported_part(&self, _name: &CssString) -> Option<CssString> {
    None
  }

  fn is_part(&self, _name: &CssString) -> bool {
    false
  }

  fn is_empty(&self) -> bool {
    self.node.children.iter().all(|child| match &child.node_type {
      DomNodeType::Text { content } => content.trim().is_empty(),
      DomNodeType::Comment { .. } => true,
      _ => false,
    })
  }

  fn is_root(&self) -> bool {
    self
      .node
      .tag_name()
      .map(|t| t.eq_ignore_ascii_case("html"))
      .unwrap_or(false)
      && !self.ancestors.iter().any(|a| a.is_element())
  }

  fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
    false
  }
}
