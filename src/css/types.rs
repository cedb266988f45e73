//! CSS type definitions
//!
//! Core types for representing parsed stylesheets, rules, and declarations.
//! Declaration values are kept as raw strings: the exporter re-serializes
//! styles, it never interprets them.

use super::selectors::SnapSelectorImpl;
use cssparser::ToCss;
use selectors::parser::SelectorList;
use std::fmt;

/// Wrapper for String that satisfies the selectors crate's type bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssString(pub String);

impl CssString {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for CssString {
  fn from(s: &str) -> Self {
    CssString(s.to_string())
  }
}

impl From<String> for CssString {
  fn from(s: String) -> Self {
    CssString(s)
  }
}

impl std::ops::Deref for CssString {
  type Target = String;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl std::borrow::Borrow<str> for CssString {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl ToCss for CssString {
  fn to_css<W>(&self, dest: &mut W) -> fmt::Result
  where
    W: fmt::Write,
  {
    dest.write_str(&self.0)
  }
}

impl precomputed_hash::PrecomputedHash for CssString {
  fn precomputed_hash(&self) -> u32 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hash;
    use std::hash::Hasher;

    let mut hasher = DefaultHasher::new();
    self.0.hash(&mut hasher);
    hasher.finish() as u32
  }
}

/// A parsed stylesheet: the top-level style rules, in source order.
///
/// At-rules (`@media`, `@import`, `@font-face`, ...) are skipped during
/// parsing, matching how the scanner's source only ever consulted rules
/// that carry a selector.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
  pub rules: Vec<StyleRule>,
}

impl StyleSheet {
  pub fn new() -> Self {
    Self { rules: Vec::new() }
  }
}

/// A single CSS style rule (selectors + declarations), retaining the
/// authored rule text so matched rules can be emitted verbatim.
#[derive(Debug, Clone)]
pub struct StyleRule {
  pub selectors: SelectorList<SnapSelectorImpl>,
  pub declarations: Vec<Declaration>,
  /// The rule as it appeared in the source, trimmed.
  pub css_text: String,
}

/// A CSS property declaration with its raw value text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
  pub property: String,
  pub value: String,
  pub important: bool,
}
