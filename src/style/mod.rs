//! Computed style representation
//!
//! The cascade produces a [`ComputedStyle`]: an ordered property → value
//! map. Serialization follows the `property: value; ` pair format the
//! exported inline styles use, in deterministic (alphabetical) order.

pub mod cascade;

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Properties that flow from a parent's computed style to its children.
pub const INHERITED_PROPERTIES: &[&str] = &[
  "border-collapse",
  "border-spacing",
  "caption-side",
  "color",
  "cursor",
  "direction",
  "empty-cells",
  "font",
  "font-family",
  "font-size",
  "font-style",
  "font-variant",
  "font-weight",
  "hyphens",
  "letter-spacing",
  "line-height",
  "list-style",
  "list-style-image",
  "list-style-position",
  "list-style-type",
  "overflow-wrap",
  "quotes",
  "tab-size",
  "text-align",
  "text-indent",
  "text-transform",
  "visibility",
  "white-space",
  "word-break",
  "word-spacing",
];

pub fn is_inherited(property: &str) -> bool {
  INHERITED_PROPERTIES
    .iter()
    .any(|p| p.eq_ignore_ascii_case(property))
}

/// The resolved set of CSS property values for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyle {
  properties: BTreeMap<String, String>,
}

impl ComputedStyle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, property: &str) -> Option<&str> {
    self.properties.get(&property.to_ascii_lowercase()).map(String::as_str)
  }

  pub fn set(&mut self, property: &str, value: &str) {
    self
      .properties
      .insert(property.to_ascii_lowercase(), value.trim().to_string());
  }

  pub fn len(&self) -> usize {
    self.properties.len()
  }

  pub fn is_empty(&self) -> bool {
    self.properties.is_empty()
  }

  pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
    self.properties.iter()
  }

  /// Serializes as `property: value; ` pairs in iteration order, the text
  /// stamped onto cloned elements' `style` attributes.
  pub fn css_text(&self) -> String {
    let mut out = String::new();
    for (property, value) in &self.properties {
      let _ = write!(out, "{}: {}; ", property, value);
    }
    out.trim_end().to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn css_text_is_sorted_pairs() {
    let mut style = ComputedStyle::new();
    style.set("margin", "0");
    style.set("color", "red");
    assert_eq!(style.css_text(), "color: red; margin: 0;");
  }

  #[test]
  fn set_normalizes_property_case() {
    let mut style = ComputedStyle::new();
    style.set("Color", "red");
    assert_eq!(style.get("color"), Some("red"));
  }

  #[test]
  fn inherited_property_lookup() {
    assert!(is_inherited("color"));
    assert!(is_inherited("font-size"));
    assert!(!is_inherited("margin"));
    assert!(!is_inherited("outline"));
  }
}
