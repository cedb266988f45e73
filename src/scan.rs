//! Matching rule collection
//!
//! Walks every stylesheet attached to a document and gathers the authored
//! text of each top-level style rule whose selector list matches a given
//! element. The collected text seeds the `<style>` block of an export, so
//! pseudo-class rules keep working in the saved file even though inline
//! styles cannot express them.
//!
//! Only rules for the element itself are collected, not for its
//! descendants. Rules nested inside at-rules are not visited, and
//! selectors carrying a pseudo-element never match.

use crate::css::loader::{DocumentStyles, SheetEntry};
use crate::dom::{matching_specificity, DomNode, ElementRef};
use log::warn;

/// Returns the authored CSS text of every top-level rule matching
/// `element`, one rule per line. Blocked sheets are skipped with a warning.
pub fn css_rules_for_element(
  element: &DomNode,
  ancestors: &[&DomNode],
  styles: &DocumentStyles,
) -> String {
  // Interactive rules (:hover and friends) belong in the export's style
  // block, so the scan matches them as if the state held.
  let element_ref = ElementRef::with_ancestors(element, ancestors).assuming_user_action();
  let mut out = String::new();
  for entry in &styles.sheets {
    match entry {
      SheetEntry::Loaded { sheet, .. } => {
        for rule in &sheet.rules {
          if matching_specificity(&rule.selectors, &element_ref).is_some() {
            out.push_str(&rule.css_text);
            out.push('\n');
          }
        }
      }
      SheetEntry::Blocked { href, reason } => {
        warn!("skipping inaccessible stylesheet {}: {}", href, reason);
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::css::loader::DocumentStyles;
  use crate::css::parser::parse_stylesheet;
  use crate::dom::parse_html;

  fn styles_from(css: &str) -> DocumentStyles {
    let mut styles = DocumentStyles::default();
    styles.push_sheet(None, parse_stylesheet(css));
    styles
  }

  #[test]
  fn collects_only_rules_matching_the_element() {
    let doc = parse_html("<html><body><div class=\"card\"><p>x</p></div></body></html>").unwrap();
    let path = doc.select_first("div.card").unwrap().unwrap();
    let (ancestors, div) = path.resolve_with_ancestors(&doc).unwrap();
    let styles = styles_from(".card { color: red; } p { margin: 0; } .other { top: 1px; }");

    let rules = css_rules_for_element(div, &ancestors, &styles);
    assert!(rules.contains(".card { color: red; }"));
    // Rules matching only a descendant are not the element's rules.
    assert!(!rules.contains("p { margin: 0; }"));
    assert!(!rules.contains(".other"));
  }

  #[test]
  fn pseudo_class_rules_are_collected_but_pseudo_elements_are_not() {
    let doc = parse_html("<html><body><a href=\"/x\">go</a></body></html>").unwrap();
    let path = doc.select_first("a").unwrap().unwrap();
    let (ancestors, a) = path.resolve_with_ancestors(&doc).unwrap();
    let styles = styles_from("a:hover { color: green; } a::before { content: \"*\"; }");

    let rules = css_rules_for_element(a, &ancestors, &styles);
    assert!(rules.contains("a:hover { color: green; }"));
    assert!(!rules.contains("a::before"));
  }

  #[test]
  fn blocked_sheets_are_skipped() {
    let doc = parse_html("<html><body><div id=\"t\">x</div></body></html>").unwrap();
    let path = doc.select_first("#t").unwrap().unwrap();
    let (ancestors, div) = path.resolve_with_ancestors(&doc).unwrap();

    let mut styles = styles_from("#t { color: blue; }");
    styles.push_blocked("https://cdn.test/a.css", "cross-origin");

    let rules = css_rules_for_element(div, &ancestors, &styles);
    assert!(rules.contains("#t { color: blue; }"));
  }

  #[test]
  fn no_match_yields_empty_string() {
    let doc = parse_html("<html><body><span>x</span></body></html>").unwrap();
    let path = doc.select_first("span").unwrap().unwrap();
    let (ancestors, span) = path.resolve_with_ancestors(&doc).unwrap();
    let styles = styles_from(".card { color: red; }");

    assert_eq!(css_rules_for_element(span, &ancestors, &styles), "");
  }
}
