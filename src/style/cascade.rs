//! CSS cascade
//!
//! Applies document stylesheets to an element to produce its computed
//! style: user-agent defaults first, then author rules ordered by
//! specificity and source order, `!important` declarations above normal
//! ones, the inline `style` attribute last. Inherited properties flow
//! from the parent's computed style.
//!
//! Reference: CSS Cascading and Inheritance Level 4
//! <https://www.w3.org/TR/css-cascade-4/>

use super::{is_inherited, ComputedStyle};
use crate::css::loader::DocumentStyles;
use crate::css::parser::{parse_declarations, parse_stylesheet};
use crate::css::types::{Declaration, StyleSheet};
use crate::dom::{matching_specificity, DomNode, ElementRef};
use std::sync::OnceLock;

/// User-agent stylesheet containing default browser styles
const USER_AGENT_STYLESHEET: &str = include_str!("user_agent.css");

fn ua_stylesheet() -> &'static StyleSheet {
  static UA: OnceLock<StyleSheet> = OnceLock::new();
  UA.get_or_init(|| parse_stylesheet(USER_AGENT_STYLESHEET))
}

/// Computes the style of `node` (with its root-first ancestor chain) under
/// the document's stylesheets. `parent` is the parent element's computed
/// style, the source of inherited properties.
pub fn compute_style(
  node: &DomNode,
  ancestors: &[&DomNode],
  parent: Option<&ComputedStyle>,
  styles: &DocumentStyles,
) -> ComputedStyle {
  compute_style_with_ua(ua_stylesheet(), node, ancestors, parent, styles)
}

fn compute_style_with_ua(
  ua_sheet: &StyleSheet,
  node: &DomNode,
  ancestors: &[&DomNode],
  parent: Option<&ComputedStyle>,
  styles: &DocumentStyles,
) -> ComputedStyle {
  let mut computed = ComputedStyle::new();

  if let Some(parent) = parent {
    for (property, value) in parent.iter() {
      if is_inherited(property) {
        computed.set(property, value);
      }
    }
  }

  let element = ElementRef::with_ancestors(node, ancestors);

  // User-agent rules sit below author rules regardless of specificity.
  let mut ua_important: Vec<&Declaration> = Vec::new();
  let mut ua_matched = Vec::new();
  collect_matching(ua_sheet, &element, &mut ua_matched);
  apply_matched(ua_matched, &mut computed, &mut ua_important);

  // Specificity orders author rules across all sheets, not per sheet.
  let mut author_important: Vec<&Declaration> = Vec::new();
  let mut author_matched = Vec::new();
  for sheet in styles.loaded_sheets() {
    collect_matching(sheet, &element, &mut author_matched);
  }
  apply_matched(author_matched, &mut computed, &mut author_important);

  // Inline style wins over normal author declarations.
  let inline_decls = node
    .get_attribute("style")
    .map(parse_declarations)
    .unwrap_or_default();
  for decl in inline_decls.iter().filter(|d| !d.important) {
    computed.set(&decl.property, &decl.value);
  }

  // Important declarations invert origin order: author important, then
  // inline important, user-agent important above all.
  for decl in author_important {
    computed.set(&decl.property, &decl.value);
  }
  for decl in inline_decls.iter().filter(|d| d.important) {
    computed.set(&decl.property, &decl.value);
  }
  for decl in ua_important {
    computed.set(&decl.property, &decl.value);
  }

  computed
}

type StyleRuleDecls = Vec<Declaration>;

fn collect_matching<'a>(
  sheet: &'a StyleSheet,
  element: &ElementRef,
  matched: &mut Vec<(u32, &'a StyleRuleDecls)>,
) {
  for rule in &sheet.rules {
    if let Some(specificity) = matching_specificity(&rule.selectors, element) {
      matched.push((specificity, &rule.declarations));
    }
  }
}

/// Applies matched rules in (specificity, source order); important
/// declarations are deferred to the caller's list.
fn apply_matched<'a>(
  mut matched: Vec<(u32, &'a StyleRuleDecls)>,
  computed: &mut ComputedStyle,
  important: &mut Vec<&'a Declaration>,
) {
  // Stable sort keeps source order among equal specificities.
  matched.sort_by_key(|(specificity, _)| *specificity);

  for (_, declarations) in matched {
    for decl in declarations {
      if decl.important {
        important.push(decl);
      } else {
        computed.set(&decl.property, &decl.value);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::css::parser::parse_stylesheet;
  use crate::dom::parse_html;

  fn document_with_styles(body: &str, css: &str) -> (DomNode, DocumentStyles) {
    let doc = parse_html(&format!("<html><body>{}</body></html>", body)).unwrap();
    let mut styles = DocumentStyles::new();
    styles.push_sheet(None, parse_stylesheet(css));
    (doc, styles)
  }

  fn computed_for(doc: &DomNode, styles: &DocumentStyles, selector: &str) -> ComputedStyle {
    let path = doc.select_first(selector).unwrap().expect("target");
    let (ancestors, node) = path.resolve_with_ancestors(doc).unwrap();
    let parent_chain: Vec<ComputedStyle> = {
      // Recompute parent styles down the chain so inheritance applies.
      let mut computed_chain: Vec<ComputedStyle> = Vec::new();
      for (idx, ancestor) in ancestors.iter().enumerate() {
        if !ancestor.is_element() {
          continue;
        }
        let style = compute_style(ancestor, &ancestors[..idx], computed_chain.last(), styles);
        computed_chain.push(style);
      }
      computed_chain
    };
    compute_style(node, &ancestors, parent_chain.last(), styles)
  }

  #[test]
  fn higher_specificity_wins() {
    let (doc, styles) = document_with_styles(
      "<div class=\"a\" id=\"x\"></div>",
      "div { color: red; } .a { color: green; } #x { color: blue; }",
    );
    let computed = computed_for(&doc, &styles, "div");
    assert_eq!(computed.get("color"), Some("blue"));
  }

  #[test]
  fn later_rule_wins_at_equal_specificity() {
    let (doc, styles) = document_with_styles(
      "<p class=\"a\"></p>",
      ".a { color: red; } .a { color: green; }",
    );
    let computed = computed_for(&doc, &styles, "p");
    assert_eq!(computed.get("color"), Some("green"));
  }

  #[test]
  fn inline_style_wins_over_author_rules() {
    let (doc, styles) = document_with_styles(
      "<div id=\"x\" style=\"color: purple\"></div>",
      "#x { color: blue; }",
    );
    let computed = computed_for(&doc, &styles, "div");
    assert_eq!(computed.get("color"), Some("purple"));
  }

  #[test]
  fn important_author_rule_beats_inline_normal() {
    let (doc, styles) = document_with_styles(
      "<div style=\"color: purple\"></div>",
      "div { color: blue !important; }",
    );
    let computed = computed_for(&doc, &styles, "div");
    assert_eq!(computed.get("color"), Some("blue"));
  }

  #[test]
  fn color_inherits_from_parent() {
    let (doc, styles) = document_with_styles(
      "<div class=\"outer\"><span>t</span></div>",
      ".outer { color: teal; margin: 4px; }",
    );
    let computed = computed_for(&doc, &styles, "span");
    assert_eq!(computed.get("color"), Some("teal"));
    // margin does not inherit
    assert_eq!(computed.get("margin"), None);
  }

  #[test]
  fn user_agent_defaults_apply() {
    let (doc, styles) = document_with_styles("<p>t</p>", "");
    let computed = computed_for(&doc, &styles, "p");
    assert_eq!(computed.get("display"), Some("block"));
  }

  #[test]
  fn author_rule_overrides_user_agent_default() {
    let (doc, styles) = document_with_styles("<p>t</p>", "p { display: inline; }");
    let computed = computed_for(&doc, &styles, "p");
    assert_eq!(computed.get("display"), Some("inline"));
  }

  #[test]
  fn important_user_agent_rule_beats_important_author_rule() {
    let ua = parse_stylesheet("div { color: black !important; }");
    let (doc, styles) = document_with_styles(
      "<div style=\"color: purple !important\"></div>",
      "div { color: blue !important; }",
    );
    let path = doc.select_first("div").unwrap().unwrap();
    let (ancestors, node) = path.resolve_with_ancestors(&doc).unwrap();
    let computed = compute_style_with_ua(&ua, node, &ancestors, None, &styles);
    assert_eq!(computed.get("color"), Some("black"));
  }

  #[test]
  fn detached_element_gets_defaults_and_inline_only() {
    let (doc, styles) = document_with_styles("<p style=\"color: red\">t</p>", "");
    let path = doc.select_first("p").unwrap().unwrap();
    let (ancestors, node) = path.resolve_with_ancestors(&doc).unwrap();
    let computed = compute_style(node, &ancestors, None, &styles);
    assert_eq!(computed.get("color"), Some("red"));
    assert_eq!(computed.get("display"), Some("block"));
  }
}
