//! Subtree cloning with baked-in styles
//!
//! Produces a detached copy of an element in which every element node
//! carries its computed style as an inline `style` attribute. The copy is
//! built in one pass: each node is cloned and annotated together, so the
//! clone never needs to be re-walked against the source tree. Text and
//! comment children are copied verbatim.

use crate::css::loader::DocumentStyles;
use crate::dom::{DomNode, DomNodeType};
use crate::style::cascade::compute_style;
use crate::style::ComputedStyle;

/// Clones `element` and stamps computed styles on it and every descendant
/// element. `ancestors` is the chain from the document root down to the
/// element's parent; `parent_style` is the computed style of that parent,
/// if known, and feeds inheritance.
pub fn clone_with_styles(
  element: &DomNode,
  ancestors: &[&DomNode],
  parent_style: Option<&ComputedStyle>,
  styles: &DocumentStyles,
) -> DomNode {
  let computed = compute_style(element, ancestors, parent_style, styles);

  let mut clone = DomNode {
    node_type: element.node_type.clone(),
    children: Vec::with_capacity(element.children.len()),
  };
  clone.set_attribute("style", computed.css_text().trim_end());

  let mut child_ancestors = ancestors.to_vec();
  child_ancestors.push(element);
  for child in &element.children {
    match &child.node_type {
      DomNodeType::Element { .. } => {
        clone
          .children
          .push(clone_with_styles(child, &child_ancestors, Some(&computed), styles));
      }
      // Text and comments carry no style of their own.
      _ => clone.children.push(child.clone()),
    }
  }
  clone
}
