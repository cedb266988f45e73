//! Hover highlight state machine
//!
//! At most one element carries the selection outline at a time. The state
//! records which element that is and what its inline `outline` was before
//! we touched it, so moving the pointer away restores the author's value
//! exactly, including the no-value case.

use crate::dom::{DomNode, NodePath};

/// Outline applied to the hovered element.
pub const HIGHLIGHT_OUTLINE: &str = "2px dashed red";

/// Which element, if any, currently carries the highlight outline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HighlightState {
  #[default]
  Idle,
  Highlighting {
    target: NodePath,
    /// Inline `outline` value the target had before highlighting, empty
    /// when it had none.
    saved_outline: String,
  },
}

impl HighlightState {
  /// Moves the highlight to `target`, restoring the previous target first.
  /// Hovering the already highlighted element is a no-op.
  pub fn hover(self, document: &mut DomNode, target: NodePath) -> HighlightState {
    if let HighlightState::Highlighting {
      target: ref current,
      ..
    } = self
    {
      if *current == target {
        return self;
      }
    }
    let after_restore = self.restore(document);
    debug_assert!(matches!(after_restore, HighlightState::Idle));

    let Some(node) = target.resolve_mut(document) else {
      return HighlightState::Idle;
    };
    let saved_outline = node.style_property("outline").unwrap_or_default();
    node.set_style_property("outline", HIGHLIGHT_OUTLINE);
    HighlightState::Highlighting {
      target,
      saved_outline,
    }
  }

  /// Puts the highlighted element's inline outline back and returns to
  /// `Idle`. Already idle is a no-op.
  pub fn restore(self, document: &mut DomNode) -> HighlightState {
    if let HighlightState::Highlighting {
      target,
      saved_outline,
    } = self
    {
      if let Some(node) = target.resolve_mut(document) {
        node.set_style_property("outline", &saved_outline);
      }
    }
    HighlightState::Idle
  }

  /// The currently highlighted element, if any.
  pub fn target(&self) -> Option<&NodePath> {
    match self {
      HighlightState::Idle => None,
      HighlightState::Highlighting { target, .. } => Some(target),
    }
  }
}
