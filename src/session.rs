//! Interactive export session
//!
//! Plays the event-handling layer: hover events move the highlight, a click
//! turns the highlighted element into a standalone HTML document. The
//! session owns the parsed document, its stylesheets and the highlight
//! state, so callers only feed it `Event`s.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::css::loader::DocumentStyles;
use crate::dom::{DomNode, NodePath};
use crate::error::{Error, Result};
use crate::highlight::HighlightState;
use crate::resolve::UrlRewriter;
use crate::scan::css_rules_for_element;
use crate::snapshot::clone_with_styles;

/// File name every export is written under.
pub const EXPORT_FILE_NAME: &str = "element.html";

/// Pointer events driven into a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Hover(NodePath),
  Click(NodePath),
}

/// Knobs for a session, loadable from JSON by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
  /// Page URL relative references are resolved against. `None` leaves
  /// them as authored.
  pub base_url: Option<Url>,
  /// When false, URL rewriting is skipped even with a base URL set.
  pub resolve_urls: bool,
  /// Deactivate the session after the first successful export.
  pub single_use: bool,
}

impl Default for ExportOptions {
  fn default() -> Self {
    Self {
      base_url: None,
      resolve_urls: true,
      single_use: false,
    }
  }
}

/// A finished export, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
  pub file_name: String,
  pub html: String,
}

impl ExportedDocument {
  /// Writes the document into `dir` and returns the full path.
  pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(&self.file_name);
    fs::write(&path, &self.html)?;
    Ok(path)
  }
}

pub struct Session {
  document: DomNode,
  styles: DocumentStyles,
  options: ExportOptions,
  state: HighlightState,
  active: bool,
}

impl Session {
  pub fn new(document: DomNode, styles: DocumentStyles, options: ExportOptions) -> Self {
    Self {
      document,
      styles,
      options,
      state: HighlightState::Idle,
      active: true,
    }
  }

  /// The session stops handling events after a single-use export.
  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn document(&self) -> &DomNode {
    &self.document
  }

  pub fn highlight_target(&self) -> Option<&NodePath> {
    self.state.target()
  }

  /// Feeds one event in. Only a click can produce a document.
  pub fn dispatch(&mut self, event: Event) -> Result<Option<ExportedDocument>> {
    if !self.active {
      debug!("session inactive, ignoring {:?}", event);
      return Ok(None);
    }
    match event {
      Event::Hover(path) => {
        let state = std::mem::take(&mut self.state);
        self.state = state.hover(&mut self.document, path);
        Ok(None)
      }
      Event::Click(path) => {
        let state = std::mem::take(&mut self.state);
        self.state = state.restore(&mut self.document);
        let exported = self.export(&path)?;
        if self.options.single_use {
          self.active = false;
        }
        Ok(Some(exported))
      }
    }
  }

  fn export(&self, path: &NodePath) -> Result<ExportedDocument> {
    let (ancestors, element) = path
      .resolve_with_ancestors(&self.document)
      .ok_or_else(|| Error::Other(format!("no element at path {:?}", path.0)))?;

    let mut clone = clone_with_styles(element, &ancestors, None, &self.styles);
    // The highlight is UI state, never part of the artifact.
    clone.remove_style_property("outline");

    let css = css_rules_for_element(element, &ancestors, &self.styles);

    if self.options.resolve_urls {
      if let Some(base) = &self.options.base_url {
        UrlRewriter::new(base.clone()).rewrite(&mut clone)?;
      }
    }

    let html = assemble_document(&css, &clone.outer_html());
    info!(
      "exported <{}> ({} bytes)",
      element.tag_name().unwrap_or("?"),
      html.len()
    );
    Ok(ExportedDocument {
      file_name: EXPORT_FILE_NAME.to_string(),
      html,
    })
  }
}

fn assemble_document(css: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
     <style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
    css, body
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::css::parser::parse_stylesheet;
  use crate::dom::parse_html;
  use crate::highlight::HIGHLIGHT_OUTLINE;

  fn session_for(html: &str, css: &str, options: ExportOptions) -> Session {
    let document = parse_html(html).unwrap();
    let mut styles = DocumentStyles::default();
    styles.push_sheet(None, parse_stylesheet(css));
    Session::new(document, styles, options)
  }

  fn card_page() -> &'static str {
    "<html><body><div class=\"card\"><img src=\"/x.png\"><p>hi</p></div></body></html>"
  }

  #[test]
  fn click_after_hover_exports_without_the_outline() {
    let mut session = session_for(
      card_page(),
      ".card { color: red; }",
      ExportOptions {
        base_url: Some(Url::parse("https://site.test").unwrap()),
        ..Default::default()
      },
    );
    let target = session.document().select_first(".card").unwrap().unwrap();

    session.dispatch(Event::Hover(target.clone())).unwrap();
    let exported = session
      .dispatch(Event::Click(target))
      .unwrap()
      .expect("click yields a document");

    assert_eq!(exported.file_name, "element.html");
    assert!(exported.html.starts_with("<!DOCTYPE html>"));
    assert!(exported.html.contains(".card { color: red; }"));
    assert!(exported.html.contains("src=\"https://site.test/x.png\""));
    assert!(!exported.html.contains(HIGHLIGHT_OUTLINE));
    assert!(exported.html.contains("color: red"));
  }

  #[test]
  fn click_without_prior_hover_still_exports() {
    let mut session = session_for(card_page(), "", ExportOptions::default());
    let target = session.document().select_first("p").unwrap().unwrap();

    let exported = session.dispatch(Event::Click(target)).unwrap().unwrap();
    assert!(exported.html.contains("<p"));
    assert!(exported.html.contains("hi"));
  }

  #[test]
  fn source_document_keeps_no_highlight_after_click() {
    let mut session = session_for(card_page(), "", ExportOptions::default());
    let card = session.document().select_first(".card").unwrap().unwrap();
    let p = session.document().select_first("p").unwrap().unwrap();

    session.dispatch(Event::Hover(card)).unwrap();
    session.dispatch(Event::Click(p)).unwrap();
    assert!(!session.document().outer_html().contains(HIGHLIGHT_OUTLINE));
    assert_eq!(session.highlight_target(), None);
  }

  #[test]
  fn single_use_session_ignores_later_events() {
    let mut session = session_for(
      card_page(),
      "",
      ExportOptions {
        single_use: true,
        ..Default::default()
      },
    );
    let target = session.document().select_first(".card").unwrap().unwrap();

    assert!(session.dispatch(Event::Click(target.clone())).unwrap().is_some());
    assert!(!session.is_active());
    assert!(session.dispatch(Event::Click(target)).unwrap().is_none());
  }

  #[test]
  fn urls_stay_relative_without_a_base() {
    let mut session = session_for(card_page(), "", ExportOptions::default());
    let target = session.document().select_first(".card").unwrap().unwrap();

    let exported = session.dispatch(Event::Click(target)).unwrap().unwrap();
    assert!(exported.html.contains("src=\"/x.png\""));
  }

  #[test]
  fn exported_document_writes_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let exported = ExportedDocument {
      file_name: EXPORT_FILE_NAME.to_string(),
      html: "<!DOCTYPE html>\n<html></html>\n".to_string(),
    };
    let path = exported.write_to(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "element.html");
    assert_eq!(fs::read_to_string(&path).unwrap(), exported.html);
  }
}
