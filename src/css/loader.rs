//! Document stylesheet collection
//!
//! Gathers the stylesheets a document carries: the text of `<style>`
//! elements and the contents of `<link rel="stylesheet">` references
//! fetched through a [`StylesheetLoader`]. A sheet whose text cannot be
//! loaded is recorded as blocked with its error; the scanner reports it
//! and moves on, the way a browser script skips a cross-origin sheet.

use super::parser::parse_stylesheet;
use super::types::StyleSheet;
use crate::dom::DomNode;
use crate::error::{Result, StylesheetError};
use std::fs;
use std::path::PathBuf;
use url::Url;

/// A minimal interface for loading external stylesheet text.
///
/// Implementations can read from disk, a cache, or an in-memory map.
pub trait StylesheetLoader {
  fn load(&self, href: &str) -> Result<String>;
}

/// Loads stylesheets from the filesystem relative to a base directory.
pub struct FileLoader {
  base_dir: PathBuf,
}

impl FileLoader {
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir: base_dir.into(),
    }
  }
}

impl StylesheetLoader for FileLoader {
  fn load(&self, href: &str) -> Result<String> {
    Ok(fs::read_to_string(self.base_dir.join(href))?)
  }
}

/// A loader that refuses every request; `<link>` sheets all end up blocked.
pub struct NoLoader;

impl StylesheetLoader for NoLoader {
  fn load(&self, href: &str) -> Result<String> {
    Err(
      StylesheetError::Inaccessible {
        href: href.to_string(),
        reason: "no stylesheet loader configured".to_string(),
      }
      .into(),
    )
  }
}

/// One entry in the document's stylesheet list, in document order.
#[derive(Debug, Clone)]
pub enum SheetEntry {
  /// A readable sheet with its parsed rules.
  Loaded {
    /// None for inline `<style>` elements.
    href: Option<String>,
    sheet: StyleSheet,
  },
  /// A sheet whose text could not be read.
  Blocked { href: String, reason: String },
}

/// The document's stylesheets, the `document.styleSheets` analogue.
#[derive(Debug, Clone, Default)]
pub struct DocumentStyles {
  pub sheets: Vec<SheetEntry>,
}

impl DocumentStyles {
  pub fn new() -> Self {
    Self::default()
  }

  /// Collects stylesheets from a parsed document: `<style>` contents are
  /// parsed inline, `<link rel="stylesheet">` hrefs are fetched through
  /// the loader as authored. The href resolved against `base_url` (when
  /// given) is only recorded on the entry, so a filesystem loader keeps
  /// working when a page URL is configured for attribute rewriting.
  pub fn collect<L: StylesheetLoader + ?Sized>(
    document: &DomNode,
    loader: &L,
    base_url: Option<&Url>,
  ) -> Self {
    let mut sheets = Vec::new();

    document.walk_tree(&mut |node| {
      let Some(tag) = node.tag_name() else {
        return;
      };
      if tag.eq_ignore_ascii_case("style") {
        let css = node.collect_text();
        if !css.trim().is_empty() {
          sheets.push(SheetEntry::Loaded {
            href: None,
            sheet: parse_stylesheet(&css),
          });
        }
      } else if tag.eq_ignore_ascii_case("link") && is_stylesheet_link(node) {
        let Some(href) = node.get_attribute("href").filter(|h| !h.trim().is_empty()) else {
          return;
        };
        let resolved = resolve_href(href, base_url);
        match loader.load(href) {
          Ok(css) => sheets.push(SheetEntry::Loaded {
            href: Some(resolved),
            sheet: parse_stylesheet(&css),
          }),
          Err(e) => {
            log::debug!("stylesheet '{}' not readable: {}", resolved, e);
            sheets.push(SheetEntry::Blocked {
              href: resolved,
              reason: e.to_string(),
            });
          }
        }
      }
    });

    Self { sheets }
  }

  /// Adds an already-parsed sheet, for callers assembling styles by hand.
  pub fn push_sheet(&mut self, href: Option<String>, sheet: StyleSheet) {
    self.sheets.push(SheetEntry::Loaded { href, sheet });
  }

  pub fn push_blocked(&mut self, href: impl Into<String>, reason: impl Into<String>) {
    self.sheets.push(SheetEntry::Blocked {
      href: href.into(),
      reason: reason.into(),
    });
  }

  /// Readable sheets only, in document order.
  pub fn loaded_sheets(&self) -> impl Iterator<Item = &StyleSheet> {
    self.sheets.iter().filter_map(|entry| match entry {
      SheetEntry::Loaded { sheet, .. } => Some(sheet),
      SheetEntry::Blocked { .. } => None,
    })
  }
}

fn is_stylesheet_link(node: &DomNode) -> bool {
  node
    .get_attribute("rel")
    .map(|rel| {
      rel
        .split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
    .unwrap_or(false)
}

/// Resolves a link href against the document base URL when one is known;
/// otherwise the href is passed to the loader as authored.
fn resolve_href(href: &str, base_url: Option<&Url>) -> String {
  match base_url {
    Some(base) => base
      .join(href)
      .map(|u| u.to_string())
      .unwrap_or_else(|_| href.to_string()),
    None => href.to_string(),
  }
}
