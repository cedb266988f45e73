//! Relative URL rewriting
//!
//! Rewrites `src`/`href`/`data-src`/`data-href` attributes on a cloned
//! subtree from relative (and root-relative) form to absolute URLs, so the
//! exported file references its resources from anywhere. Only the detached
//! clone is ever mutated, never the source document.

use crate::dom::DomNode;
use crate::error::Result;
use url::Url;

/// Attributes rewritten on every element.
const REWRITE_ATTRIBUTES: &[&str] = &["src", "href", "data-src", "data-href"];

/// Rewrites URLs in place against a fixed base (the page URL).
#[derive(Debug, Clone)]
pub struct UrlRewriter {
  base: Url,
}

impl UrlRewriter {
  pub fn new(base: Url) -> Self {
    Self { base }
  }

  /// Rewrites this node's attributes and recurses into element children.
  /// Idempotent: URLs that are already absolute are left untouched.
  pub fn rewrite(&self, node: &mut DomNode) -> Result<()> {
    for attr in REWRITE_ATTRIBUTES {
      self.rewrite_attribute(node, attr)?;
    }

    // <img> elements get their src re-checked through the same resolution;
    // redundant after the pass above, and harmless because it is idempotent.
    if node
      .tag_name()
      .is_some_and(|t| t.eq_ignore_ascii_case("img"))
    {
      self.rewrite_attribute(node, "src")?;
    }

    for child in &mut node.children {
      if child.is_element() {
        self.rewrite(child)?;
      }
    }
    Ok(())
  }

  fn rewrite_attribute(&self, node: &mut DomNode, attr: &str) -> Result<()> {
    let Some(value) = node.get_attribute(attr) else {
      return Ok(());
    };
    if value.is_empty() || value.starts_with("http") {
      return Ok(());
    }
    let resolved = self.base.join(value)?;
    node.set_attribute(attr, resolved.as_str());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::{parse_html, DomNode};

  fn element(html: &str) -> DomNode {
    let doc = parse_html(&format!("<html><body>{}</body></html>", html)).unwrap();
    let path = doc.select_first("body > *").unwrap().expect("element");
    path.resolve(&doc).unwrap().clone()
  }

  fn rewriter(base: &str) -> UrlRewriter {
    UrlRewriter::new(Url::parse(base).unwrap())
  }

  #[test]
  fn root_relative_path_resolves_against_origin() {
    let mut img = element("<img src=\"/img/a.png\">");
    rewriter("https://example.com").rewrite(&mut img).unwrap();
    assert_eq!(img.get_attribute("src"), Some("https://example.com/img/a.png"));
  }

  #[test]
  fn relative_path_resolves_against_page_directory() {
    let mut img = element("<img src=\"img/a.png\">");
    rewriter("https://example.com/dir/page.html")
      .rewrite(&mut img)
      .unwrap();
    assert_eq!(
      img.get_attribute("src"),
      Some("https://example.com/dir/img/a.png")
    );
  }

  #[test]
  fn absolute_urls_are_untouched() {
    let mut a = element("<a href=\"https://other.test/page\">x</a>");
    rewriter("https://example.com").rewrite(&mut a).unwrap();
    assert_eq!(a.get_attribute("href"), Some("https://other.test/page"));
  }

  #[test]
  fn data_attributes_are_rewritten() {
    let mut div = element("<div data-src=\"/lazy.png\" data-href=\"p/q\"></div>");
    rewriter("https://example.com/a/b.html")
      .rewrite(&mut div)
      .unwrap();
    assert_eq!(div.get_attribute("data-src"), Some("https://example.com/lazy.png"));
    assert_eq!(div.get_attribute("data-href"), Some("https://example.com/a/p/q"));
  }

  #[test]
  fn rewrite_recurses_into_children() {
    let mut div = element("<div><p><img src=\"x.png\"></p></div>");
    rewriter("https://example.com/dir/page.html")
      .rewrite(&mut div)
      .unwrap();
    let img = &div.children[0].children[0];
    assert_eq!(img.get_attribute("src"), Some("https://example.com/dir/x.png"));
  }

  #[test]
  fn rewriting_twice_is_idempotent() {
    let mut div = element("<div><a href=\"/p\">x</a><img src=\"i.png\"></div>");
    let rw = rewriter("https://example.com/dir/page.html");
    rw.rewrite(&mut div).unwrap();
    let first = div.outer_html();
    rw.rewrite(&mut div).unwrap();
    assert_eq!(div.outer_html(), first);
  }
}
