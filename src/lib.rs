//! elemsnap: export a single element from an HTML page as a standalone
//! document.
//!
//! The crate parses a page into an owned DOM tree, computes styles for an
//! element the way a browser's cascade would, and produces an
//! `element.html` whose nodes carry those styles inline. Hover/click
//! interaction is modelled as events fed into a [`session::Session`].
//!
//! ```no_run
//! use elemsnap::css::loader::{DocumentStyles, NoLoader};
//! use elemsnap::dom::parse_html;
//! use elemsnap::session::{Event, ExportOptions, Session};
//!
//! # fn main() -> elemsnap::error::Result<()> {
//! let document = parse_html("<html><body><div class=\"card\">hi</div></body></html>")?;
//! let styles = DocumentStyles::collect(&document, &NoLoader, None);
//! let target = document.select_first(".card")?.unwrap();
//!
//! let mut session = Session::new(document, styles, ExportOptions::default());
//! session.dispatch(Event::Hover(target.clone()))?;
//! if let Some(exported) = session.dispatch(Event::Click(target))? {
//!   exported.write_to(std::path::Path::new("."))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod css;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod resolve;
pub mod scan;
pub mod session;
pub mod snapshot;
pub mod style;

pub use dom::{DomNode, NodePath};
pub use error::{Error, Result};
pub use session::{Event, ExportOptions, ExportedDocument, Session};
