//! Error types for elemsnap
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.

use thiserror::Error;

/// Result type alias for elemsnap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for elemsnap
///
/// Each variant wraps a more specific error type for that subsystem.
#[derive(Error, Debug)]
pub enum Error {
  /// HTML or CSS parsing error
  #[error("Parse error: {0}")]
  Parse(#[from] ParseError),

  /// Stylesheet collection or access error
  #[error("Stylesheet error: {0}")]
  Stylesheet(#[from] StylesheetError),

  /// URL resolution error while rewriting attributes
  #[error("URL error: {0}")]
  Url(#[from] url::ParseError),

  /// I/O error (file reading, export writing, etc.)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur during HTML or CSS parsing
#[derive(Error, Debug, Clone)]
pub enum ParseError {
  /// Invalid HTML structure
  #[error("Invalid HTML: {message}")]
  InvalidHtml { message: String },

  /// Invalid CSS syntax
  #[error("Invalid CSS at line {line}: {message}")]
  InvalidCss { message: String, line: u32 },

  /// Invalid selector
  #[error("Invalid selector: {selector}")]
  InvalidSelector { selector: String },
}

/// Errors that occur while gathering or reading document stylesheets
#[derive(Error, Debug, Clone)]
pub enum StylesheetError {
  /// The sheet's text could not be loaded; recorded per sheet and
  /// reported as a warning during scanning.
  #[error("Cannot access stylesheet '{href}': {reason}")]
  Inaccessible { href: String, reason: String },

  /// A `<link rel="stylesheet">` carried no usable href
  #[error("Stylesheet link has no href")]
  MissingHref,
}
