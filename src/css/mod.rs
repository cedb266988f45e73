//! CSS parsing and types
//!
//! This module handles parsing CSS stylesheets and provides types for
//! representing CSS rules and the selector machinery, plus the collection
//! of a document's stylesheets.

pub mod loader;
pub mod parser;
pub mod selectors;
pub mod types;
