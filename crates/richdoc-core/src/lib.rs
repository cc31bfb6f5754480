//! richdoc-core: Versioned rich-document model.
//!
//! This crate understands the array-encoded document format in all of its
//! supported revisions and normalizes each one into a single borrowed
//! representation. It also provides the marker-stack reducer that rebuilds
//! nested inline spans, along with two sinks for its output: plain text and
//! a small DOM tree.

mod document;
mod error;
mod reduce;
mod schema;

pub mod dom;

pub use document::*;
pub use error::*;
pub use reduce::*;
pub use schema::*;
