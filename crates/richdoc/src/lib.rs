//! Richdoc - render versioned rich documents
//!
//! Richdoc takes documents stored in a compact, array-encoded format and
//! projects them to plain text for previews, search indexing and
//! notifications:
//! - Three schema revisions (0.2.0, 0.3.0, 0.3.1) behind one model
//! - Inline spans rebuilt from flat open/close markers
//! - Host-supplied card and atom plugins
//! - Explicit teardown for resources plugins acquire
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let doc = json!({
//!     "version": "0.2.0",
//!     "sections": [[], [[1, "P", [[[], 0, "hello world"]]]]]
//! });
//!
//! let mut rendered = richdoc::text::render(&doc).unwrap();
//! assert_eq!(rendered.text, "hello world");
//! rendered.teardown.run();
//! ```
//!
//! # Features
//!
//! - `text` - Plain text renderer (default)
//!
//! # Architecture
//!
//! Decoded documents are normalized by the core crate into a
//! version-independent [`Document`] whose sections and markers carry fully
//! resolved markups, atoms and cards. Renderers walk that model; the
//! marker-stack reducer is shared by every output sink.

// Re-export core types
pub use richdoc_core::*;

/// Plain text rendering.
#[cfg(feature = "text")]
pub mod text {
    pub use richdoc_text::*;
}
