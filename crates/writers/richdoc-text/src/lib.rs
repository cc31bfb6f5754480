//! Plain text renderer for richdoc.
//!
//! Renders a decoded document to text, stripping all inline formatting.
//! Sections and list items are separated by single line breaks; images
//! render as nothing. Cards and atoms are rendered by host-supplied
//! plugins:
//!
//! ```rust
//! use richdoc_text::{PluginDef, Renderer, RendererConfig};
//! use serde_json::json;
//!
//! let renderer = Renderer::new(
//!     RendererConfig::new().with_atom(PluginDef::text("mention", |ctx| {
//!         Ok(format!("@{}", ctx.value.unwrap_or_default()).into())
//!     })),
//! )
//! .unwrap();
//!
//! let doc = json!({
//!     "version": "0.3.0",
//!     "atoms": [["mention", "bob", {}]],
//!     "sections": [[1, "p", [[0, [], 0, "hi "], [1, [], 0, 0]]]]
//! });
//!
//! let mut rendered = renderer.render(&doc).unwrap();
//! assert_eq!(rendered.text, "hi @bob");
//! rendered.teardown.run();
//! ```

mod config;
mod error;
mod plugin;
mod renderer;
mod teardown;

pub use error::*;
pub use plugin::{Env, Plugin, PluginDef, RenderContext, RenderFn, TEXT_RENDER_TYPE};
pub use renderer::*;
pub use teardown::*;

use serde_json::Value;

/// Render a document with no plugins registered.
pub fn render(document: &Value) -> Result<Rendered, RenderError> {
    Renderer::default().render(document)
}
