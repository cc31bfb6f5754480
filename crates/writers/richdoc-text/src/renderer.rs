//! The text rendering engine.

use std::fmt;

use richdoc_core::{
    AtomEntry, CardEntry, Document, Marker, Section, normalize, reduce_to_text,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::plugin::Registry;
use crate::{
    Env, PluginDef, PluginError, PluginKind, RenderContext, RenderError, RenderFn, Teardown,
};

/// Separator between sections and between list items.
pub const LINE_BREAK: &str = "\n";

/// Options for building a [`Renderer`].
pub struct RendererConfig {
    pub cards: Vec<PluginDef>,
    pub atoms: Vec<PluginDef>,
    /// Passed to every plugin invocation as `options`.
    pub card_options: Value,
    /// Invoked for cards with no registered plugin.
    pub unknown_card_handler: Option<RenderFn>,
    /// Invoked for atoms with no registered plugin.
    pub unknown_atom_handler: Option<RenderFn>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            atoms: Vec::new(),
            card_options: Value::Object(Map::new()),
            unknown_card_handler: None,
            unknown_atom_handler: None,
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card plugin.
    pub fn with_card(mut self, card: impl Into<PluginDef>) -> Self {
        self.cards.push(card.into());
        self
    }

    /// Add an atom plugin.
    pub fn with_atom(mut self, atom: impl Into<PluginDef>) -> Self {
        self.atoms.push(atom.into());
        self
    }

    /// Set the options passed to plugins.
    pub fn with_card_options(mut self, options: Value) -> Self {
        self.card_options = options;
        self
    }

    /// Set the fallback for unregistered cards.
    pub fn with_unknown_card_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut RenderContext<'_>) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.unknown_card_handler = Some(Box::new(handler));
        self
    }

    /// Set the fallback for unregistered atoms.
    pub fn with_unknown_atom_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut RenderContext<'_>) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.unknown_atom_handler = Some(Box::new(handler));
        self
    }
}

impl fmt::Debug for RendererConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererConfig")
            .field("cards", &self.cards)
            .field("atoms", &self.atoms)
            .field("card_options", &self.card_options)
            .field("unknown_card_handler", &self.unknown_card_handler.is_some())
            .field("unknown_atom_handler", &self.unknown_atom_handler.is_some())
            .finish()
    }
}

/// Output of one render pass.
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    /// Callbacks plugins registered during this pass. Run it once the text
    /// is no longer needed.
    pub teardown: Teardown,
}

/// Renders documents to plain text.
///
/// Plugins are validated once in [`Renderer::new`]. A renderer holds no
/// per-render state and can render any number of documents.
pub struct Renderer {
    cards: Registry,
    atoms: Registry,
    card_options: Value,
    unknown_card_handler: Option<RenderFn>,
    unknown_atom_handler: Option<RenderFn>,
}

impl Renderer {
    /// Validate plugins and build a renderer.
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        let cards = Registry::validate(PluginKind::Card, config.cards)?;
        let atoms = Registry::validate(PluginKind::Atom, config.atoms)?;
        debug!(
            cards = cards.len(),
            atoms = atoms.len(),
            "built text renderer"
        );

        Ok(Self {
            cards,
            atoms,
            card_options: config.card_options,
            unknown_card_handler: config.unknown_card_handler,
            unknown_atom_handler: config.unknown_atom_handler,
        })
    }

    /// Render a decoded document.
    pub fn render(&self, document: &Value) -> Result<Rendered, RenderError> {
        let document = normalize(document)?;
        self.render_document(&document)
    }

    /// Render an already normalized document.
    pub fn render_document(&self, document: &Document<'_>) -> Result<Rendered, RenderError> {
        debug!(
            version = %document.version,
            sections = document.sections.len(),
            "rendering document"
        );

        let mut pass = RenderPass {
            renderer: self,
            teardown: Teardown::new(),
        };
        let sections = document
            .sections
            .iter()
            .map(|section| pass.section(section))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rendered {
            text: sections.join(LINE_BREAK),
            teardown: pass.teardown,
        })
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            cards: Registry::default(),
            atoms: Registry::default(),
            card_options: Value::Object(Map::new()),
            unknown_card_handler: None,
            unknown_atom_handler: None,
        }
    }
}

/// State owned by a single render call.
struct RenderPass<'r> {
    renderer: &'r Renderer,
    teardown: Teardown,
}

impl RenderPass<'_> {
    fn section(&mut self, section: &Section<'_>) -> Result<String, RenderError> {
        match section {
            Section::Markup { markers, .. } => self.markers(markers),
            Section::List { items, .. } => {
                let items = items
                    .iter()
                    .map(|item| self.markers(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items.join(LINE_BREAK))
            }
            Section::Image { .. } => Ok(String::new()),
            Section::Card(card) => self.card(card),
        }
    }

    fn markers(&mut self, markers: &[Marker<'_>]) -> Result<String, RenderError> {
        reduce_to_text(markers, |atom| self.atom(atom))
    }

    fn card(&mut self, card: &CardEntry<'_>) -> Result<String, RenderError> {
        let renderer = self.renderer;
        let render = match renderer.cards.get(card.name) {
            Some(render) => render,
            None => match &renderer.unknown_card_handler {
                Some(handler) => handler,
                None => {
                    warn!(name = card.name, "no plugin for card, rendering nothing");
                    return Ok(String::new());
                }
            },
        };
        self.invoke(PluginKind::Card, render, card.name, card.payload, None)
    }

    fn atom(&mut self, atom: &AtomEntry<'_>) -> Result<String, RenderError> {
        let renderer = self.renderer;
        let render = match renderer.atoms.get(atom.name) {
            Some(render) => render,
            None => match &renderer.unknown_atom_handler {
                Some(handler) => handler,
                None => {
                    warn!(name = atom.name, "no plugin for atom, rendering its value");
                    return Ok(atom.value.to_string());
                }
            },
        };
        self.invoke(
            PluginKind::Atom,
            render,
            atom.name,
            atom.payload,
            Some(atom.value),
        )
    }

    fn invoke(
        &mut self,
        kind: PluginKind,
        render: &RenderFn,
        name: &str,
        payload: &Value,
        value: Option<&str>,
    ) -> Result<String, RenderError> {
        let mut ctx = RenderContext {
            payload,
            value,
            options: &self.renderer.card_options,
            env: Env::new(name, &mut self.teardown),
        };

        let output = render(&mut ctx).map_err(|source| RenderError::Plugin {
            kind,
            name: name.to_string(),
            source,
        })?;

        match output {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(RenderError::MustRenderText {
                kind,
                name: name.to_string(),
                found: json_type(&other),
            }),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc_0_3(sections: Value) -> Value {
        json!({
            "version": "0.3.0",
            "atoms": [],
            "cards": [],
            "markups": [],
            "sections": sections
        })
    }

    #[test]
    fn test_empty_document() {
        let rendered = Renderer::default().render(&doc_0_3(json!([]))).unwrap();
        assert_eq!(rendered.text, "");
        assert!(rendered.teardown.is_empty());
    }

    #[test]
    fn test_sections_joined_without_trailing_break() {
        let doc = doc_0_3(json!([
            [1, "P", [[0, [], 0, "first section"]]],
            [2, "http://example.com/a.png"],
            [1, "P", [[0, [], 0, "second section"]]]
        ]));
        let rendered = Renderer::default().render(&doc).unwrap();
        assert_eq!(rendered.text, "first section\n\nsecond section");
    }

    #[test]
    fn test_options_are_shared() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let config = RendererConfig::new()
            .with_card_options(json!({"greeting": "hi"}))
            .with_card(PluginDef::text("greet", move |ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(ctx.options["greeting"].clone())
            }));
        let renderer = Renderer::new(config).unwrap();

        let mut doc = doc_0_3(json!([[10, 0], [10, 0]]));
        doc["cards"] = json!([["greet"]]);

        let rendered = renderer.render(&doc).unwrap();
        assert_eq!(rendered.text, "hi\nhi");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_plugin_error_names_plugin() {
        let config = RendererConfig::new()
            .with_card(PluginDef::text("flaky", |_| Err(PluginError::failed("boom"))));
        let renderer = Renderer::new(config).unwrap();

        let mut doc = doc_0_3(json!([[10, 0]]));
        doc["cards"] = json!([["flaky"]]);

        let err = renderer.render(&doc).unwrap_err();
        assert_eq!(err.to_string(), "Card \"flaky\" failed to render: boom");
    }

    #[test]
    fn test_number_is_not_text() {
        let config = RendererConfig::new().with_atom(PluginDef::text("n", |_| Ok(json!(3))));
        let renderer = Renderer::new(config).unwrap();

        let mut doc = doc_0_3(json!([[1, "p", [[1, [], 0, 0]]]]));
        doc["atoms"] = json!([["n", "x", {}]]);

        let err = renderer.render(&doc).unwrap_err();
        assert!(matches!(
            err,
            RenderError::MustRenderText {
                kind: PluginKind::Atom,
                found: "number",
                ..
            }
        ));
    }

    #[test]
    fn test_render_document_reuses_normalized_input() {
        let input = doc_0_3(json!([[1, "p", [[0, [], 0, "again"]]]]));
        let document = normalize(&input).unwrap();
        let renderer = Renderer::default();
        assert_eq!(renderer.render_document(&document).unwrap().text, "again");
        assert_eq!(renderer.render_document(&document).unwrap().text, "again");
    }

    #[test]
    fn test_renderer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Renderer>();
    }

    #[test]
    fn test_rendered_moves_across_threads() {
        let config = RendererConfig::new().with_card(PluginDef::text("closer", |ctx| {
            ctx.env.on_teardown(|| {});
            Ok(Value::Null)
        }));
        let renderer = Renderer::new(config).unwrap();

        let mut doc = doc_0_3(json!([[10, 0]]));
        doc["cards"] = json!([["closer"]]);
        let rendered = renderer.render(&doc).unwrap();

        let pending = std::thread::spawn(move || {
            let mut rendered = rendered;
            let pending = rendered.teardown.len();
            rendered.teardown.run();
            pending
        })
        .join()
        .unwrap();
        assert_eq!(pending, 1);
    }
}
