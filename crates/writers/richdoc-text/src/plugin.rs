//! Card and atom plugins.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::{PluginError, PluginKind, RenderError, Teardown};

/// The only render discipline this renderer accepts.
pub const TEXT_RENDER_TYPE: &str = "text";

/// A render function. Returns a JSON string for text, `null` for nothing.
pub type RenderFn = Box<dyn Fn(&mut RenderContext<'_>) -> Result<Value, PluginError> + Send + Sync>;

/// What a plugin receives when invoked.
pub struct RenderContext<'r> {
    /// Card or atom payload; an empty object when the document has none.
    pub payload: &'r Value,
    /// The atom's text value. Always `None` for cards.
    pub value: Option<&'r str>,
    /// The renderer's configured card options, shared by every invocation.
    pub options: &'r Value,
    pub env: Env<'r>,
}

/// Invocation environment.
pub struct Env<'r> {
    /// Name of the card or atom being rendered.
    pub name: &'r str,
    /// Always `false` for this renderer.
    pub is_in_editor: bool,
    teardown: &'r mut Teardown,
}

impl<'r> Env<'r> {
    pub(crate) fn new(name: &'r str, teardown: &'r mut Teardown) -> Self {
        Self {
            name,
            is_in_editor: false,
            teardown,
        }
    }

    /// Register a callback to run when the caller tears the render down.
    pub fn on_teardown(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.teardown.register(callback);
    }
}

/// A card or atom implementation.
pub trait Plugin: Send + Sync + 'static {
    /// Name documents use to reference this plugin.
    fn name(&self) -> &str;

    /// Render discipline; must be [`TEXT_RENDER_TYPE`].
    fn render_type(&self) -> &str {
        TEXT_RENDER_TYPE
    }

    /// Render to a JSON string, or `null` for no text.
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<Value, PluginError>;
}

/// An unvalidated plugin definition, as handed to the renderer.
pub struct PluginDef {
    pub name: String,
    pub render_type: String,
    pub render: Option<RenderFn>,
}

impl PluginDef {
    /// A definition with no render function yet.
    pub fn new(name: impl Into<String>, render_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            render_type: render_type.into(),
            render: None,
        }
    }

    /// A text plugin backed by a closure.
    pub fn text<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut RenderContext<'_>) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        Self::new(name, TEXT_RENDER_TYPE).with_render(render)
    }

    /// Set the render function.
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&mut RenderContext<'_>) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }
}

impl<P: Plugin> From<P> for PluginDef {
    fn from(plugin: P) -> Self {
        Self::new(plugin.name(), plugin.render_type())
            .with_render(move |ctx: &mut RenderContext<'_>| plugin.render(ctx))
    }
}

impl fmt::Debug for PluginDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDef")
            .field("name", &self.name)
            .field("render_type", &self.render_type)
            .field("render", &self.render.is_some())
            .finish()
    }
}

/// Validated plugins keyed by name.
#[derive(Default)]
pub(crate) struct Registry {
    plugins: HashMap<String, RenderFn>,
}

impl Registry {
    /// Validate every definition. A later definition with the same name
    /// replaces an earlier one.
    pub(crate) fn validate(kind: PluginKind, defs: Vec<PluginDef>) -> Result<Self, RenderError> {
        let mut plugins = HashMap::with_capacity(defs.len());
        for def in defs {
            if def.render_type != TEXT_RENDER_TYPE {
                return Err(RenderError::WrongRenderType {
                    kind,
                    name: def.name,
                    found: def.render_type,
                });
            }
            let Some(render) = def.render else {
                return Err(RenderError::MissingRender {
                    kind,
                    name: def.name,
                });
            };
            plugins.insert(def.name, render);
        }
        Ok(Self { plugins })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&RenderFn> {
        self.plugins.get(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.plugins.len()
    }
}
