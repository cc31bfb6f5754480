//! Construction and render errors.

use std::fmt;

use richdoc_core::DocumentError;

/// Which plugin table a plugin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Card,
    Atom,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Card => f.write_str("Card"),
            PluginKind::Atom => f.write_str("Atom"),
        }
    }
}

/// Error building a renderer or rendering a document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("`{0}` must be passed as an array")]
    NotAnArray(&'static str),
    #[error("{kind} \"{name}\" must be type \"text\", was \"{found}\"")]
    WrongRenderType {
        kind: PluginKind,
        name: String,
        found: String,
    },
    #[error("{kind} \"{name}\" must define `render`")]
    MissingRender { kind: PluginKind, name: String },
    #[error("{kind} \"{name}\" must render text, got {found}")]
    MustRenderText {
        kind: PluginKind,
        name: String,
        found: &'static str,
    },
    #[error("{kind} \"{name}\" failed to render: {source}")]
    Plugin {
        kind: PluginKind,
        name: String,
        source: PluginError,
    },
    #[error("invalid plugin config: {0}")]
    Config(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Error returned by a plugin's render function.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("{0}")]
    Failed(String),
    /// A nested render inside the plugin failed.
    #[error(transparent)]
    Render(Box<RenderError>),
}

impl PluginError {
    pub fn failed(message: impl Into<String>) -> Self {
        PluginError::Failed(message.into())
    }
}

impl From<RenderError> for PluginError {
    fn from(err: RenderError) -> Self {
        PluginError::Render(Box::new(err))
    }
}
