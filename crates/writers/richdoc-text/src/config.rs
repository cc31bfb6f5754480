//! Template plugins loaded from configuration data.
//!
//! A plugin file declares cards and atoms whose `render` is a template
//! string rather than code:
//!
//! ```toml
//! [card_options]
//! site = "example.com"
//!
//! [[cards]]
//! name = "title-card"
//! type = "text"
//! render = "== {payload.title} =="
//!
//! [[atoms]]
//! name = "mention"
//! type = "text"
//! render = "@{value}"
//! ```
//!
//! Templates substitute `{name}`, `{value}` and `{payload.<key>}`. Any other
//! braced text is kept as written.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{PluginDef, RenderContext, RenderError, RendererConfig};

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    name: String,
    #[serde(rename = "type")]
    render_type: Option<String>,
    render: Option<String>,
}

impl TemplateEntry {
    fn into_plugin(self) -> PluginDef {
        let def = PluginDef::new(self.name, self.render_type.unwrap_or_default());
        match self.render {
            Some(template) => {
                def.with_render(move |ctx: &mut RenderContext<'_>| Ok(expand(&template, ctx).into()))
            }
            None => def,
        }
    }
}

impl RendererConfig {
    /// Build a config from a decoded plugin file.
    ///
    /// Plugins are not validated here; [`crate::Renderer::new`] does that.
    pub fn from_value(value: &Value) -> Result<Self, RenderError> {
        let table = value
            .as_object()
            .ok_or_else(|| RenderError::Config("expected a table at the top level".into()))?;

        let mut config = RendererConfig::new();
        config.cards = plugin_entries(table, "cards")?;
        config.atoms = plugin_entries(table, "atoms")?;
        if let Some(options) = table.get("card_options") {
            config.card_options = options.clone();
        }
        Ok(config)
    }
}

fn plugin_entries(table: &Map<String, Value>, key: &'static str) -> Result<Vec<PluginDef>, RenderError> {
    match table.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                TemplateEntry::deserialize(item)
                    .map(TemplateEntry::into_plugin)
                    .map_err(|e| RenderError::Config(format!("{key}[{i}]: {e}")))
            })
            .collect(),
        Some(_) => Err(RenderError::NotAnArray(key)),
    }
}

/// Substitute placeholders in `template`.
fn expand(template: &str, ctx: &RenderContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match placeholder(key, ctx) {
            Some(text) => out.push_str(&text),
            None => out.push_str(&rest[start..start + end + 2]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn placeholder(key: &str, ctx: &RenderContext<'_>) -> Option<String> {
    match key {
        "name" => Some(ctx.env.name.to_string()),
        "value" => Some(ctx.value.unwrap_or_default().to_string()),
        _ => {
            let field = key.strip_prefix("payload.")?;
            Some(match ctx.payload.get(field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Env, Teardown};
    use serde_json::json;

    fn expand_with(template: &str, payload: &Value, value: Option<&str>) -> String {
        let mut teardown = Teardown::new();
        let options = json!({});
        let ctx = RenderContext {
            payload,
            value,
            options: &options,
            env: Env::new("thing", &mut teardown),
        };
        expand(template, &ctx)
    }

    #[test]
    fn test_expand_placeholders() {
        let payload = json!({"title": "Hello", "count": 3, "nested": {"a": 1}});
        assert_eq!(
            expand_with("{name}: {payload.title} x{payload.count}{payload.nested}", &payload, None),
            "thing: Hello x3"
        );
        assert_eq!(expand_with("@{value}", &payload, Some("bob")), "@bob");
    }

    #[test]
    fn test_expand_keeps_unknown_braces() {
        let payload = json!({});
        assert_eq!(expand_with("{other} and {", &payload, None), "{other} and {");
    }

    #[test]
    fn test_from_value() {
        let value = json!({
            "card_options": {"site": "example.com"},
            "cards": [{"name": "title", "type": "text", "render": "== {payload.title} =="}],
            "atoms": [{"name": "mention", "type": "text", "render": "@{value}"}]
        });
        let config = RendererConfig::from_value(&value).unwrap();
        assert_eq!(config.cards.len(), 1);
        assert_eq!(config.atoms[0].name, "mention");
        assert_eq!(config.card_options, json!({"site": "example.com"}));
    }

    #[test]
    fn test_cards_must_be_array() {
        let err = RendererConfig::from_value(&json!({"cards": {}})).unwrap_err();
        assert_eq!(err.to_string(), "`cards` must be passed as an array");

        let err = RendererConfig::from_value(&json!({"atoms": "mention"})).unwrap_err();
        assert_eq!(err.to_string(), "`atoms` must be passed as an array");
    }

    #[test]
    fn test_missing_fields_survive_until_validation() {
        let value = json!({"cards": [{"name": "bad", "type": "other", "render": "x"}, {"name": "bare"}]});
        let config = RendererConfig::from_value(&value).unwrap();
        assert_eq!(config.cards[0].render_type, "other");
        assert!(config.cards[1].render.is_none());
    }

    #[test]
    fn test_entry_without_name() {
        let err = RendererConfig::from_value(&json!({"cards": [{"type": "text"}]})).unwrap_err();
        assert!(matches!(err, RenderError::Config(ref msg) if msg.starts_with("cards[0]")));
    }
}
