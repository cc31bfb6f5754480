#![no_main]

use libfuzzer_sys::fuzz_target;
use richdoc_text::{PluginDef, Renderer, RendererConfig};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let renderer = Renderer::new(
        RendererConfig::new()
            .with_card(PluginDef::text("echo", |ctx| Ok(Value::String(ctx.payload.to_string()))))
            .with_unknown_atom_handler(|ctx| Ok(ctx.value.map(Into::into).unwrap_or(Value::Null))),
    );
    let Ok(renderer) = renderer else {
        return;
    };

    if let Ok(mut rendered) = renderer.render(&input) {
        rendered.teardown.run();
    }
});
