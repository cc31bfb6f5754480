#![no_main]

use libfuzzer_sys::fuzz_target;
use richdoc_core::{AtomEntry, Document, Marker, Section, dom, normalize, reduce_to_text};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(document) = normalize(&input) else {
        return;
    };

    // Unbalanced marker lists must reduce without panicking.
    for markers in marker_lists(&document) {
        let _ = reduce_to_text(markers, atom_value);
        if let Ok(fragment) = dom::reduce_to_dom(markers, atom_value) {
            let _ = fragment.to_html();
        }
    }
});

fn atom_value(atom: &AtomEntry<'_>) -> Result<String, ()> {
    Ok(atom.value.to_string())
}

fn marker_lists<'d>(document: &'d Document<'_>) -> Vec<&'d [Marker<'d>]> {
    let mut lists = Vec::new();
    for section in &document.sections {
        match section {
            Section::Markup { markers, .. } => lists.push(markers.as_slice()),
            Section::List { items, .. } => lists.extend(items.iter().map(Vec::as_slice)),
            Section::Image { .. } | Section::Card(_) => {}
        }
    }
    lists
}
