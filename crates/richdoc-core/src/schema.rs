//! Schema adapter: turns any supported revision into a [`Document`].
//!
//! Revision 0.2.0 stores its markup table and section list positionally in
//! `sections: [markerTypes, sectionList]` and names cards inline. Revisions
//! 0.3.x carry top-level `markups`, `atoms` and `cards` tables that sections
//! and markers reference by index. All index resolution happens here so that
//! later stages never look anything up.

use serde_json::Value;
use tracing::debug;

use crate::{
    AtomEntry, CardEntry, Document, DocumentError, EntryKind, Marker, MarkerContent, Markup,
    Section, Version, empty_payload, marker_kind, section_kind,
};

/// Normalize a decoded document into the version-independent model.
pub fn normalize(input: &Value) -> Result<Document<'_>, DocumentError> {
    let version = read_version(input)?;
    let schema = Schema::new(input, version)?;
    let sections = schema.sections()?;

    debug!(%version, sections = sections.len(), "normalized document");
    Ok(Document { version, sections })
}

/// Read and validate the `version` field.
pub fn read_version(input: &Value) -> Result<Version, DocumentError> {
    match input.get("version") {
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(DocumentError::UnexpectedVersion(other.to_string())),
        None => Err(DocumentError::malformed("version", "missing")),
    }
}

/// Per-revision positional layout.
enum Schema<'a> {
    /// 0.2.0: inline card references, no atoms.
    Legacy {
        markups: Vec<Markup<'a>>,
        sections: &'a [Value],
    },
    /// 0.3.x: index references into top-level tables.
    Indexed {
        version: Version,
        markups: Vec<Markup<'a>>,
        atoms: Vec<AtomEntry<'a>>,
        cards: Vec<CardEntry<'a>>,
        sections: &'a [Value],
    },
}

impl<'a> Schema<'a> {
    fn new(input: &'a Value, version: Version) -> Result<Self, DocumentError> {
        let sections = input
            .get("sections")
            .ok_or_else(|| DocumentError::malformed("sections", "missing"))?;

        if !version.has_atoms() {
            let parts = array(sections, "sections")?;
            let markup_table = element(parts, 0, "sections")?;
            let section_list = element(parts, 1, "sections")?;
            return Ok(Schema::Legacy {
                markups: markup_table_entries(markup_table, "sections[0]")?,
                sections: array(section_list, "sections[1]")?,
            });
        }

        let markups = match input.get("markups") {
            Some(table) => markup_table_entries(table, "markups")?,
            None => Vec::new(),
        };
        let atoms = match input.get("atoms") {
            Some(table) => array(table, "atoms")?
                .iter()
                .enumerate()
                .map(|(i, entry)| atom_entry(entry, &format!("atoms[{i}]")))
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };
        let cards = match input.get("cards") {
            Some(table) => array(table, "cards")?
                .iter()
                .enumerate()
                .map(|(i, entry)| -> Result<CardEntry<'a>, DocumentError> {
                    let path = format!("cards[{i}]");
                    let fields = array(entry, &path)?;
                    card_entry(fields, 0, &path)
                })
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };

        Ok(Schema::Indexed {
            version,
            markups,
            atoms,
            cards,
            sections: array(sections, "sections")?,
        })
    }

    fn version(&self) -> Version {
        match self {
            Schema::Legacy { .. } => Version::V0_2_0,
            Schema::Indexed { version, .. } => *version,
        }
    }

    fn raw_sections(&self) -> &'a [Value] {
        match self {
            Schema::Legacy { sections, .. } | Schema::Indexed { sections, .. } => *sections,
        }
    }

    fn markups(&self) -> &[Markup<'a>] {
        match self {
            Schema::Legacy { markups, .. } | Schema::Indexed { markups, .. } => markups,
        }
    }

    fn sections(&self) -> Result<Vec<Section<'a>>, DocumentError> {
        let prefix = match self {
            Schema::Legacy { .. } => "sections[1]",
            Schema::Indexed { .. } => "sections",
        };
        self.raw_sections()
            .iter()
            .enumerate()
            .map(|(i, section)| self.section(section, &format!("{prefix}[{i}]")))
            .collect()
    }

    fn section(&self, value: &'a Value, path: &str) -> Result<Section<'a>, DocumentError> {
        let fields = array(value, path)?;
        let kind = integer(element(fields, 0, path)?, &format!("{path}[0]"))?;

        match kind {
            section_kind::MARKUP => {
                let tag = string(element(fields, 1, path)?, &format!("{path}[1]"))?;
                if !self.version().allows_section_tag(tag) {
                    debug!(tag, "unrecognized markup section tag");
                }
                let markers = self.markers(element(fields, 2, path)?, &format!("{path}[2]"))?;
                Ok(Section::Markup { tag, markers })
            }
            section_kind::IMAGE => {
                let url = string(element(fields, 1, path)?, &format!("{path}[1]"))?;
                Ok(Section::Image { url })
            }
            section_kind::LIST => {
                let tag = string(element(fields, 1, path)?, &format!("{path}[1]"))?;
                if !self.version().allows_list_tag(tag) {
                    debug!(tag, "unrecognized list section tag");
                }
                let items_path = format!("{path}[2]");
                let items = array(element(fields, 2, path)?, &items_path)?
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.markers(item, &format!("{items_path}[{i}]")))
                    .collect::<Result<_, _>>()?;
                Ok(Section::List { tag, items })
            }
            section_kind::CARD => self.card_section(fields, path).map(Section::Card),
            other => Err(DocumentError::UnknownSectionKind(other)),
        }
    }

    fn card_section(&self, fields: &'a [Value], path: &str) -> Result<CardEntry<'a>, DocumentError> {
        match self {
            Schema::Legacy { .. } => card_entry(fields, 1, path),
            Schema::Indexed { cards, .. } => {
                let index = count(element(fields, 1, path)?, &format!("{path}[1]"))?;
                resolve(cards, index, EntryKind::Card)
            }
        }
    }

    fn markers(&self, value: &'a Value, path: &str) -> Result<Vec<Marker<'a>>, DocumentError> {
        array(value, path)?
            .iter()
            .enumerate()
            .map(|(i, marker)| self.marker(marker, &format!("{path}[{i}]")))
            .collect()
    }

    fn marker(&self, value: &'a Value, path: &str) -> Result<Marker<'a>, DocumentError> {
        let fields = array(value, path)?;

        // Legacy markers have no kind prefix and are always text.
        let (kind, offset) = match self {
            Schema::Legacy { .. } => (marker_kind::MARKUP, 0),
            Schema::Indexed { .. } => {
                let kind = integer(element(fields, 0, path)?, &format!("{path}[0]"))?;
                (kind, 1)
            }
        };

        let opens_path = format!("{path}[{offset}]");
        let opens = array(element(fields, offset, path)?, &opens_path)?
            .iter()
            .enumerate()
            .map(|(i, index)| -> Result<Option<Markup<'a>>, DocumentError> {
                let index = count(index, &format!("{opens_path}[{i}]"))?;
                let markup = self.markups().get(index).cloned();
                if markup.is_none() {
                    debug!(index, "marker opens an unresolved markup");
                }
                Ok(markup)
            })
            .collect::<Result<_, _>>()?;

        let close_count = count(
            element(fields, offset + 1, path)?,
            &format!("{path}[{}]", offset + 1),
        )?;

        let content_path = format!("{path}[{}]", offset + 2);
        let content_value = element(fields, offset + 2, path)?;
        let content = match (kind, self) {
            (marker_kind::MARKUP, _) => MarkerContent::Text(string(content_value, &content_path)?),
            (marker_kind::ATOM, Schema::Indexed { atoms, .. }) => {
                let index = count(content_value, &content_path)?;
                MarkerContent::Atom(resolve(atoms, index, EntryKind::Atom)?)
            }
            (other, _) => return Err(DocumentError::UnknownMarkerKind(other)),
        };

        Ok(Marker {
            opens,
            close_count,
            content,
        })
    }
}

fn resolve<T: Clone>(entries: &[T], index: usize, kind: EntryKind) -> Result<T, DocumentError> {
    entries
        .get(index)
        .cloned()
        .ok_or(DocumentError::IndexOutOfBounds {
            kind,
            index,
            len: entries.len(),
        })
}

fn markup_table_entries<'a>(value: &'a Value, path: &str) -> Result<Vec<Markup<'a>>, DocumentError> {
    array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, entry)| markup_entry(entry, &format!("{path}[{i}]")))
        .collect()
}

/// `[tagName, [name, value, name, value, ...]?]`
fn markup_entry<'a>(value: &'a Value, path: &str) -> Result<Markup<'a>, DocumentError> {
    let fields = array(value, path)?;
    let tag = string(element(fields, 0, path)?, &format!("{path}[0]"))?;

    let mut markup = Markup::new(tag);
    if let Some(attributes) = fields.get(1) {
        let attrs_path = format!("{path}[1]");
        let flat = array(attributes, &attrs_path)?;
        if flat.len() % 2 != 0 {
            return Err(DocumentError::malformed(
                attrs_path,
                "attribute list must hold name/value pairs",
            ));
        }
        for (i, pair) in flat.chunks_exact(2).enumerate() {
            let name = string(&pair[0], &format!("{attrs_path}[{}]", i * 2))?;
            let value = string(&pair[1], &format!("{attrs_path}[{}]", i * 2 + 1))?;
            markup = markup.attr(name, value);
        }
    }
    Ok(markup)
}

/// `[name, value, payload?]`
fn atom_entry<'a>(value: &'a Value, path: &str) -> Result<AtomEntry<'a>, DocumentError> {
    let fields = array(value, path)?;
    Ok(AtomEntry {
        name: string(element(fields, 0, path)?, &format!("{path}[0]"))?,
        value: string(element(fields, 1, path)?, &format!("{path}[1]"))?,
        payload: payload(fields.get(2)),
    })
}

/// `[..., name, payload?]` starting at `offset`.
fn card_entry<'a>(
    fields: &'a [Value],
    offset: usize,
    path: &str,
) -> Result<CardEntry<'a>, DocumentError> {
    Ok(CardEntry {
        name: string(element(fields, offset, path)?, &format!("{path}[{offset}]"))?,
        payload: payload(fields.get(offset + 1)),
    })
}

fn payload(value: Option<&Value>) -> &Value {
    match value {
        Some(Value::Null) | None => empty_payload(),
        Some(payload) => payload,
    }
}

fn array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], DocumentError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DocumentError::malformed(path, "expected an array"))
}

fn element<'a>(fields: &'a [Value], index: usize, path: &str) -> Result<&'a Value, DocumentError> {
    fields
        .get(index)
        .ok_or_else(|| DocumentError::malformed(format!("{path}[{index}]"), "missing"))
}

fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str, DocumentError> {
    value
        .as_str()
        .ok_or_else(|| DocumentError::malformed(path, "expected a string"))
}

fn integer(value: &Value, path: &str) -> Result<i64, DocumentError> {
    value
        .as_i64()
        .ok_or_else(|| DocumentError::malformed(path, "expected an integer"))
}

fn count(value: &Value, path: &str) -> Result<usize, DocumentError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| DocumentError::malformed(path, "expected a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_markers_resolve_markups() {
        let input = json!({
            "version": "0.2.0",
            "sections": [
                [["B"], ["A", ["href", "http://example.com"]]],
                [[1, "P", [[[0, 1], 2, "hello"]]]]
            ]
        });
        let doc = normalize(&input).unwrap();
        assert_eq!(doc.version, Version::V0_2_0);

        let Section::Markup { tag, markers } = &doc.sections[0] else {
            panic!("expected markup section");
        };
        assert_eq!(*tag, "P");
        assert_eq!(markers[0].close_count, 2);
        assert_eq!(markers[0].opens[0], Some(Markup::new("B")));
        assert_eq!(
            markers[0].opens[1],
            Some(Markup::new("A").attr("href", "http://example.com"))
        );
        assert_eq!(markers[0].content, MarkerContent::Text("hello"));
    }

    #[test]
    fn test_legacy_card_is_inline() {
        let input = json!({
            "version": "0.2.0",
            "sections": [[], [[10, "image-card", {"src": "bob.gif"}], [10, "bare"]]]
        });
        let doc = normalize(&input).unwrap();
        assert_eq!(
            doc.sections[0],
            Section::Card(CardEntry {
                name: "image-card",
                payload: &json!({"src": "bob.gif"}),
            })
        );
        let Section::Card(bare) = &doc.sections[1] else {
            panic!("expected card section");
        };
        assert_eq!(bare.payload, &json!({}));
    }

    #[test]
    fn test_indexed_atoms_and_cards() {
        let input = json!({
            "version": "0.3.0",
            "markups": [],
            "atoms": [["mention", "@bob", {"id": 42}]],
            "cards": [["title-card"]],
            "sections": [
                [1, "p", [[1, [], 0, 0], [0, [], 0, " says hi"]]],
                [10, 0]
            ]
        });
        let doc = normalize(&input).unwrap();

        let Section::Markup { markers, .. } = &doc.sections[0] else {
            panic!("expected markup section");
        };
        let MarkerContent::Atom(atom) = &markers[0].content else {
            panic!("expected atom marker");
        };
        assert_eq!(atom.name, "mention");
        assert_eq!(atom.value, "@bob");
        assert_eq!(atom.payload, &json!({"id": 42}));

        let Section::Card(card) = &doc.sections[1] else {
            panic!("expected card section");
        };
        assert_eq!(card.name, "title-card");
    }

    #[test]
    fn test_list_items() {
        let input = json!({
            "version": "0.3.1",
            "sections": [[3, "ul", [[[0, [], 0, "one"]], [[0, [], 0, "two"]]]]]
        });
        let doc = normalize(&input).unwrap();
        let Section::List { tag, items } = &doc.sections[0] else {
            panic!("expected list section");
        };
        assert_eq!(*tag, "ul");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_unresolved_markup_index_is_tolerated() {
        let input = json!({
            "version": "0.3.0",
            "markups": [["b"]],
            "sections": [[1, "p", [[0, [7], 1, "text"]]]]
        });
        let doc = normalize(&input).unwrap();
        let Section::Markup { markers, .. } = &doc.sections[0] else {
            panic!("expected markup section");
        };
        assert_eq!(markers[0].opens, vec![None]);
    }

    #[test]
    fn test_card_index_out_of_bounds() {
        let input = json!({
            "version": "0.3.0",
            "cards": [],
            "sections": [[10, 3]]
        });
        let err = normalize(&input).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::IndexOutOfBounds {
                kind: EntryKind::Card,
                index: 3,
                len: 0
            }
        ));
    }

    #[test]
    fn test_atom_marker_rejected_in_legacy() {
        // Legacy markers carry no kind prefix, so a numeric text slot is malformed.
        let input = json!({
            "version": "0.2.0",
            "sections": [[], [[1, "p", [[[], 0, 0]]]]]
        });
        assert!(matches!(
            normalize(&input),
            Err(DocumentError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unknown_section_kind() {
        let input = json!({"version": "0.3.0", "sections": [[99, "x"]]});
        assert!(matches!(
            normalize(&input),
            Err(DocumentError::UnknownSectionKind(99))
        ));
    }

    #[test]
    fn test_unknown_marker_kind() {
        let input = json!({"version": "0.3.0", "sections": [[1, "p", [[5, [], 0, "x"]]]]});
        assert!(matches!(
            normalize(&input),
            Err(DocumentError::UnknownMarkerKind(5))
        ));
    }

    #[test]
    fn test_non_string_version() {
        let input = json!({"version": 3, "sections": []});
        let err = normalize(&input).unwrap_err();
        assert!(matches!(err, DocumentError::UnexpectedVersion(ref v) if v == "3"));
    }

    #[test]
    fn test_malformed_path_is_reported() {
        let input = json!({"version": "0.3.0", "sections": [[1, "p", [[0, [], -1, "x"]]]]});
        let err = normalize(&input).unwrap_err();
        assert!(err.to_string().contains("sections[0][2][0][2]"));
    }

    #[test]
    fn test_odd_attribute_list() {
        let input = json!({
            "version": "0.3.0",
            "markups": [["a", ["href"]]],
            "sections": []
        });
        assert!(matches!(
            normalize(&input),
            Err(DocumentError::Malformed { .. })
        ));
    }
}
