//! Normalized document model shared by every supported revision.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::DocumentError;

/// Section kind discriminators, the first element of every section tuple.
pub mod section_kind {
    pub const MARKUP: i64 = 1;
    pub const IMAGE: i64 = 2;
    pub const LIST: i64 = 3;
    pub const CARD: i64 = 10;
}

/// Marker kind discriminators used from 0.3.0 onwards.
pub mod marker_kind {
    pub const MARKUP: i64 = 0;
    pub const ATOM: i64 = 1;
}

/// Tag names accepted for markup sections in every revision.
pub const MARKUP_SECTION_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pull-quote",
];

/// Markup section tag introduced in 0.3.1.
pub const ASIDE_TAG: &str = "aside";

/// Tag names accepted for list sections.
pub const LIST_SECTION_TAGS: &[&str] = &["ul", "ol"];

/// Tag names accepted for inline markups.
pub const MARKUP_TAGS: &[&str] = &["a", "b", "code", "em", "i", "s", "strong", "sub", "sup", "u"];

static EMPTY_PAYLOAD: LazyLock<Value> = LazyLock::new(|| Value::Object(Map::new()));

/// Payload used for cards and atoms that were encoded without one.
pub fn empty_payload() -> &'static Value {
    &EMPTY_PAYLOAD
}

fn contains_tag(tags: &[&str], tag: &str) -> bool {
    tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// A supported document revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    V0_2_0,
    V0_3_0,
    V0_3_1,
}

impl Version {
    /// Every supported revision, oldest first.
    pub const ALL: [Version; 3] = [Version::V0_2_0, Version::V0_3_0, Version::V0_3_1];

    /// The version string as it appears in a document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V0_2_0 => "0.2.0",
            Version::V0_3_0 => "0.3.0",
            Version::V0_3_1 => "0.3.1",
        }
    }

    /// Whether this revision has atom markers and top-level entry tables.
    pub fn has_atoms(&self) -> bool {
        !matches!(self, Version::V0_2_0)
    }

    /// Whether `tag` is a markup section tag defined by this revision.
    pub fn allows_section_tag(&self, tag: &str) -> bool {
        contains_tag(MARKUP_SECTION_TAGS, tag)
            || (matches!(self, Version::V0_3_1) && tag.eq_ignore_ascii_case(ASIDE_TAG))
    }

    /// Whether `tag` is a list section tag.
    pub fn allows_list_tag(&self, tag: &str) -> bool {
        contains_tag(LIST_SECTION_TAGS, tag)
    }
}

impl FromStr for Version {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DocumentError::UnexpectedVersion(s.to_string()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized document. Borrows all text and payloads from its source value.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub version: Version,
    pub sections: Vec<Section<'a>>,
}

/// A top-level content block.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<'a> {
    Markup {
        tag: &'a str,
        markers: Vec<Marker<'a>>,
    },
    List {
        tag: &'a str,
        items: Vec<Vec<Marker<'a>>>,
    },
    Image {
        url: &'a str,
    },
    Card(CardEntry<'a>),
}

/// An inline span type: tag name plus ordered attribute pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup<'a> {
    pub tag: &'a str,
    pub attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> Markup<'a> {
    pub fn new(tag: &'a str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute pair.
    pub fn attr(mut self, name: &'a str, value: &'a str) -> Self {
        self.attributes.push((name, value));
        self
    }

    /// Whether the tag is one of the recognized inline markup tags.
    pub fn is_known(&self) -> bool {
        contains_tag(MARKUP_TAGS, self.tag)
    }
}

/// The smallest unit of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker<'a> {
    /// Spans opened at this marker, outermost first. `None` marks a span whose
    /// markup index did not resolve; it still takes part in nesting.
    pub opens: Vec<Option<Markup<'a>>>,
    /// Number of open spans closed after this marker's content.
    pub close_count: usize,
    pub content: MarkerContent<'a>,
}

impl<'a> Marker<'a> {
    /// A marker carrying literal text.
    pub fn text(text: &'a str) -> Self {
        Self {
            opens: Vec::new(),
            close_count: 0,
            content: MarkerContent::Text(text),
        }
    }

    /// A marker carrying an atom.
    pub fn atom(atom: AtomEntry<'a>) -> Self {
        Self {
            opens: Vec::new(),
            close_count: 0,
            content: MarkerContent::Atom(atom),
        }
    }

    /// Open a span at this marker.
    pub fn open(mut self, markup: Option<Markup<'a>>) -> Self {
        self.opens.push(markup);
        self
    }

    /// Close `count` spans after this marker.
    pub fn close(mut self, count: usize) -> Self {
        self.close_count = count;
        self
    }
}

/// What a marker contributes to the output.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerContent<'a> {
    Text(&'a str),
    Atom(AtomEntry<'a>),
}

/// An inline embedded value rendered by an atom plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomEntry<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub payload: &'a Value,
}

/// A block-level embed rendered by a card plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct CardEntry<'a> {
    pub name: &'a str,
    pub payload: &'a Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!("0.2.0".parse::<Version>().unwrap(), Version::V0_2_0);
        assert_eq!("0.3.1".parse::<Version>().unwrap(), Version::V0_3_1);
    }

    #[test]
    fn test_version_rejects_unknown() {
        let err = "0.2.1".parse::<Version>().unwrap_err();
        assert!(err.to_string().contains("0.2.1"));
    }

    #[test]
    fn test_aside_only_in_0_3_1() {
        assert!(!Version::V0_3_0.allows_section_tag("aside"));
        assert!(Version::V0_3_1.allows_section_tag("ASIDE"));
        assert!(Version::V0_2_0.allows_section_tag("P"));
    }

    #[test]
    fn test_markup_known() {
        assert!(Markup::new("B").is_known());
        assert!(Markup::new("a").attr("href", "x").is_known());
        assert!(!Markup::new("script").is_known());
    }
}
