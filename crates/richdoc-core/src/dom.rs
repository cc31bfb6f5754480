//! Minimal DOM used as an alternate output sink for marker reduction.
//!
//! The text renderer never builds a tree; this exists for hosts that want
//! markup output from the same traversal.

use std::fmt::{self, Write};

use tracing::debug;

use crate::{AtomEntry, Marker, MarkerSink, Markup, reduce};

/// Elements serialized without children or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// A DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element. An element with an empty tag name is a fragment: it
/// serializes as its children only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element. Tag names are lower-cased.
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a fragment.
    pub fn fragment() -> Self {
        Self::new("")
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn is_fragment(&self) -> bool {
        self.tag_name.is_empty()
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag_name.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Set an attribute, replacing any existing value for the same name.
    /// Names are lower-cased. Names that cannot be serialized as an HTML
    /// attribute name are dropped.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        if !is_valid_attribute_name(name) {
            debug!(name, "dropping invalid attribute name");
            return;
        }
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Serialize to HTML. Text and attribute values are escaped.
    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => fmt::Display::fmt(element, f),
            Node::Text(text) => f.write_str(&htmlescape::encode_minimal(text)),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fragment() {
            return self.children
                .iter()
                .try_for_each(|child| fmt::Display::fmt(child, f));
        }

        write!(f, "<{}", self.tag_name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, htmlescape::encode_minimal(value))?;
        }
        f.write_char('>')?;

        if !self.is_void() {
            for child in &self.children {
                fmt::Display::fmt(child, f)?;
            }
            write!(f, "</{}>", self.tag_name)?;
        }
        Ok(())
    }
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace()
                && !c.is_control()
                && !matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        })
}

pub fn create_element(tag_name: &str) -> Element {
    Element::new(tag_name)
}

pub fn create_text_node(text: &str) -> Node {
    Node::Text(text.to_string())
}

pub fn append_child(parent: &mut Element, child: impl Into<Node>) {
    parent.append_child(child);
}

pub fn set_attribute(element: &mut Element, name: &str, value: &str) {
    element.set_attribute(name, value);
}

/// Deepest element nesting [`DomSink`] builds. Spans opened below this
/// depth keep their text but add no element.
pub const MAX_ELEMENT_DEPTH: usize = 256;

/// Builds a fragment from a marker list. Unrecognized markup tags become
/// transparent fragments, so their text is kept but the tag is not emitted.
///
/// Fragments are spliced into their parent when closed, so the tree is
/// never deeper than [`MAX_ELEMENT_DEPTH`] however deeply the markers nest.
#[derive(Debug)]
pub struct DomSink {
    root: Element,
    open_elements: usize,
}

impl DomSink {
    pub fn new() -> Self {
        Self {
            root: Element::fragment(),
            open_elements: 0,
        }
    }

    pub fn into_fragment(self) -> Element {
        self.root
    }
}

impl Default for DomSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerSink for DomSink {
    type Span = Element;

    fn open_span(&mut self, markup: Option<&Markup<'_>>) -> Element {
        match markup {
            Some(markup) if markup.is_known() && self.open_elements < MAX_ELEMENT_DEPTH => {
                self.open_elements += 1;
                let mut element = create_element(markup.tag);
                for (name, value) in &markup.attributes {
                    set_attribute(&mut element, name, value);
                }
                element
            }
            _ => Element::fragment(),
        }
    }

    fn push_text(&mut self, parent: Option<&mut Element>, text: &str) {
        append_child(parent.unwrap_or(&mut self.root), create_text_node(text));
    }

    fn close_span(&mut self, parent: Option<&mut Element>, span: Element) {
        let parent = parent.unwrap_or(&mut self.root);
        if span.is_fragment() {
            parent.children.extend(span.children);
        } else {
            self.open_elements -= 1;
            append_child(parent, span);
        }
    }
}

/// Reduce a marker list into a DOM fragment.
pub fn reduce_to_dom<F, E>(markers: &[Marker<'_>], atom_text: F) -> Result<Element, E>
where
    F: FnMut(&AtomEntry<'_>) -> Result<String, E>,
{
    let mut sink = DomSink::new();
    reduce(markers, &mut sink, atom_text)?;
    Ok(sink.into_fragment())
}
