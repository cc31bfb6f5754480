//! Marker-stack reduction.
//!
//! A section's markers encode nested inline spans as a flat list of
//! "open these markups, emit content, close N spans" steps. [`reduce`]
//! replays those steps against a [`MarkerSink`], keeping the stack of open
//! spans itself so that every sink sees the same traversal.

use tracing::debug;

use crate::{AtomEntry, Marker, MarkerContent, Markup};

/// Receives the output of [`reduce`].
pub trait MarkerSink {
    /// Per-span state kept on the reducer's stack.
    type Span;

    /// Start a span. `markup` is `None` when the marker referenced a markup
    /// index that did not resolve.
    fn open_span(&mut self, markup: Option<&Markup<'_>>) -> Self::Span;

    /// Emit text inside `parent`, or at the top level when no span is open.
    fn push_text(&mut self, parent: Option<&mut Self::Span>, text: &str);

    /// Finish `span`, which was nested inside `parent`.
    fn close_span(&mut self, parent: Option<&mut Self::Span>, span: Self::Span);
}

/// Replay `markers` into `sink`, rendering atoms through `atom_text`.
///
/// Closing more spans than are open is clamped: the surplus closes are
/// dropped and the stack never goes below empty. Spans still open at the end
/// of the marker list are closed so that the sink sees a balanced tree.
pub fn reduce<S, F, E>(markers: &[Marker<'_>], sink: &mut S, mut atom_text: F) -> Result<(), E>
where
    S: MarkerSink,
    F: FnMut(&AtomEntry<'_>) -> Result<String, E>,
{
    let mut stack: Vec<S::Span> = Vec::new();

    for marker in markers {
        for markup in &marker.opens {
            let span = sink.open_span(markup.as_ref());
            stack.push(span);
        }

        match &marker.content {
            MarkerContent::Text(text) => sink.push_text(stack.last_mut(), text),
            MarkerContent::Atom(atom) => {
                let text = atom_text(atom)?;
                sink.push_text(stack.last_mut(), &text);
            }
        }

        if marker.close_count > stack.len() {
            debug!(
                close_count = marker.close_count,
                open = stack.len(),
                "clamping over-closed marker"
            );
        }
        for _ in 0..marker.close_count {
            let Some(span) = stack.pop() else {
                break;
            };
            sink.close_span(stack.last_mut(), span);
        }
    }

    while let Some(span) = stack.pop() {
        sink.close_span(stack.last_mut(), span);
    }

    Ok(())
}

/// Collects only the text of a marker list; spans are structural.
#[derive(Debug, Default)]
pub struct TextSink {
    buffer: String,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl MarkerSink for TextSink {
    type Span = ();

    fn open_span(&mut self, _markup: Option<&Markup<'_>>) {}

    fn push_text(&mut self, _parent: Option<&mut ()>, text: &str) {
        self.buffer.push_str(text);
    }

    fn close_span(&mut self, _parent: Option<&mut ()>, _span: ()) {}
}

/// Reduce a marker list to its concatenated text.
pub fn reduce_to_text<F, E>(markers: &[Marker<'_>], atom_text: F) -> Result<String, E>
where
    F: FnMut(&AtomEntry<'_>) -> Result<String, E>,
{
    let mut sink = TextSink::new();
    reduce(markers, &mut sink, atom_text)?;
    Ok(sink.into_string())
}
