//! Wire protocol for the chat event stream.
//!
//! One exchange is delivered as a sequence of text frames, each an
//! `event:` line plus a single-line `data:` line, terminated by a
//! blank line. [`Event`] is the typed view used on both ends;
//! [`FrameReader`] reassembles frames from arbitrarily-chunked bytes.

pub mod reader;

pub use reader::{Frame, FrameReader};

use crate::expression::Expression;

/// Event name used when a frame arrives without an `event:` line.
pub const GENERIC_EVENT: &str = "message";

/// A typed event within one exchange.
///
/// Events are totally ordered; [`Event::Done`] is always terminal and
/// emitted exactly once, even when an upstream phase failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One increment of generated text, in arrival order.
    Text(String),
    /// Classified expression for the full response.
    Expression(Expression),
    /// Synthesis is starting; lets the client show a loading state.
    AudioStart,
    /// Base64-encoded audio payload.
    Audio(String),
    /// Synthesis failed or timed out; the client falls back to text-only.
    AudioError,
    /// Terminal marker for the exchange.
    Done,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Text(_) => "text",
            Event::Expression(_) => "expression",
            Event::AudioStart => "audio_start",
            Event::Audio(_) => "audio",
            Event::AudioError => "audio_error",
            Event::Done => "done",
        }
    }

    pub fn data(&self) -> &str {
        match self {
            Event::Text(text) => text,
            Event::Expression(expression) => expression.as_str(),
            Event::Audio(payload) => payload,
            Event::AudioStart | Event::AudioError | Event::Done => "",
        }
    }

    /// Encode to the wire shape: `event: <name>\ndata: <payload>\n\n`.
    ///
    /// The `data:` line must stay a single line, so line breaks in the
    /// payload are escaped here and undone in [`Event::from_frame`].
    /// Generated text routinely carries paragraph breaks; writing them
    /// raw would terminate the frame early.
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), escape_data(self.data()))
    }

    /// Interpret a raw frame as a typed event.
    ///
    /// Frames with unknown or generic event names (including the
    /// `"message"` default) are not part of the exchange protocol and
    /// map to `None`.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.event.as_str() {
            "text" => Some(Event::Text(unescape_data(&frame.data))),
            "expression" => Some(Event::Expression(
                Expression::from_label(&frame.data).unwrap_or_default(),
            )),
            "audio_start" => Some(Event::AudioStart),
            "audio" => Some(Event::Audio(unescape_data(&frame.data))),
            "audio_error" => Some(Event::AudioError),
            "done" => Some(Event::Done),
            _ => None,
        }
    }
}

/// Escape a payload to fit on one `data:` line.
fn escape_data(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for c in data.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Undo [`escape_data`]. Unrecognized escapes pass through verbatim.
fn unescape_data(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let mut chars = data.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
