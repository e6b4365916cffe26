//! SSE line parsing logic
//!
//! Each line goes through three steps, none of which look at neighbouring
//! lines:
//! 1. `unwrap_line` strips one proxy-added `data:` envelope
//! 2. `parse_sse_line` classifies the line into a [`Frame`]
//! 3. `interpret_frame` turns data and plain-text frames into [`SseEvent`]s
//!
//! [`SseParser`] chains the three for a single line.

mod content;
mod control;

use tracing::{debug, trace};

use crate::sse::events::{EventKind, Frame, SseEvent};

pub use content::unescape_text;
use content::parse_text_delta;
use control::{decode_structured, parse_control_payload};

/// No-op terminator inside the data channel
pub const DONE_SENTINEL: &str = "[DONE]";

fn is_framed(line: &str) -> bool {
    line.starts_with("event:") || line.starts_with("data:") || line.starts_with(':')
}

/// Strip one `data:` envelope added by the proxy.
///
/// The proxy wraps every original line, so `data:event: init` carries an
/// `event:` line and `data:data: Hola` carries a `data:` line. The envelope
/// is only removed when what is inside is itself a framed line; a plain
/// `data: Hola` is an ordinary data line and is returned unchanged. Exactly
/// one level is removed.
pub fn unwrap_line(line: &str) -> &str {
    if let Some(inner) = line.strip_prefix("data:") {
        let inner = inner.trim();
        if is_framed(inner) {
            return inner;
        }
    }
    line
}

/// Classify a trimmed, unwrapped line
pub fn parse_sse_line(line: &str) -> Frame {
    if line.is_empty() {
        return Frame::Ignorable;
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return Frame::EventMarker {
            kind: EventKind::from_name(rest.trim()),
        };
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return Frame::DataPayload {
            raw: rest.trim().to_string(),
        };
    }

    if line.starts_with(':') {
        return Frame::Ignorable;
    }

    // The backend should not send unprefixed lines, but the text must not be lost
    Frame::PlainText {
        text: line.to_string(),
    }
}

/// Interpret a data payload.
///
/// Empty payloads and the `[DONE]` sentinel produce nothing. A JSON object
/// becomes a control message (or nothing, if it matches no known key).
/// Anything else is literal text.
pub fn interpret_payload(raw: &str) -> Option<SseEvent> {
    if raw.is_empty() || raw == DONE_SENTINEL {
        return None;
    }

    match decode_structured(raw) {
        Some(payload) => parse_control_payload(&payload).map(SseEvent::Control),
        None => Some(parse_text_delta(raw)),
    }
}

/// Interpret a classified frame
pub fn interpret_frame(frame: &Frame) -> Option<SseEvent> {
    match frame {
        Frame::EventMarker { .. } | Frame::Ignorable => None,
        Frame::DataPayload { raw } => interpret_payload(raw),
        // Plain text never goes through structured decoding
        Frame::PlainText { text } => Some(parse_text_delta(text)),
    }
}

/// Line-at-a-time parser.
///
/// Holds only the last event marker seen, which is informational: payloads
/// are interpreted from their own content, never from the preceding marker.
#[derive(Debug, Default)]
pub struct SseParser {
    last_marker: Option<EventKind>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line (without its `\n`), returning the event it carries.
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
        if line.is_empty() {
            return None;
        }

        let frame = parse_sse_line(unwrap_line(line));
        trace!(?frame, "classified line");

        if let Frame::EventMarker { kind } = &frame {
            if *kind == EventKind::Complete {
                debug!("backend signalled completion");
            }
            self.last_marker = Some(kind.clone());
        }

        interpret_frame(&frame)
    }

    /// The most recent `event:` marker, if any.
    pub fn last_marker(&self) -> Option<&EventKind> {
        self.last_marker.as_ref()
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.last_marker = None;
    }
}
