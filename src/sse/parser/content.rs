//! Text delta handling

use crate::sse::events::SseEvent;

/// Replace literal `\n` and `\r` escape pairs with real control characters.
///
/// The backend escapes newlines so that each delta fits on one `data:` line.
pub fn unescape_text(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\r", "\r")
}

/// Build a delta event from raw line text.
pub(super) fn parse_text_delta(text: &str) -> SseEvent {
    SseEvent::Delta {
        text: unescape_text(text),
    }
}
