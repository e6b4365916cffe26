//! SSE (Server-Sent Events) stream decoding
//!
//! Decodes the chat backend's streaming response. The wire format is
//! line-oriented:
//! - `event: <kind>` - informational marker (`init`, `complete`, `error`)
//! - `data: <payload>` - JSON control object, `[DONE]`, or literal text
//! - Lines starting with `:` - comments (ignored)
//! - Blank lines - ignored
//!
//! A proxy in front of the backend may wrap every line in one extra
//! `data:` envelope (`data:event: init`, `data:data: Hola`). Both framings
//! decode identically.
//!
//! # Module structure
//! - `decoder` - Incremental UTF-8 decoding across chunk boundaries
//! - `framer` - Newline framing with a retained partial line
//! - `events` - Frame and event type definitions
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Unwrap, classify and interpret a single line
//! - `stream` - Chunk-level decoder chaining all of the above

mod decoder;
mod events;
mod framer;
mod parser;
pub(crate) mod payloads;
mod stream;

// Re-export public types
pub use decoder::Utf8StreamDecoder;
pub use events::{ControlMessage, EventKind, Frame, SseEvent};
pub use framer::LineFramer;
pub use parser::{
    interpret_frame, interpret_payload, parse_sse_line, unescape_text, unwrap_line, SseParser,
    DONE_SENTINEL,
};
pub use stream::{decode_chunks, ChatStreamDecoder};
