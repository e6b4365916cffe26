//! Chunk-level stream decoder
//!
//! Chains byte decoding, line framing and line parsing. Everything a chunk
//! completes is returned in arrival order; partial characters and partial
//! lines wait for the next chunk.

use tracing::debug;

use crate::sse::decoder::Utf8StreamDecoder;
use crate::sse::events::{ControlMessage, SseEvent};
use crate::sse::framer::LineFramer;
use crate::sse::parser::SseParser;

/// Stateful decoder for one response body.
///
/// Created fresh for every send. After a `StreamError` control message is
/// produced the decoder halts and ignores all further input, since the read
/// loop aborts at that point.
#[derive(Debug, Default)]
pub struct ChatStreamDecoder {
    bytes: Utf8StreamDecoder,
    framer: LineFramer,
    parser: SseParser,
    halted: bool,
}

impl ChatStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one transport chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.halted {
            return Vec::new();
        }
        let text = self.bytes.decode(chunk);
        let lines = self.framer.push(&text);
        self.parse_lines(lines)
    }

    /// Flush at end of stream: pending bytes, then the residual partial line.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.halted {
            return Vec::new();
        }
        let text = self.bytes.finish();
        let mut lines = self.framer.push(&text);
        lines.extend(self.framer.finish());
        self.parse_lines(lines)
    }

    /// Whether a backend error stopped the decoder.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn parse_lines(&mut self, lines: Vec<String>) -> Vec<SseEvent> {
        let mut events = Vec::new();
        for line in lines {
            let Some(event) = self.parser.feed_line(&line) else {
                continue;
            };
            let is_error = matches!(event, SseEvent::Control(ControlMessage::StreamError { .. }));
            events.push(event);
            if is_error {
                debug!(marker = ?self.parser.last_marker(), "decoder halted on backend error");
                self.halted = true;
                break;
            }
        }
        events
    }
}

/// Decode a complete body delivered as the given chunks.
pub fn decode_chunks<I, B>(chunks: I) -> Vec<SseEvent>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut decoder = ChatStreamDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.feed(chunk.as_ref()));
    }
    events.extend(decoder.finish());
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPED_BODY: &str = concat!(
        ": connected\n",
        "data:event: init\n",
        "data:data: {\"conversationId\":\"conv-42\"}\n",
        "\n",
        "data:data: Tómate la temperatura\\ncada 4 horas.\n",
        "data:data: ¿Algo más? 🐱\n",
        "data:event: complete\n",
        "data:data: {\"status\":\"done\"}\n",
        "data:data: [DONE]\n",
    );

    fn deltas(events: &[SseEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                SseEvent::Delta { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_split_scenario() {
        let events = decode_chunks([
            "event: init\ndata:",
            "{\"conversationId\":\"conv-1\"}\ndata: Hola",
            " mundo\n",
        ]);
        assert_eq!(
            events,
            vec![
                SseEvent::Control(ControlMessage::ConversationAssigned {
                    id: "conv-1".to_string()
                }),
                SseEvent::delta("Hola mundo"),
            ]
        );
    }

    #[test]
    fn test_wrapped_body() {
        let events = decode_chunks([WRAPPED_BODY]);
        assert_eq!(
            events,
            vec![
                SseEvent::Control(ControlMessage::ConversationAssigned {
                    id: "conv-42".to_string()
                }),
                SseEvent::delta("Tómate la temperatura\ncada 4 horas."),
                SseEvent::delta("¿Algo más? 🐱"),
                SseEvent::Control(ControlMessage::StreamDone),
            ]
        );
    }

    #[test]
    fn test_chunking_invariance_every_split_point() {
        let bytes = WRAPPED_BODY.as_bytes();
        let whole = decode_chunks([bytes]);

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_chunks([a, b]), whole, "split at byte {}", split);
        }
    }

    #[test]
    fn test_chunking_invariance_byte_at_a_time() {
        let bytes = WRAPPED_BODY.as_bytes();
        let whole = decode_chunks([bytes]);
        let single: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_chunks(single), whole);
    }

    #[test]
    fn test_residual_line_flushed_at_end() {
        let events = decode_chunks(["data: sin salto final"]);
        assert_eq!(events, vec![SseEvent::delta("sin salto final")]);
    }

    #[test]
    fn test_residual_control_line_flushed_at_end() {
        let events = decode_chunks([r#"data:data: {"conversationId":"tail"}"#]);
        assert_eq!(
            events,
            vec![SseEvent::Control(ControlMessage::ConversationAssigned {
                id: "tail".to_string()
            })]
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = decode_chunks(["data: uno\r\ndata: dos\r\n"]);
        assert_eq!(deltas(&events), vec!["uno", "dos"]);
    }

    #[test]
    fn test_sentinel_and_blank_lines_yield_nothing() {
        assert!(decode_chunks(["data:[DONE]\n\n\n   \n"]).is_empty());
    }

    #[test]
    fn test_error_halts_decoder() {
        let mut decoder = ChatStreamDecoder::new();
        let events = decoder.feed(
            b"data: parcial\ndata: {\"error\":\"rate limited\"}\ndata: never seen\n",
        );
        assert_eq!(
            events,
            vec![
                SseEvent::delta("parcial"),
                SseEvent::Control(ControlMessage::StreamError {
                    message: "rate limited".to_string()
                }),
            ]
        );
        assert!(decoder.is_halted());
        assert!(decoder.feed(b"data: more\n").is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_deltas_are_not_merged() {
        let events = decode_chunks(["data: a\ndata: b\n"]);
        assert_eq!(deltas(&events), vec!["a", "b"]);
    }

    #[test]
    fn test_leading_bom_does_not_leak_as_text() {
        let body = "\u{FEFF}event: init\ndata: {\"conversationId\":\"c\"}\ndata: Hola\n";
        let expected = vec![
            SseEvent::Control(ControlMessage::ConversationAssigned {
                id: "c".to_string(),
            }),
            SseEvent::delta("Hola"),
        ];

        assert_eq!(decode_chunks([body.as_bytes()]), expected);

        let bytes = body.as_bytes();
        assert_eq!(decode_chunks(bytes.chunks(1)), expected);
    }

    #[test]
    fn test_invalid_utf8_replaced_not_fatal() {
        let events = decode_chunks([&b"data: ok\xFF\n"[..]]);
        assert_eq!(deltas(&events), vec!["ok\u{FFFD}"]);
    }
}
