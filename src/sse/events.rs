//! SSE frame and event type definitions
//!
//! Contains the classified line type (`Frame`), the event marker kinds,
//! the structured control messages carried in data payloads, and the
//! decoded `SseEvent` handed to the read loop.

/// Kind carried by an `event:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Stream opened; the conversation id follows in a data payload
    Init,
    /// Backend finished generating
    Complete,
    /// Error details follow in a data payload
    Error,
    /// Any other marker the backend may send
    Other(String),
}

impl EventKind {
    /// Map a marker name to its kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "init" => EventKind::Init,
            "complete" => EventKind::Complete,
            "error" => EventKind::Error,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Marker name as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Init => "init",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
            EventKind::Other(name) => name,
        }
    }
}

/// One classified protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `event: <kind>`
    EventMarker { kind: EventKind },
    /// `data: <raw>` with the prefix stripped and the rest trimmed
    DataPayload { raw: String },
    /// Blank line or `:` comment
    Ignorable,
    /// Non-empty line with no recognized prefix
    PlainText { text: String },
}

/// Structured payload carrying session metadata rather than display text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Backend assigned (or confirmed) the conversation id
    ConversationAssigned { id: String },
    /// Backend reported `status: done`
    StreamDone,
    /// Backend reported an error; aborts the read loop
    StreamError { message: String },
}

/// Decoded unit produced by the stream decoder, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Fragment of assistant text
    Delta { text: String },
    /// Out-of-band control signal
    Control(ControlMessage),
}

impl SseEvent {
    /// Returns the event type name as a string for debugging purposes.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            SseEvent::Delta { .. } => "delta",
            SseEvent::Control(ControlMessage::ConversationAssigned { .. }) => {
                "conversation_assigned"
            }
            SseEvent::Control(ControlMessage::StreamDone) => "stream_done",
            SseEvent::Control(ControlMessage::StreamError { .. }) => "stream_error",
        }
    }

    /// Convenience constructor for a text delta.
    pub fn delta(text: impl Into<String>) -> Self {
        SseEvent::Delta { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_name() {
        assert_eq!(EventKind::from_name("init"), EventKind::Init);
        assert_eq!(EventKind::from_name("complete"), EventKind::Complete);
        assert_eq!(EventKind::from_name("error"), EventKind::Error);
        assert_eq!(
            EventKind::from_name("heartbeat"),
            EventKind::Other("heartbeat".to_string())
        );
    }

    #[test]
    fn test_event_kind_as_str_matches_wire_name() {
        for name in ["init", "complete", "error", "heartbeat"] {
            assert_eq!(EventKind::from_name(name).as_str(), name);
        }
    }

    #[test]
    fn test_sse_event_type_name() {
        assert_eq!(SseEvent::delta("hi").event_type_name(), "delta");
        assert_eq!(
            SseEvent::Control(ControlMessage::ConversationAssigned {
                id: "c".to_string()
            })
            .event_type_name(),
            "conversation_assigned"
        );
        assert_eq!(
            SseEvent::Control(ControlMessage::StreamDone).event_type_name(),
            "stream_done"
        );
        assert_eq!(
            SseEvent::Control(ControlMessage::StreamError {
                message: "x".to_string()
            })
            .event_type_name(),
            "stream_error"
        );
    }
}
