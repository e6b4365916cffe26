//! Structured control payload parsing

use serde_json::Value;

use crate::sse::events::ControlMessage;
use crate::sse::payloads::ControlPayload;

/// Attempt to decode a payload as a JSON object.
///
/// Returns `None` for anything that is not an object, including valid JSON
/// scalars, so that text like `42` stays a text delta.
pub(crate) fn decode_structured(raw: &str) -> Option<ControlPayload> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Map a decoded object to a control message. First match wins:
/// `conversationId`, then `status == "done"`, then `error`.
///
/// `None` means the object matched no known key and is absorbed.
pub(super) fn parse_control_payload(payload: &ControlPayload) -> Option<ControlMessage> {
    if let Some(id) = payload
        .conversation_id
        .as_ref()
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
    {
        return Some(ControlMessage::ConversationAssigned { id: id.to_string() });
    }

    if payload.status.as_ref().and_then(Value::as_str) == Some("done") {
        return Some(ControlMessage::StreamDone);
    }

    payload
        .error
        .as_ref()
        .and_then(error_message)
        .map(|message| ControlMessage::StreamError { message })
}

/// Message for a present `error` field; `null`, `false`, `0` and `""` are absent.
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(raw: &str) -> Option<ControlMessage> {
        decode_structured(raw).and_then(|p| parse_control_payload(&p))
    }

    #[test]
    fn test_conversation_id() {
        assert_eq!(
            control(r#"{"conversationId":"abc123"}"#),
            Some(ControlMessage::ConversationAssigned {
                id: "abc123".to_string()
            })
        );
    }

    #[test]
    fn test_empty_conversation_id_is_not_a_match() {
        assert_eq!(control(r#"{"conversationId":""}"#), None);
    }

    #[test]
    fn test_status_done() {
        assert_eq!(
            control(r#"{"status":"done"}"#),
            Some(ControlMessage::StreamDone)
        );
        assert_eq!(control(r#"{"status":"running"}"#), None);
    }

    #[test]
    fn test_error_string() {
        assert_eq!(
            control(r#"{"error":"model overloaded"}"#),
            Some(ControlMessage::StreamError {
                message: "model overloaded".to_string()
            })
        );
    }

    #[test]
    fn test_error_falsy_values_absent() {
        assert_eq!(control(r#"{"error":null}"#), None);
        assert_eq!(control(r#"{"error":false}"#), None);
        assert_eq!(control(r#"{"error":""}"#), None);
        assert_eq!(control(r#"{"error":0}"#), None);
    }

    #[test]
    fn test_error_non_string_is_stringified() {
        assert_eq!(
            control(r#"{"error":{"code":500}}"#),
            Some(ControlMessage::StreamError {
                message: r#"{"code":500}"#.to_string()
            })
        );
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            control(r#"{"error":"boom","status":"done","conversationId":"c-9"}"#),
            Some(ControlMessage::ConversationAssigned {
                id: "c-9".to_string()
            })
        );
        assert_eq!(
            control(r#"{"error":"boom","status":"done"}"#),
            Some(ControlMessage::StreamDone)
        );
    }

    #[test]
    fn test_unrecognized_object_absorbed() {
        assert!(decode_structured(r#"{"foo":"bar"}"#).is_some());
        assert_eq!(control(r#"{"foo":"bar"}"#), None);
    }

    #[test]
    fn test_non_objects_are_not_structured() {
        assert!(decode_structured("42").is_none());
        assert!(decode_structured(r#""quoted""#).is_none());
        assert!(decode_structured("[1,2]").is_none());
        assert!(decode_structured("{not valid").is_none());
        assert!(decode_structured("Hola").is_none());
    }
}
