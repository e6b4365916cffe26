//! Conversation session state.
//!
//! A [`ConversationSession`] outlives individual sends: the conversation id
//! assigned by the backend on the first reply is sent back with every later
//! message until the caller starts a new conversation with
//! [`ConversationSession::reset`].

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

/// Patient id used when the caller supplies none or a non-numeric one.
pub const DEFAULT_PATIENT_ID: i64 = 1;

/// Patient identifier as the caller holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientRef {
    Id(i64),
    Text(String),
}

impl From<i64> for PatientRef {
    fn from(id: i64) -> Self {
        PatientRef::Id(id)
    }
}

impl From<&str> for PatientRef {
    fn from(text: &str) -> Self {
        PatientRef::Text(text.to_string())
    }
}

impl From<String> for PatientRef {
    fn from(text: String) -> Self {
        PatientRef::Text(text)
    }
}

/// Coerce a patient reference to the integer the backend expects.
///
/// A numeric id is used as-is, except `0` which counts as absent. A string
/// is read by its leading integer (after leading whitespace, with an
/// optional sign), so `"42"` and `"42-b"` both give `42`. Anything else
/// gives [`DEFAULT_PATIENT_ID`].
pub fn normalize_patient_id(patient: Option<&PatientRef>) -> i64 {
    match patient {
        Some(PatientRef::Id(0)) | None => DEFAULT_PATIENT_ID,
        Some(PatientRef::Id(id)) => *id,
        Some(PatientRef::Text(text)) => parse_leading_int(text).unwrap_or(DEFAULT_PATIENT_ID),
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Binding state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    /// No conversation id yet; the next send starts a conversation
    Unbound,
    /// The backend assigned this conversation id
    Bound(&'a str),
}

/// Shared count of sends in flight.
///
/// Cheap to clone; clones observe the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionActivity {
    in_flight: Arc<AtomicUsize>,
}

impl SessionActivity {
    /// Whether a send on this session has not yet completed.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Mark a send as started. Overlapping sends are allowed but logged.
    pub(crate) fn begin(&self) -> ActivityGuard {
        let previous = self.in_flight.fetch_add(1, Ordering::AcqRel);
        if previous > 0 {
            warn!(in_flight = previous, "send started while another send on this session is in flight");
        }
        ActivityGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Ends one in-flight send when dropped, on every path.
#[derive(Debug)]
pub(crate) struct ActivityGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Observer fired when the conversation id changes.
pub type ConversationObserver = Box<dyn Fn(&str) + Send + Sync>;

/// Per-chat state shared across sends.
pub struct ConversationSession {
    conversation_id: Option<String>,
    patient: Option<PatientRef>,
    on_conversation_change: Option<ConversationObserver>,
    activity: SessionActivity,
}

impl ConversationSession {
    /// Create an unbound session for the given patient.
    pub fn new(patient: Option<PatientRef>) -> Self {
        Self {
            conversation_id: None,
            patient,
            on_conversation_change: None,
            activity: SessionActivity::default(),
        }
    }

    /// Resume an existing conversation.
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Register the observer fired on each conversation id change.
    pub fn on_conversation_change<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_conversation_change = Some(Box::new(observer));
        self
    }

    /// Current conversation id, if bound.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Current binding state.
    pub fn state(&self) -> SessionState<'_> {
        match &self.conversation_id {
            Some(id) => SessionState::Bound(id),
            None => SessionState::Unbound,
        }
    }

    /// Patient id as sent on the wire.
    pub fn patient_id(&self) -> i64 {
        normalize_patient_id(self.patient.as_ref())
    }

    /// Switch the active patient. The conversation id is kept.
    pub fn set_patient(&mut self, patient: Option<PatientRef>) {
        self.patient = patient;
    }

    /// Busy flag for this session.
    pub fn activity(&self) -> SessionActivity {
        self.activity.clone()
    }

    /// Whether a send on this session is in flight.
    pub fn is_busy(&self) -> bool {
        self.activity.is_busy()
    }

    /// Bind the conversation id assigned by the backend.
    ///
    /// Returns `true` and notifies the observer when the id changed.
    /// Binding the id already held is a no-op.
    pub fn bind(&mut self, id: &str) -> bool {
        if self.conversation_id.as_deref() == Some(id) {
            return false;
        }
        info!(conversation_id = %id, "conversation bound");
        self.conversation_id = Some(id.to_string());
        if let Some(observer) = &self.on_conversation_change {
            observer(id);
        }
        true
    }

    /// Forget the conversation id so the next send starts a new one.
    pub fn reset(&mut self) {
        self.conversation_id = None;
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationSession")
            .field("conversation_id", &self.conversation_id)
            .field("patient", &self.patient)
            .field("has_observer", &self.on_conversation_change.is_some())
            .field("busy", &self.activity.is_busy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_patient_id_numeric() {
        assert_eq!(normalize_patient_id(Some(&PatientRef::Id(42))), 42);
    }

    #[test]
    fn test_patient_id_numeric_string() {
        assert_eq!(normalize_patient_id(Some(&"42".into())), 42);
        assert_eq!(normalize_patient_id(Some(&"  7".into())), 7);
        assert_eq!(normalize_patient_id(Some(&"12abc".into())), 12);
        assert_eq!(normalize_patient_id(Some(&"-3".into())), -3);
    }

    #[test]
    fn test_patient_id_defaults() {
        assert_eq!(normalize_patient_id(None), DEFAULT_PATIENT_ID);
        assert_eq!(normalize_patient_id(Some(&"abc".into())), 1);
        assert_eq!(normalize_patient_id(Some(&"".into())), 1);
        assert_eq!(normalize_patient_id(Some(&"-".into())), 1);
        assert_eq!(normalize_patient_id(Some(&PatientRef::Id(0))), 1);
    }

    #[test]
    fn test_patient_id_overflow_defaults() {
        assert_eq!(
            normalize_patient_id(Some(&"99999999999999999999999".into())),
            1
        );
    }

    #[test]
    fn test_session_starts_unbound() {
        let session = ConversationSession::new(Some(PatientRef::Id(5)));
        assert_eq!(session.state(), SessionState::Unbound);
        assert_eq!(session.conversation_id(), None);
        assert_eq!(session.patient_id(), 5);
    }

    #[test]
    fn test_bind_notifies_once_per_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut session = ConversationSession::default()
            .on_conversation_change(move |id| sink.lock().unwrap().push(id.to_string()));

        assert!(session.bind("conv-1"));
        assert!(!session.bind("conv-1"));
        assert_eq!(session.state(), SessionState::Bound("conv-1"));
        assert!(session.bind("conv-2"));

        assert_eq!(*seen.lock().unwrap(), vec!["conv-1", "conv-2"]);
    }

    #[test]
    fn test_reset_unbinds_and_keeps_patient() {
        let mut session = ConversationSession::new(Some("9".into())).with_conversation_id("old");
        session.reset();
        assert_eq!(session.state(), SessionState::Unbound);
        assert_eq!(session.patient_id(), 9);
    }

    #[test]
    fn test_set_patient() {
        let mut session = ConversationSession::default();
        assert_eq!(session.patient_id(), DEFAULT_PATIENT_ID);
        session.set_patient(Some(PatientRef::Id(77)));
        assert_eq!(session.patient_id(), 77);
    }

    #[test]
    fn test_activity_guard_clears_busy() {
        let session = ConversationSession::default();
        let activity = session.activity();
        assert!(!activity.is_busy());
        {
            let _guard = activity.begin();
            assert!(session.is_busy());
        }
        assert!(!session.is_busy());
    }

    #[test]
    fn test_overlapping_guards_keep_session_busy() {
        let activity = SessionActivity::default();
        let first = activity.begin();
        let second = activity.begin();
        assert!(activity.is_busy());
        drop(second);
        assert!(activity.is_busy());
        drop(first);
        assert!(!activity.is_busy());
    }

    #[test]
    fn test_debug_omits_observer() {
        let session = ConversationSession::default().on_conversation_change(|_| {});
        let debug = format!("{:?}", session);
        assert!(debug.contains("has_observer: true"));
    }
}
