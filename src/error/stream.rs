//! Streaming-related error types.
//!
//! Errors raised while the response body is open and being decoded.

use std::fmt;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Backend reported an error through an `error` control payload.
    BackendError { message: String },

    /// The caller aborted the send before the stream ended.
    Cancelled,
}

impl StreamError {
    /// Check if this error is likely transient.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::BackendError { message } => message.clone(),
            StreamError::Cancelled => "The message was cancelled.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::BackendError { .. } => "E_STREAM_BACKEND",
            StreamError::Cancelled => "E_STREAM_CANCEL",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::BackendError { message } => write!(f, "Backend error: {}", message),
            StreamError::Cancelled => write!(f, "Stream cancelled"),
        }
    }
}

impl std::error::Error for StreamError {}
