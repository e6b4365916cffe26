//! Transport-related error types.
//!
//! This module defines errors that occur before or while the chat response
//! body is being read: connection failures, timeouts, non-2xx statuses and
//! body read errors.

use std::fmt;

/// Fallback message for a non-2xx response whose body names no error.
pub const DEFAULT_CONNECT_ERROR: &str = "Error connecting to the assistant";

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed {
        url: String,
        message: String,
    },

    /// Request timed out.
    Timeout {
        operation: String,
    },

    /// Non-2xx response. `message` is what the backend said, or the default.
    HttpStatus {
        status: u16,
        message: String,
    },

    /// The response carried no readable body.
    MissingBody,

    /// Reading the streamed body failed part way.
    BodyRead {
        message: String,
    },

    /// Generic network error.
    Other {
        message: String,
    },
}

impl NetworkError {
    /// Check if this error is likely transient.
    ///
    /// Informational only: nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::BodyRead { .. } => true,
            NetworkError::MissingBody => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to connect to the assistant. Please check your internet connection."
                    .to_string()
            }
            NetworkError::Timeout { .. } => {
                "The assistant took too long to respond. Please try again.".to_string()
            }
            NetworkError::HttpStatus { message, .. } => message.clone(),
            NetworkError::MissingBody => "No response body".to_string(),
            NetworkError::BodyRead { .. } => {
                "The connection was interrupted while receiving the reply.".to_string()
            }
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::MissingBody => "E_NET_NOBODY",
            NetworkError::BodyRead { .. } => "E_NET_BODY",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::Timeout { operation } => {
                write!(f, "{} timed out", operation)
            }
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            NetworkError::MissingBody => write!(f, "Response has no body"),
            NetworkError::BodyRead { message } => {
                write!(f, "Failed to read response body: {}", message)
            }
            NetworkError::Other { message } => {
                write!(f, "Network error: {}", message)
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        NetworkError::Timeout {
            operation: "Chat request".to_string(),
        }
    } else if err.is_body() || err.is_decode() {
        NetworkError::BodyRead {
            message: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        NetworkError::HttpStatus {
            status: status.as_u16(),
            message: DEFAULT_CONNECT_ERROR.to_string(),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}
