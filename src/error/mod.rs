//! Error handling for the chat client.
//!
//! - **Network errors**: the request could not be sent or the body could
//!   not be read (connection, timeout, non-2xx status, missing body)
//! - **Stream errors**: the body was open but the exchange failed (backend
//!   `error` payload, caller cancellation)
//! - **`ChatError`**: the unified type returned by the client
//!
//! Every variant has a `user_message()` suitable for a user-visible
//! notification and an `error_code()` for logs. Nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! match client.send_message(&mut session, "Hola", |d| print!("{d}"), || {}).await.error {
//!     Some(err) => eprintln!("{}", err.user_message()),
//!     None => println!(),
//! }
//! ```

mod network;
mod stream;

pub use network::{classify_reqwest_error, NetworkError, DEFAULT_CONNECT_ERROR};
pub use stream::StreamError;

use thiserror::Error;

/// Unified error type for chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

impl ChatError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Network(e) => e.user_message(),
            ChatError::Stream(e) => e.user_message(),
            ChatError::Config(msg) => format!("The chat is not configured: {}", msg),
            ChatError::Encode(_) => "Error sending message".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Network(e) => e.error_code(),
            ChatError::Stream(e) => e.error_code(),
            ChatError::Config(_) => "E_CONFIG",
            ChatError::Encode(_) => "E_ENCODE",
        }
    }

    /// Check if the error is likely transient. Informational only.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Network(e) => e.is_retryable(),
            ChatError::Stream(e) => e.is_retryable(),
            ChatError::Config(_) | ChatError::Encode(_) => false,
        }
    }

    /// Whether this error came from the backend's `error` payload.
    pub fn is_backend_error(&self) -> bool {
        matches!(self, ChatError::Stream(StreamError::BackendError { .. }))
    }
}
