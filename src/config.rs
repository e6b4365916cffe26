//! Chat client configuration.
//!
//! Values come from the builder or from the environment:
//!
//! - `MICHI_CHAT_URL` - full streaming endpoint URL
//! - `MICHI_BACKEND_URL` - backend base URL, used when `MICHI_CHAT_URL` is unset
//! - `MICHI_API_KEY` - bearer key sent with every request
//! - `MICHI_REQUEST_TIMEOUT_SECS` - overall request timeout, unset means none

use std::time::Duration;

use crate::error::{ChatError, ChatResult};

/// Environment variable holding the full endpoint URL.
pub const CHAT_URL_ENV: &str = "MICHI_CHAT_URL";
/// Environment variable holding the backend base URL.
pub const BACKEND_URL_ENV: &str = "MICHI_BACKEND_URL";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "MICHI_API_KEY";
/// Environment variable holding the request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "MICHI_REQUEST_TIMEOUT_SECS";

/// Path of the chat stream function under the backend base URL.
pub const CHAT_STREAM_PATH: &str = "/functions/v1/chat-stream";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`ChatClient`](crate::chat::ChatClient).
///
/// # Example
///
/// ```ignore
/// use michi::config::ChatConfig;
///
/// let config = ChatConfig::default()
///     .with_chat_url("https://backend.example.com/functions/v1/chat-stream")
///     .with_api_key("anon-key");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Streaming chat endpoint
    pub chat_url: String,
    /// Bearer key; empty means no Authorization header
    pub api_key: String,
    /// Connect timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Overall request timeout including the streamed body (default: none)
    pub request_timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chat_url: String::new(),
            api_key: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
        }
    }
}

impl ChatConfig {
    /// Create a config for the given endpoint.
    pub fn new(chat_url: impl Into<String>) -> Self {
        Self::default().with_chat_url(chat_url)
    }

    /// Set the endpoint URL.
    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = url.into();
        self
    }

    /// Derive the endpoint from a backend base URL.
    pub fn with_backend_url(self, base: &str) -> Self {
        let url = format!("{}{}", base.trim_end_matches('/'), CHAT_STREAM_PATH);
        self.with_chat_url(url)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the overall request timeout.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a config from the `MICHI_*` environment variables.
    pub fn from_env() -> ChatResult<Self> {
        let mut config = match non_empty_var(CHAT_URL_ENV) {
            Some(url) => Self::new(url),
            None => match non_empty_var(BACKEND_URL_ENV) {
                Some(base) => Self::default().with_backend_url(&base),
                None => {
                    return Err(ChatError::Config(format!(
                        "set {} or {}",
                        CHAT_URL_ENV, BACKEND_URL_ENV
                    )))
                }
            },
        };

        if let Some(key) = non_empty_var(API_KEY_ENV) {
            config = config.with_api_key(key);
        }

        if let Some(raw) = non_empty_var(REQUEST_TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ChatError::Config(format!("{} must be a whole number of seconds", REQUEST_TIMEOUT_ENV))
            })?;
            config = config.with_request_timeout(Some(Duration::from_secs(secs)));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the endpoint is usable.
    pub fn validate(&self) -> ChatResult<()> {
        if self.chat_url.trim().is_empty() {
            return Err(ChatError::Config("chat URL is empty".to_string()));
        }
        if !self.chat_url.starts_with("http://") && !self.chat_url.starts_with("https://") {
            return Err(ChatError::Config(format!(
                "chat URL must be http(s): {}",
                self.chat_url
            )));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
