//! HTTP client trait abstraction.
//!
//! The chat client only needs one operation: POST a JSON body and read the
//! response body incrementally. Putting it behind a trait lets the read loop
//! run against a mock transport in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

use crate::error::NetworkError;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Response body delivered as chunks in send order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, NetworkError>> + Send>>;

/// Status line and body of a streaming response.
pub struct StreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body, absent if the transport produced none
    pub body: Option<ByteStream>,
}

impl StreamResponse {
    /// Create a response with a body.
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Some(body),
        }
    }

    /// Create a response without a body.
    pub fn without_body(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Attach response headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a response header, ignoring the case of its name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Trait for the streaming HTTP transport.
///
/// Implementations return `Ok` for any status the server answered with,
/// including non-2xx; only failures to get a response at all are `Err`.
///
/// # Example
///
/// ```ignore
/// use michi::traits::{Headers, HttpClient};
///
/// async fn status<C: HttpClient>(client: &C) -> Result<u16, NetworkError> {
///     let response = client.post_stream("https://api.example.com/chat", "{}", &Headers::new()).await?;
///     Ok(response.status)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a POST request and return the body as a stream.
    ///
    /// # Arguments
    /// * `url` - The URL to request
    /// * `body` - Request body as a string
    /// * `headers` - Request headers
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, NetworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_body() -> ByteStream {
        Box::pin(futures::stream::empty())
    }

    #[test]
    fn test_stream_response_new() {
        let response = StreamResponse::new(200, empty_body());
        assert_eq!(response.status, 200);
        assert!(response.headers.is_empty());
        assert!(response.body.is_some());
    }

    #[test]
    fn test_stream_response_without_body() {
        let response = StreamResponse::without_body(200);
        assert!(response.body.is_none());
    }

    #[test]
    fn test_stream_response_with_headers() {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "text/event-stream".to_string());
        let response = StreamResponse::new(200, empty_body()).with_headers(headers);
        assert_eq!(
            response.headers.get("content-type"),
            Some(&"text/event-stream".to_string())
        );
    }

    #[test]
    fn test_stream_response_header_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "text/event-stream".to_string());
        let response = StreamResponse::without_body(200).with_headers(headers);

        assert_eq!(response.header("Content-Type"), Some("text/event-stream"));
        assert_eq!(response.header("content-type"), Some("text/event-stream"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_stream_response_is_success() {
        assert!(StreamResponse::without_body(200).is_success());
        assert!(StreamResponse::without_body(204).is_success());
        assert!(StreamResponse::without_body(299).is_success());
        assert!(!StreamResponse::without_body(300).is_success());
        assert!(!StreamResponse::without_body(401).is_success());
        assert!(!StreamResponse::without_body(500).is_success());
    }

    #[test]
    fn test_stream_response_debug_hides_body() {
        let debug = format!("{:?}", StreamResponse::new(200, empty_body()));
        assert!(debug.contains("has_body: true"));
    }
}
