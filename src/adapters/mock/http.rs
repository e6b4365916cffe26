//! Mock HTTP client for testing.
//!
//! Provides a configurable mock transport that replays predefined chunk
//! sequences, statuses or errors, and records every request it receives.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::NetworkError;
use crate::traits::{ByteStream, Headers, HttpClient, StreamResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Parse the recorded body as JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Answer with a status and a body delivered as these chunks
    Stream { status: u16, chunks: Vec<Bytes> },
    /// Answer 200, deliver these chunks, then fail the body read
    StreamThenError { chunks: Vec<Bytes>, error: NetworkError },
    /// Answer with a status and no body at all
    NoBody { status: u16 },
    /// Fail before any response
    Error(NetworkError),
}

impl MockResponse {
    /// 200 response streaming the given chunks.
    pub fn chunks<I, T>(chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        MockResponse::Stream {
            status: 200,
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    /// Non-2xx response with a single-chunk body.
    pub fn status(status: u16, body: impl Into<Bytes>) -> Self {
        MockResponse::Stream {
            status,
            chunks: vec![body.into()],
        }
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use michi::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.example.com/chat",
///     MockResponse::chunks(["data: Hola\n"]),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a response for a specific URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }
        let default = self.default_response.lock().unwrap();
        default.clone()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn body_of(items: Vec<Result<Bytes, NetworkError>>) -> ByteStream {
    Box::pin(futures::stream::iter(items))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, NetworkError> {
        self.record_request("POST", url, headers, Some(body.to_string()));

        match self.get_response(url) {
            Some(MockResponse::Stream { status, chunks }) => Ok(StreamResponse::new(
                status,
                body_of(chunks.into_iter().map(Ok).collect()),
            )),
            Some(MockResponse::StreamThenError { chunks, error }) => {
                let mut items: Vec<Result<Bytes, NetworkError>> =
                    chunks.into_iter().map(Ok).collect();
                items.push(Err(error));
                Ok(StreamResponse::new(200, body_of(items)))
            }
            Some(MockResponse::NoBody { status }) => Ok(StreamResponse::without_body(status)),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(NetworkError::Other {
                message: format!("No mock response for URL: {}", url),
            }),
        }
    }
}
