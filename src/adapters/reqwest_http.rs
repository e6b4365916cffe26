//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production transport, implementing the
//! [`HttpClient`] trait from `crate::traits`.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use crate::error::{classify_reqwest_error, NetworkError};
use crate::traits::{Headers, HttpClient, StreamResponse};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use michi::adapters::ReqwestHttpClient;
/// use michi::traits::HttpClient;
///
/// let client = ReqwestHttpClient::new();
/// let response = client.post_stream(url, "{}", &Headers::new()).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client with the given timeouts.
    ///
    /// `request_timeout` bounds the whole exchange including the streamed
    /// body, so it should be generous.
    pub fn with_timeouts(
        connect_timeout: Duration,
        request_timeout: Option<Duration>,
    ) -> Result<Self, NetworkError> {
        let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| NetworkError::Other {
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, NetworkError> {
        let builder = self.client.post(url).body(body.to_string());
        let builder = Self::apply_headers(builder, headers);

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, url))?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());

        let owned_url = url.to_string();
        let stream = response
            .bytes_stream()
            .map(move |result| result.map_err(|e| classify_reqwest_error(&e, &owned_url)));

        Ok(StreamResponse::new(status, Box::pin(stream)).with_headers(response_headers))
    }
}
