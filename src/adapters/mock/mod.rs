//! Mock implementations for testing.
//!
//! - [`MockHttpClient`] - Streaming transport with configurable responses

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
