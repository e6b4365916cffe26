//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - Streaming HTTP POST used by the chat client

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, StreamResponse};
