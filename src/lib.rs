//! Michi - streaming chat transport for the health assistant
//!
//! Sends a user message to the chat backend and decodes the server-sent
//! event reply incrementally, dispatching text to the caller as it arrives
//! and tracking the conversation id across sends.
//!
//! - [`sse`] - byte decoding, line framing and event parsing
//! - [`session`] - conversation state shared across sends
//! - [`chat`] - the client and its read loop

pub mod adapters;
pub mod chat;
pub mod config;
pub mod error;
pub mod session;
pub mod sse;
pub mod traits;

pub use chat::{CancelHandle, CancelRegistration, ChatClient, ChatRequest, SendOutcome, SendState};
pub use config::ChatConfig;
pub use error::{ChatError, ChatResult};
pub use session::{ConversationSession, PatientRef};
pub use sse::{ControlMessage, SseEvent};
