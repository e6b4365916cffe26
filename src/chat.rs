//! Streaming chat client.
//!
//! Sends one user message to the chat endpoint and reads the reply as it
//! streams in. Two ways to consume a reply:
//!
//! - [`ChatClient::send_message`] drives the whole exchange, dispatching
//!   text deltas to a callback, binding the conversation id on the session
//!   and firing a completion callback exactly once.
//! - [`ChatClient::stream`] hands back the decoded events as a `Stream` for
//!   callers that prefer to pull.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::ReqwestHttpClient;
use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult, NetworkError, StreamError, DEFAULT_CONNECT_ERROR};
use crate::session::ConversationSession;
use crate::sse::payloads::ErrorBodyPayload;
use crate::sse::{ChatStreamDecoder, ControlMessage, SseEvent};
use crate::traits::{ByteStream, Headers, HttpClient};

/// Upper bound on how much of a non-2xx body is read for its error message.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Stream of decoded events for one reply.
pub type EventStream = Pin<Box<dyn Stream<Item = ChatResult<SseEvent>> + Send>>;

/// JSON body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub patient_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
}

impl<'a> ChatRequest<'a> {
    /// Build the request for `message` on the given session.
    pub fn for_session(session: &'a ConversationSession, message: &'a str) -> Self {
        Self {
            message,
            patient_id: session.patient_id(),
            conversation_id: session.conversation_id(),
        }
    }
}

/// Phase of a single send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
    StreamOpen,
    Draining,
    Failed,
    Done,
}

/// What a finished send produced.
#[derive(Debug, Default)]
pub struct SendOutcome {
    /// Number of text deltas dispatched
    pub deltas: usize,
    /// Whether any non-empty text arrived
    pub received_content: bool,
    /// Conversation id bound on the session after the send
    pub conversation_id: Option<String>,
    /// Why the send failed, if it did
    pub error: Option<ChatError>,
}

impl SendOutcome {
    /// Whether the send reached the end of the stream without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Caller side of a cancellable send.
///
/// Cancelling stops reading the reply. Deltas already dispatched stay
/// dispatched and the completion callback still fires.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    handle: AbortHandle,
}

/// Send side of a [`CancelHandle`], consumed by
/// [`ChatClient::send_message_with_cancel`].
#[derive(Debug)]
pub struct CancelRegistration {
    registration: AbortRegistration,
}

impl CancelHandle {
    /// Create a linked handle and registration.
    pub fn new_pair() -> (CancelHandle, CancelRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        (CancelHandle { handle }, CancelRegistration { registration })
    }

    /// Abort the send. No-op once the send has finished.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// Client for the streaming chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient<H: HttpClient> {
    http: H,
    config: ChatConfig,
}

impl ChatClient<ReqwestHttpClient> {
    /// Build a client with the reqwest transport.
    pub fn from_config(config: ChatConfig) -> ChatResult<Self> {
        config.validate()?;
        let http = ReqwestHttpClient::with_timeouts(config.connect_timeout, config.request_timeout)?;
        Ok(Self::new(http, config))
    }
}

impl<H: HttpClient> ChatClient<H> {
    /// Create a client over the given transport.
    pub fn new(http: H, config: ChatConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Headers sent with every chat request.
    pub fn build_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        if !self.config.api_key.is_empty() {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", self.config.api_key),
            );
        }
        headers
    }

    /// POST the request and return the open reply body.
    ///
    /// A non-2xx answer becomes [`NetworkError::HttpStatus`] carrying the
    /// body's `error` string, or a generic message when there is none.
    async fn open(&self, request: &ChatRequest<'_>) -> ChatResult<ByteStream> {
        let body = serde_json::to_string(request)?;
        let headers = self.build_headers();

        debug!(
            url = %self.config.chat_url,
            patient_id = request.patient_id,
            conversation_id = ?request.conversation_id,
            "sending chat message"
        );

        let response = self
            .http
            .post_stream(&self.config.chat_url, &body, &headers)
            .await?;

        let status = response.status;
        debug!(
            status,
            content_type = response.header("content-type").unwrap_or("-"),
            "chat response"
        );
        if !response.is_success() {
            let message = match response.body {
                Some(body) => read_error_message(body).await,
                None => None,
            }
            .unwrap_or_else(|| DEFAULT_CONNECT_ERROR.to_string());
            return Err(NetworkError::HttpStatus { status, message }.into());
        }

        response.body.ok_or_else(|| NetworkError::MissingBody.into())
    }

    /// Send `message` and return the decoded reply as a stream.
    ///
    /// The session is only read. Callers bind `ConversationAssigned` ids
    /// themselves. A backend `error` payload is yielded as
    /// [`StreamError::BackendError`] and ends the stream.
    pub async fn stream(
        &self,
        session: &ConversationSession,
        message: &str,
    ) -> ChatResult<EventStream> {
        let request = ChatRequest::for_session(session, message);
        let body = self.open(&request).await?;

        let events = stream::unfold(
            (Some(body), ChatStreamDecoder::new(), VecDeque::new()),
            |(mut body, mut decoder, mut ready)| async move {
                loop {
                    if let Some(event) = ready.pop_front() {
                        let item: ChatResult<SseEvent> = match event {
                            SseEvent::Control(ControlMessage::StreamError { message }) => {
                                body = None;
                                ready.clear();
                                Err(ChatError::from(StreamError::BackendError { message }))
                            }
                            event => Ok(event),
                        };
                        return Some((item, (body, decoder, ready)));
                    }

                    let chunks = body.as_mut()?;
                    let next = chunks.next().await;
                    match next {
                        Some(Ok(chunk)) => ready.extend(decoder.feed(&chunk)),
                        Some(Err(e)) => {
                            return Some((Err(ChatError::from(e)), (None, decoder, ready)));
                        }
                        None => {
                            body = None;
                            ready.extend(decoder.finish());
                        }
                    }
                }
            },
        );

        Ok(Box::pin(events))
    }

    /// Send `message` on the session, dispatching text as it arrives.
    ///
    /// `on_delta` gets every text fragment in order. A conversation id in the
    /// reply is bound on the session. `on_done` fires exactly once, after the
    /// stream ends or fails. Failures are reported in the returned outcome.
    pub async fn send_message<D, F>(
        &self,
        session: &mut ConversationSession,
        message: &str,
        on_delta: D,
        on_done: F,
    ) -> SendOutcome
    where
        D: FnMut(&str),
        F: FnOnce(),
    {
        let (_handle, registration) = CancelHandle::new_pair();
        self.send_message_with_cancel(session, message, registration, on_delta, on_done)
            .await
    }

    /// [`send_message`](Self::send_message) that stops early when the
    /// linked [`CancelHandle`] is cancelled.
    pub async fn send_message_with_cancel<D, F>(
        &self,
        session: &mut ConversationSession,
        message: &str,
        cancel: CancelRegistration,
        mut on_delta: D,
        on_done: F,
    ) -> SendOutcome
    where
        D: FnMut(&str),
        F: FnOnce(),
    {
        let _busy = session.activity().begin();
        let mut outcome = SendOutcome::default();

        let run = self.read_reply(session, message, &mut on_delta, &mut outcome);
        let result = Abortable::new(run, cancel.registration).await;
        let state = match result {
            Ok(state) => state,
            Err(_) => {
                info!("chat send cancelled");
                outcome.error = Some(StreamError::Cancelled.into());
                SendState::Failed
            }
        };

        outcome.conversation_id = session.conversation_id().map(str::to_string);
        match &outcome.error {
            Some(err) => warn!(
                code = err.error_code(),
                error = %err,
                deltas = outcome.deltas,
                "chat send failed"
            ),
            None => info!(
                deltas = outcome.deltas,
                received_content = outcome.received_content,
                "chat stream ended"
            ),
        }
        debug!(?state, "send finished");

        on_done();
        outcome
    }

    async fn read_reply<D>(
        &self,
        session: &mut ConversationSession,
        message: &str,
        on_delta: &mut D,
        outcome: &mut SendOutcome,
    ) -> SendState
    where
        D: FnMut(&str),
    {
        let mut state = SendState::Idle;
        advance(&mut state, SendState::Sending);

        let request = ChatRequest::for_session(session, message);
        let mut body = match self.open(&request).await {
            Ok(body) => body,
            Err(e) => {
                outcome.error = Some(e);
                advance(&mut state, SendState::Failed);
                return state;
            }
        };
        advance(&mut state, SendState::StreamOpen);

        let mut decoder = ChatStreamDecoder::new();
        loop {
            match body.next().await {
                Some(Ok(chunk)) => {
                    for event in decoder.feed(&chunk) {
                        if let Err(e) = dispatch(event, session, on_delta, outcome) {
                            outcome.error = Some(e.into());
                            advance(&mut state, SendState::Failed);
                            return state;
                        }
                    }
                }
                Some(Err(e)) => {
                    outcome.error = Some(e.into());
                    advance(&mut state, SendState::Failed);
                    return state;
                }
                None => break,
            }
        }

        advance(&mut state, SendState::Draining);
        for event in decoder.finish() {
            if let Err(e) = dispatch(event, session, on_delta, outcome) {
                outcome.error = Some(e.into());
                advance(&mut state, SendState::Failed);
                return state;
            }
        }

        advance(&mut state, SendState::Done);
        state
    }
}

fn advance(state: &mut SendState, next: SendState) {
    debug!(from = ?state, to = ?next, "send state");
    *state = next;
}

fn dispatch<D>(
    event: SseEvent,
    session: &mut ConversationSession,
    on_delta: &mut D,
    outcome: &mut SendOutcome,
) -> Result<(), StreamError>
where
    D: FnMut(&str),
{
    match event {
        SseEvent::Delta { text } => {
            debug!(preview = %preview(&text), "delta");
            outcome.deltas += 1;
            if !text.is_empty() {
                outcome.received_content = true;
            }
            on_delta(&text);
            Ok(())
        }
        SseEvent::Control(ControlMessage::ConversationAssigned { id }) => {
            session.bind(&id);
            Ok(())
        }
        SseEvent::Control(ControlMessage::StreamDone) => {
            debug!("backend reported done");
            Ok(())
        }
        SseEvent::Control(ControlMessage::StreamError { message }) => {
            warn!(%message, "backend reported an error");
            Err(StreamError::BackendError { message })
        }
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 40;
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Read a non-2xx body and pull out its `error` string.
async fn read_error_message(mut body: ByteStream) -> Option<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.ok()?;
        buf.extend_from_slice(&chunk);
        if buf.len() > MAX_ERROR_BODY {
            return None;
        }
    }
    serde_json::from_slice::<ErrorBodyPayload>(&buf)
        .ok()
        .and_then(|payload| payload.error)
        .filter(|message| !message.is_empty())
}
