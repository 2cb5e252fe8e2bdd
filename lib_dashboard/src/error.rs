//! Error taxonomy of the dashboard core.
//!
//! Transport and decode failures are absorbed by the core (they end up as
//! state transitions and notifications); only `CommandError` is handed back to
//! the caller of a command.

use thiserror::Error;

/// A payload that does not match the expected shape for its topic.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON for this topic: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid field `{field}`: {detail}")]
    Invalid { field: &'static str, detail: String },

    #[error("no handler registered for topic {0}")]
    UnknownTopic(String),
}

impl DecodeError {
    pub(crate) fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        DecodeError::Invalid { field, detail: detail.into() }
    }
}

/// A raw STOMP frame that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has no command line")]
    MissingCommand,

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),

    #[error("frame body is not NUL terminated")]
    UnterminatedBody,

    #[error("content-length {0} does not fit the frame")]
    BadContentLength(String),

    #[error("malformed heart-beat header: {0}")]
    BadHeartBeat(String),
}

/// The event session could not be established or was lost.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("broker reported an error: {0}")]
    Broker(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] FrameError),

    #[error("timed out waiting for the broker")]
    Timeout,

    #[error("session closed")]
    Closed,
}

/// A submit/reset/fetch command that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Rejected locally before any request was sent.
    #[error("invalid order: {0}")]
    Invalid(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Network(String),
}
