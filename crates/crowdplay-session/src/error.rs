//! Session failure taxonomy.

use std::fmt;
use std::time::Duration;

use crowdplay_wire::PacketId;

/// Stable error-code strings for logging and classification.
pub mod codes {
    /// The server answered with an in-band error reply.
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
    /// No reply arrived within the per-call budget.
    pub const CALL_TIMEOUT: &str = "CALL_TIMEOUT";
    /// The connection stopped serving calls.
    pub const CONNECTION_CLOSED: &str = "CONNECTION_CLOSED";
    /// An id was registered twice.
    pub const DUPLICATE_ID: &str = "DUPLICATE_ID";
    /// A reply arrived but its result did not fit the requested type.
    pub const RESULT_DECODE: &str = "RESULT_DECODE";
}

/// Why the connection stopped serving calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// `shutdown()` was called on this side.
    LocalShutdown,
    /// The peer ended the stream cleanly.
    PeerClosed,
    /// The transport failed mid-session.
    Transport {
        /// Underlying transport failure text.
        detail: String,
    },
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalShutdown => f.write_str("local shutdown"),
            Self::PeerClosed => f.write_str("peer closed the connection"),
            Self::Transport { detail } => write!(f, "transport failure: {detail}"),
        }
    }
}

/// Errors surfaced to callers of the session gateway.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server processed the call and answered with an error reply.
    #[error("`{method}` failed remotely: code {code}: {message}")]
    Remote {
        /// Wire method that failed.
        method: String,
        /// Numeric protocol error code from the reply.
        code: u32,
        /// Human-readable description from the reply.
        message: String,
        /// Dot path into the offending parameter, when the server sent one.
        path: Option<String>,
    },

    /// No reply arrived within the per-call budget. The call's pending
    /// record is gone; a reply arriving later is dropped.
    #[error("`{method}` timed out after {timeout:?}")]
    Timeout {
        /// Wire method that timed out.
        method: String,
        /// The budget that elapsed.
        timeout: Duration,
    },

    /// The connection closed before the reply arrived, or the call was made
    /// after the session had already closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Why the session ended.
        reason: CloseReason,
    },

    /// The id was already pending. The allocator never hands one out twice,
    /// so this points at a registration bug, not at the server.
    #[error("packet id {id} is already pending")]
    DuplicateId {
        /// The doubly registered id.
        id: PacketId,
    },

    /// The reply arrived but its result did not match the requested type.
    #[error("failed to decode `{method}` result")]
    ResultDecode {
        /// Wire method whose result failed to decode.
        method: String,
        /// The shape mismatch.
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Stable code string for this error, from [`codes`].
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Remote { .. } => codes::REMOTE_ERROR,
            Self::Timeout { .. } => codes::CALL_TIMEOUT,
            Self::ConnectionClosed { .. } => codes::CONNECTION_CLOSED,
            Self::DuplicateId { .. } => codes::DUPLICATE_ID,
            Self::ResultDecode { .. } => codes::RESULT_DECODE,
        }
    }
}
