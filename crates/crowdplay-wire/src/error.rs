//! Codec failure taxonomy.

/// Why a received frame could not be decoded.
///
/// Decode failures are recoverable: the dispatcher reports them and keeps
/// reading. `Clone` because the same error is fanned out to every listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The frame is not a packet: bad JSON, a non-object, a missing or
    /// non-string `type` field, or a body that fails the kind's schema.
    #[error("malformed frame: {detail}")]
    MalformedFrame {
        /// What specifically failed to parse.
        detail: String,
    },

    /// A structurally valid envelope whose `type` names no packet kind this
    /// client knows. Kept distinct from [`WireError::MalformedFrame`] so
    /// callers can tell protocol growth apart from corruption.
    #[error("unknown packet kind `{kind}`")]
    UnknownPacketKind {
        /// The unrecognized `type` value.
        kind: String,
    },
}
