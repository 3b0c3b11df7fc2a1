//! Packet types shared by every layer of the client.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric identifier correlating a reply to the call that produced it.
///
/// Ids are allocated by the call gateway from a per-connection monotonic
/// counter and are never reused for the lifetime of the connection. `0` is
/// never allocated, so a zeroed id in a log line always means "not a call".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PacketId(u32);

impl PacketId {
    /// Wrap a raw wire id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw wire value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for PacketId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two packet kinds carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// A call or a server-originated push.
    Method,
    /// A response correlated to an earlier method packet.
    Reply,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method => f.write_str("method"),
            Self::Reply => f.write_str("reply"),
        }
    }
}

/// A method invocation: client calls and server pushes share this shape.
///
/// Wire form:
///
/// ```json
/// {"type":"method","id":12,"method":"getTime","params":{},"discard":false}
/// ```
///
/// Server pushes additionally carry a `seq` sequence number. `discard: true`
/// tells the receiver not to reply (fire-and-forget).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodPacket {
    /// Correlation id. Mandatory on the wire even for fire-and-forget.
    pub id: PacketId,
    /// Wire method name, e.g. `getScenes`.
    pub method: String,
    /// Method arguments; `null` when the method takes none.
    #[serde(default)]
    pub params: Value,
    /// When true the receiver must not send a reply for this packet.
    #[serde(default)]
    pub discard: bool,
    /// Server-assigned sequence number, present on pushes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl MethodPacket {
    /// A reply-expecting call.
    #[must_use]
    pub fn call(id: PacketId, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
            discard: false,
            seq: None,
        }
    }

    /// A fire-and-forget method packet (`discard: true`).
    #[must_use]
    pub fn fire(id: PacketId, method: impl Into<String>, params: Value) -> Self {
        Self {
            discard: true,
            ..Self::call(id, method, params)
        }
    }
}

/// The in-band failure body of an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyError {
    /// Numeric protocol error code.
    pub code: u32,
    /// Human-readable description.
    pub message: String,
    /// Dot path into the offending parameter, on validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ReplyError {
    /// Build an error body without a parameter path.
    #[must_use]
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "code {}: {} (at {path})", self.code, self.message),
            None => write!(f, "code {}: {}", self.code, self.message),
        }
    }
}

/// A response to an earlier method packet.
///
/// Wire form:
///
/// ```json
/// {"type":"reply","id":12,"result":{"time":1638000000000},"seq":3}
/// {"type":"reply","id":13,"error":{"code":4010,"message":"Unknown scene."}}
/// ```
///
/// A well-behaved server populates exactly one of `result` and `error`;
/// a reply with neither is treated as success with an empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPacket {
    /// Id of the method packet this responds to.
    pub id: PacketId,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
    /// Server-assigned sequence number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl ReplyPacket {
    /// A successful reply carrying `result`.
    #[must_use]
    pub fn success(id: PacketId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
            seq: None,
        }
    }

    /// A failed reply carrying `error`.
    #[must_use]
    pub fn failure(id: PacketId, error: ReplyError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
            seq: None,
        }
    }

    /// Whether this reply carries an error body.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Split into the success payload or the error body.
    ///
    /// `error` wins if a misbehaving server sent both; a reply with neither
    /// yields `Ok(Value::Null)`.
    pub fn into_result(self) -> Result<Value, ReplyError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A decoded frame: one of the two packet kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Packet {
    /// Call or push.
    Method(MethodPacket),
    /// Correlated response.
    Reply(ReplyPacket),
}

impl Packet {
    /// Which kind of packet this is.
    #[must_use]
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Method(_) => PacketKind::Method,
            Self::Reply(_) => PacketKind::Reply,
        }
    }

    /// The correlation id, whichever kind this is.
    #[must_use]
    pub fn id(&self) -> PacketId {
        match self {
            Self::Method(packet) => packet.id,
            Self::Reply(packet) => packet.id,
        }
    }
}
