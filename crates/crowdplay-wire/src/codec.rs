//! Frame encoding and decoding.
//!
//! Decoding is two-phase: the envelope's `type` field picks the packet kind,
//! then the body is parsed against that kind's schema. Unknown fields are
//! ignored for forward compatibility; unknown kinds are reported as
//! [`WireError::UnknownPacketKind`] so they stay distinguishable from
//! corrupt input.

use serde_json::Value;

use crate::error::WireError;
use crate::packet::{MethodPacket, Packet, PacketKind, ReplyPacket};

/// Serialize a packet into a JSON text frame.
#[must_use]
pub fn encode(packet: &Packet) -> String {
    // These concrete packet types always serialize; the fallback is
    // unreachable.
    serde_json::to_string(packet).unwrap_or_default()
}

/// Parse one received text frame into a packet.
pub fn decode(frame: &str) -> Result<Packet, WireError> {
    let value: Value = serde_json::from_str(frame).map_err(|err| WireError::MalformedFrame {
        detail: err.to_string(),
    })?;
    if !value.is_object() {
        return Err(WireError::MalformedFrame {
            detail: "frame is not a JSON object".to_owned(),
        });
    }
    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) => {
            return Err(WireError::MalformedFrame {
                detail: "`type` field is not a string".to_owned(),
            });
        }
        None => {
            return Err(WireError::MalformedFrame {
                detail: "missing `type` field".to_owned(),
            });
        }
    };
    match kind.as_str() {
        "method" => serde_json::from_value::<MethodPacket>(value)
            .map(Packet::Method)
            .map_err(|err| malformed_body(PacketKind::Method, &err)),
        "reply" => serde_json::from_value::<ReplyPacket>(value)
            .map(Packet::Reply)
            .map_err(|err| malformed_body(PacketKind::Reply, &err)),
        _ => Err(WireError::UnknownPacketKind { kind }),
    }
}

fn malformed_body(kind: PacketKind, err: &serde_json::Error) -> WireError {
    WireError::MalformedFrame {
        detail: format!("invalid {kind} packet: {err}"),
    }
}
