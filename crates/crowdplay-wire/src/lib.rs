//! Wire model for the crowdplay interactive protocol.
//!
//! A frame is one JSON text message on the duplex connection and carries
//! exactly one packet, discriminated by its `type` field: `method` for calls
//! and server pushes, `reply` for responses correlated back to a call by the
//! numeric `id`. This crate owns the packet shapes and the frame codec;
//! correlation and dispatch live in `crowdplay-session`.

mod codec;
mod error;
mod packet;

pub use codec::{decode, encode};
pub use error::WireError;
pub use packet::{MethodPacket, Packet, PacketId, PacketKind, ReplyError, ReplyPacket};
