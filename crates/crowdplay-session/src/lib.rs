//! Message-correlated RPC session over a duplex text-frame transport.
//!
//! One reader task demultiplexes everything inbound: replies resolve pending
//! calls by id, pushes fan out to subscribers in arrival order, undecodable
//! frames are reported and skipped. One writer task owns the send half.
//! [`Session`] is the only surface callers touch; domain bindings live in
//! `crowdplay-interactive`.

mod correlation;
mod error;
mod events;
mod session;
pub mod transport;
pub mod ws;

pub use error::{CloseReason, SessionError, codes};
pub use events::{EventStream, SessionEvent};
pub use session::{DEFAULT_CALL_TIMEOUT, Session, SessionConfig};

// Re-exported so callers can build and inspect packets without importing the
// wire crate themselves.
pub use crowdplay_wire::{
    MethodPacket, Packet, PacketId, PacketKind, ReplyError, ReplyPacket, WireError, decode, encode,
};
