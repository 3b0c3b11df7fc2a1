//! The correlation table: every in-flight call, keyed by packet id.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crowdplay_wire::{PacketId, ReplyPacket};

use crate::error::{CloseReason, SessionError};

/// Outcome delivered to a waiting caller.
pub(crate) type CallResult = Result<ReplyPacket, SessionError>;

/// One registered call awaiting its reply.
struct PendingCall {
    created_at: Instant,
    completion: oneshot::Sender<CallResult>,
}

/// Table state. The id counter and the pending map live behind one mutex so
/// allocating, checking, and inserting an id is a single critical section.
struct Inner {
    next_id: u32,
    pending: HashMap<PacketId, PendingCall>,
    closed: Option<CloseReason>,
}

pub(crate) struct CorrelationTable {
    inner: Mutex<Inner>,
}

impl CorrelationTable {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                pending: HashMap::new(),
                closed: None,
            }),
        }
    }

    /// Next monotonic id. Never reused for the lifetime of the table.
    pub(crate) fn allocate(&self) -> PacketId {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        PacketId::new(id)
    }

    /// Insert a pending record for `id` and hand back the completion
    /// receiver. Callers register before the frame is sent, so a reply
    /// arriving in the send gap always finds the record.
    pub(crate) fn register(
        &self,
        id: PacketId,
    ) -> Result<oneshot::Receiver<CallResult>, SessionError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.closed {
            return Err(SessionError::ConnectionClosed {
                reason: reason.clone(),
            });
        }
        if inner.pending.contains_key(&id) {
            return Err(SessionError::DuplicateId { id });
        }
        let (completion, receiver) = oneshot::channel();
        let _ = inner.pending.insert(
            id,
            PendingCall {
                created_at: Instant::now(),
                completion,
            },
        );
        Ok(receiver)
    }

    /// Route a reply to its pending call. Removal and completion happen in
    /// that order, so at most one writer ever reaches a given record: a
    /// second reply with the same id finds nothing and returns `false`.
    pub(crate) fn resolve(&self, reply: ReplyPacket) -> bool {
        let pending = { self.inner.lock().pending.remove(&reply.id) };
        match pending {
            Some(call) => {
                debug!(id = %reply.id, elapsed = ?call.created_at.elapsed(), "call resolved");
                // The waiter may have timed out between removal and here;
                // its receiver is gone and the reply is dropped, which is
                // exactly the late-reply contract.
                let _ = call.completion.send(Ok(reply));
                true
            }
            None => false,
        }
    }

    /// Drop the record for a call whose waiter gave up. A reply arriving
    /// later finds nothing.
    pub(crate) fn expire(&self, id: PacketId) -> bool {
        self.inner.lock().pending.remove(&id).is_some()
    }

    /// Fail every pending call with `ConnectionClosed` and refuse future
    /// registrations. Returns `false` when the table was already closed, so
    /// the close sequence runs at most once.
    pub(crate) fn close(&self, reason: &CloseReason) -> bool {
        let drained: Vec<(PacketId, PendingCall)> = {
            let mut inner = self.inner.lock();
            if inner.closed.is_some() {
                return false;
            }
            inner.closed = Some(reason.clone());
            inner.pending.drain().collect()
        };
        for (id, call) in drained {
            debug!(%id, %reason, "failing pending call on close");
            let _ = call.completion.send(Err(SessionError::ConnectionClosed {
                reason: reason.clone(),
            }));
        }
        true
    }

    /// The recorded close reason, if the table has closed.
    pub(crate) fn close_reason(&self) -> Option<CloseReason> {
        self.inner.lock().closed.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().closed.is_some()
    }
}
