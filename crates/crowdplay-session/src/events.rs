//! Fan-out of session events to subscribers.
//!
//! Delivery must never block the receive loop, so every subscriber gets a
//! bounded queue and `try_send` semantics: a full queue drops the event for
//! that subscriber only and counts the drop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crowdplay_wire::{MethodPacket, ReplyPacket, WireError};

use crate::error::CloseReason;

/// Everything observable on a session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// An inbound method packet: a server push.
    Method(MethodPacket),
    /// An inbound reply, observed alongside normal correlation.
    Reply(ReplyPacket),
    /// A frame that failed to decode. The session keeps running.
    ProtocolError(WireError),
    /// The session stopped. The final event a subscriber sees.
    Closed(CloseReason),
}

pub(crate) struct ListenerRegistry {
    inner: Mutex<RegistryInner>,
    dropped_events: AtomicU64,
    capacity: usize,
}

struct RegistryInner {
    next_key: u64,
    listeners: HashMap<u64, mpsc::Sender<SessionEvent>>,
}

impl ListenerRegistry {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_key: 0,
                listeners: HashMap::new(),
            }),
            dropped_events: AtomicU64::new(0),
            capacity,
        }
    }

    pub(crate) fn subscribe(self: &Arc<Self>) -> EventStream {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut inner = self.inner.lock();
        let key = inner.next_key;
        inner.next_key += 1;
        let _ = inner.listeners.insert(key, tx);
        EventStream {
            key,
            receiver: rx,
            registry: Arc::clone(self),
        }
    }

    /// Deliver one event to every subscriber without blocking. Subscribers
    /// whose receiver is gone are pruned.
    pub(crate) fn dispatch(&self, event: &SessionEvent) {
        let listeners: Vec<(u64, mpsc::Sender<SessionEvent>)> = {
            let inner = self.inner.lock();
            inner
                .listeners
                .iter()
                .map(|(key, tx)| (*key, tx.clone()))
                .collect()
        };

        let mut stale = Vec::new();
        for (key, tx) in listeners {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let dropped = self.dropped_events.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(listener = key, dropped, "subscriber queue full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => stale.push(key),
            }
        }

        if !stale.is_empty() {
            let mut inner = self.inner.lock();
            for key in stale {
                let _ = inner.listeners.remove(&key);
            }
        }
    }

    pub(crate) fn remove(&self, key: u64) {
        let _ = self.inner.lock().listeners.remove(&key);
    }

    pub(crate) fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

/// A live subscription to session events. Dropping it unsubscribes.
pub struct EventStream {
    key: u64,
    receiver: mpsc::Receiver<SessionEvent>,
    registry: Arc<ListenerRegistry>,
}

impl EventStream {
    /// Next event in arrival order. `None` once the subscription is dead
    /// and its queue is drained.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.registry.remove(self.key);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crowdplay_wire::PacketId;

    use super::*;

    fn push(method: &str) -> SessionEvent {
        SessionEvent::Method(MethodPacket::fire(PacketId::new(9), method, json!({})))
    }

    #[test]
    fn every_subscriber_sees_events_in_dispatch_order() {
        let registry = Arc::new(ListenerRegistry::new(8));
        let mut first = registry.subscribe();
        let mut second = registry.subscribe();

        registry.dispatch(&push("onSceneCreate"));
        registry.dispatch(&push("onSceneDelete"));

        for stream in [&mut first, &mut second] {
            assert_eq!(stream.receiver.try_recv().unwrap(), push("onSceneCreate"));
            assert_eq!(stream.receiver.try_recv().unwrap(), push("onSceneDelete"));
        }
    }

    #[test]
    fn full_subscriber_loses_events_without_blocking_dispatch() {
        let registry = Arc::new(ListenerRegistry::new(1));
        let mut starved = registry.subscribe();
        let mut healthy = registry.subscribe();

        registry.dispatch(&push("first"));
        let _ = healthy.receiver.try_recv().unwrap();
        registry.dispatch(&push("second"));

        // `starved` never drained, so it kept only the first event.
        assert_eq!(starved.receiver.try_recv().unwrap(), push("first"));
        assert!(starved.receiver.try_recv().is_err());
        assert_eq!(healthy.receiver.try_recv().unwrap(), push("second"));
        assert_eq!(registry.dropped_events(), 1);
    }

    #[test]
    fn dropping_a_stream_unsubscribes_it() {
        let registry = Arc::new(ListenerRegistry::new(8));
        let stream = registry.subscribe();
        assert_eq!(registry.len(), 1);
        drop(stream);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn closed_receivers_are_pruned_on_dispatch() {
        let registry = Arc::new(ListenerRegistry::new(8));
        let mut stream = registry.subscribe();
        stream.receiver.close();

        registry.dispatch(&push("onReady"));
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.dropped_events(), 0);
    }
}
