//! The session: one reader, one writer, and the call gateway in front.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crowdplay_wire::{MethodPacket, Packet, decode, encode};

use crate::correlation::CorrelationTable;
use crate::error::{CloseReason, SessionError};
use crate::events::{EventStream, ListenerRegistry, SessionEvent};
use crate::transport::{FrameSink, FrameSource};

/// Default reply budget, matching the service's observed worst-case replies.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Session tunables. Start from `Default` and override what you need.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Reply budget for [`Session::call`]; `call_with_timeout` overrides it
    /// per call.
    pub call_timeout: Duration,
    /// Queue depth of each subscriber before events are dropped for it.
    pub event_buffer: usize,
    /// Queue depth between callers and the writer task.
    pub send_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            event_buffer: 128,
            send_buffer: 64,
        }
    }
}

struct Shared {
    table: CorrelationTable,
    listeners: Arc<ListenerRegistry>,
    outbound: mpsc::Sender<String>,
    shutdown: CancellationToken,
    config: SessionConfig,
}

/// Handle to a running session. Cheap to clone; every clone drives the same
/// connection.
///
/// The reader and writer tasks run until the transport ends or
/// [`Session::shutdown`] is called; merely dropping the handles does not
/// tear the connection down.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    /// Spawn the reader and writer tasks over an established transport.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn attach<Si, So>(sink: Si, source: So, config: SessionConfig) -> Self
    where
        Si: FrameSink + 'static,
        So: FrameSource + 'static,
    {
        let (out_tx, out_rx) = mpsc::channel(config.send_buffer);
        let shared = Arc::new(Shared {
            table: CorrelationTable::new(),
            listeners: Arc::new(ListenerRegistry::new(config.event_buffer)),
            outbound: out_tx,
            shutdown: CancellationToken::new(),
            config,
        });
        let _ = tokio::spawn(write_loop(Arc::clone(&shared), sink, out_rx));
        let _ = tokio::spawn(read_loop(Arc::clone(&shared), source));
        Self { shared }
    }

    /// Call `method` and decode the reply's result as `T`, using the
    /// configured timeout.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, SessionError> {
        self.call_with_timeout(method, params, self.shared.config.call_timeout)
            .await
    }

    /// Call `method` with an explicit reply budget.
    pub async fn call_with_timeout<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        budget: Duration,
    ) -> Result<T, SessionError> {
        let value = self.round_trip(method, params, budget).await?;
        serde_json::from_value(value).map_err(|source| SessionError::ResultDecode {
            method: method.to_owned(),
            source,
        })
    }

    /// Call `method` and hand back the raw result value.
    pub async fn call_value(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        self.round_trip(method, params, self.shared.config.call_timeout)
            .await
    }

    /// Fire-and-forget: send `method` with `discard: true` and register
    /// nothing. The id is still allocated, so ids stay strictly increasing
    /// across the connection.
    pub async fn fire(&self, method: &str, params: Value) -> Result<(), SessionError> {
        if let Some(reason) = self.shared.table.close_reason() {
            return Err(SessionError::ConnectionClosed { reason });
        }
        let id = self.shared.table.allocate();
        let frame = encode(&Packet::Method(MethodPacket::fire(id, method, params)));
        self.shared
            .outbound
            .send(frame)
            .await
            .map_err(|_| self.closed_error())
    }

    /// Subscribe to everything this session observes: pushes, replies,
    /// protocol errors, and the final close.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        self.shared.listeners.subscribe()
    }

    /// Close the session from this side. Pending calls fail with
    /// `ConnectionClosed`; idempotent. The tasks finish asynchronously.
    pub fn shutdown(&self) {
        close_session(&self.shared, CloseReason::LocalShutdown);
    }

    /// Number of calls currently awaiting a reply.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.shared.table.len()
    }

    /// Whether the session has stopped serving calls.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.table.is_closed()
    }

    /// Events dropped so far because a subscriber's queue was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.shared.listeners.dropped_events()
    }

    /// One call, one frame: allocate, register, send, await.
    async fn round_trip(
        &self,
        method: &str,
        params: Value,
        budget: Duration,
    ) -> Result<Value, SessionError> {
        let id = self.shared.table.allocate();
        // Register before sending: the reply can arrive in the gap.
        let receiver = self.shared.table.register(id)?;
        let frame = encode(&Packet::Method(MethodPacket::call(id, method, params)));
        if self.shared.outbound.send(frame).await.is_err() {
            // Writer is gone; the fresh record must not linger.
            let _ = self.shared.table.expire(id);
            return Err(self.closed_error());
        }

        let outcome = match timeout(budget, receiver).await {
            Err(_elapsed) => {
                // One frame per call: expire and report, never re-send. A
                // reply arriving after this finds no record.
                let _ = self.shared.table.expire(id);
                debug!(%id, method, ?budget, "call timed out");
                return Err(SessionError::Timeout {
                    method: method.to_owned(),
                    timeout: budget,
                });
            }
            Ok(Err(_sender_gone)) => return Err(self.closed_error()),
            Ok(Ok(outcome)) => outcome,
        };

        let reply = outcome?;
        reply.into_result().map_err(|error| SessionError::Remote {
            method: method.to_owned(),
            code: error.code,
            message: error.message,
            path: error.path,
        })
    }

    fn closed_error(&self) -> SessionError {
        SessionError::ConnectionClosed {
            reason: self
                .shared
                .table
                .close_reason()
                .unwrap_or(CloseReason::LocalShutdown),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pending_calls", &self.pending_calls())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// The close sequence, run at most once per session: fail the pending
/// calls, tell the subscribers, stop the tasks.
fn close_session(shared: &Shared, reason: CloseReason) {
    if shared.table.close(&reason) {
        debug!(%reason, "session closed");
        shared.listeners.dispatch(&SessionEvent::Closed(reason));
        shared.shutdown.cancel();
    }
}

async fn read_loop<So: FrameSource>(shared: Arc<Shared>, mut source: So) {
    let reason = loop {
        tokio::select! {
            () = shared.shutdown.cancelled() => break CloseReason::LocalShutdown,
            frame = source.next_frame() => match frame {
                None => break CloseReason::PeerClosed,
                Some(Err(err)) => break CloseReason::Transport { detail: err.to_string() },
                Some(Ok(frame)) => handle_frame(&shared, &frame),
            }
        }
    };
    close_session(&shared, reason);
}

/// One frame, in arrival order: replies resolve their call and are observed;
/// pushes fan out; undecodable input is reported and skipped.
fn handle_frame(shared: &Shared, frame: &str) {
    match decode(frame) {
        Ok(Packet::Reply(reply)) => {
            let observed = reply.clone();
            if !shared.table.resolve(reply) {
                debug!(id = %observed.id, "reply matches no pending call, dropping");
            }
            shared.listeners.dispatch(&SessionEvent::Reply(observed));
        }
        Ok(Packet::Method(packet)) => {
            shared.listeners.dispatch(&SessionEvent::Method(packet));
        }
        Err(err) => {
            warn!(error = %err, preview = frame_preview(frame), "undecodable frame");
            shared.listeners.dispatch(&SessionEvent::ProtocolError(err));
        }
    }
}

async fn write_loop<Si: FrameSink>(
    shared: Arc<Shared>,
    mut sink: Si,
    mut frames: mpsc::Receiver<String>,
) {
    loop {
        tokio::select! {
            () = shared.shutdown.cancelled() => {
                if let Err(err) = sink.close().await {
                    debug!(error = %err, "transport close failed");
                }
                break;
            }
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                if let Err(err) = sink.send(frame).await {
                    warn!(error = %err, "frame send failed, closing session");
                    close_session(&shared, CloseReason::Transport {
                        detail: err.to_string(),
                    });
                    let _ = sink.close().await;
                    break;
                }
            }
        }
    }
}

/// Cap log noise from hostile or corrupt input.
fn frame_preview(frame: &str) -> &str {
    let end = frame
        .char_indices()
        .nth(120)
        .map_or(frame.len(), |(index, _)| index);
    &frame[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_service_budget() {
        let config = SessionConfig::default();
        assert_eq!(config.call_timeout, Duration::from_secs(5));
        assert!(config.event_buffer > 0);
        assert!(config.send_buffer > 0);
    }

    #[test]
    fn frame_preview_respects_char_boundaries() {
        let frame = "ß".repeat(200);
        let preview = frame_preview(&frame);
        assert_eq!(preview.chars().count(), 120);
    }

    #[test]
    fn frame_preview_keeps_short_frames_whole() {
        assert_eq!(frame_preview("{\"type\":\"reply\"}"), "{\"type\":\"reply\"}");
    }
}
