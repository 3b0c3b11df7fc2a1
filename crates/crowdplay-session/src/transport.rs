//! The transport seam.
//!
//! The session reads and writes whole text frames through these traits. The
//! production implementation wraps a WebSocket (see [`crate::ws`]); tests
//! drive the session through the in-memory [`memory::duplex`] pair.

use async_trait::async_trait;

/// Failures crossing the transport boundary. Fatal for the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The transport is closed; nothing more can cross it.
    #[error("transport closed")]
    Closed,
    /// The transport failed.
    #[error("transport failure: {detail}")]
    Failed {
        /// Underlying failure text.
        detail: String,
    },
}

/// Send half of a connection: accepts one encoded frame at a time.
#[async_trait]
pub trait FrameSink: Send {
    /// Transmit one text frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Close the transport politely. Idempotent.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Receive half of a connection: yields whole text frames in arrival order.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame. `None` is end-of-stream.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;
}

/// In-memory transport, used by the test suites and handy for embedding.
pub mod memory {
    use tokio::sync::mpsc;

    use super::{FrameSink, FrameSource, TransportError, async_trait};

    /// Send half of an in-memory connection.
    pub struct MemorySink {
        tx: Option<mpsc::Sender<String>>,
    }

    /// Receive half of an in-memory connection.
    pub struct MemorySource {
        rx: mpsc::Receiver<String>,
    }

    /// One endpoint of an in-memory connection.
    pub struct MemoryTransport {
        /// Frames sent here arrive at the peer's `source`.
        pub sink: MemorySink,
        /// Frames the peer sent.
        pub source: MemorySource,
    }

    /// A connected pair of endpoints. Closing either sink ends the peer's
    /// source.
    #[must_use]
    pub fn duplex(capacity: usize) -> (MemoryTransport, MemoryTransport) {
        let (left_tx, right_rx) = mpsc::channel(capacity);
        let (right_tx, left_rx) = mpsc::channel(capacity);
        (
            MemoryTransport {
                sink: MemorySink { tx: Some(left_tx) },
                source: MemorySource { rx: left_rx },
            },
            MemoryTransport {
                sink: MemorySink { tx: Some(right_tx) },
                source: MemorySource { rx: right_rx },
            },
        )
    }

    #[async_trait]
    impl FrameSink for MemorySink {
        async fn send(&mut self, frame: String) -> Result<(), TransportError> {
            match &self.tx {
                Some(tx) => tx.send(frame).await.map_err(|_| TransportError::Closed),
                None => Err(TransportError::Closed),
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            // Dropping the sender is the end-of-stream signal for the peer.
            self.tx = None;
            Ok(())
        }
    }

    #[async_trait]
    impl FrameSource for MemorySource {
        async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
            self.rx.recv().await.map(Ok)
        }
    }

}
