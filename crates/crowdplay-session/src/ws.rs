//! WebSocket transport adapters over `tokio-tungstenite`.
//!
//! Thin glue only: authentication, retry, and reconnect policies are the
//! caller's concern.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::transport::{FrameSink, FrameSource, TransportError};

/// The stream type produced by [`connect`].
pub type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Send half of a WebSocket connection.
pub struct WsSink<S> {
    inner: SplitSink<WebSocketStream<S>, Message>,
}

/// Receive half of a WebSocket connection.
pub struct WsSource<S> {
    inner: SplitStream<WebSocketStream<S>>,
}

/// Split an established WebSocket into the session's two transport halves.
pub fn split<S>(stream: WebSocketStream<S>) -> (WsSink<S>, WsSource<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, source) = stream.split();
    (WsSink { inner: sink }, WsSource { inner: source })
}

/// Dial `url` and hand back transport halves ready for `Session::attach`.
pub async fn connect(
    url: &str,
) -> Result<
    (
        WsSink<MaybeTlsStream<TcpStream>>,
        WsSource<MaybeTlsStream<TcpStream>>,
    ),
    TransportError,
> {
    let (stream, _response) = connect_async(url).await.map_err(|err| {
        TransportError::Failed {
            detail: err.to_string(),
        }
    })?;
    Ok(split(stream))
}

fn map_ws_error(err: &WsError) -> TransportError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        other => TransportError::Failed {
            detail: other.to_string(),
        },
    }
}

#[async_trait]
impl<S> FrameSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.inner
            .send(Message::text(frame))
            .await
            .map_err(|err| map_ws_error(&err))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.inner.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(TransportError::Failed {
                detail: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl<S> FrameSource for WsSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                // The service encodes everything as UTF-8 text; read a stray
                // binary frame the same way and let the codec judge it.
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()));
                }
                // tokio-tungstenite answers pings on flush; neither kind
                // carries a frame.
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Ok(Message::Close(_)) => return None,
                // Raw frames never surface from a read.
                Ok(Message::Frame(_)) => {}
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(err) => return Some(Err(map_ws_error(&err))),
            }
        }
    }
}
