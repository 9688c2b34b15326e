//! WebSocket transport on tokio-tungstenite
//!
//! `open` spawns one I/O task per connection:
//!
//! ```text
//! send(frame) ──> outbound channel ──┐
//! close()     ──> outbound channel ──┤
//!                                    ▼
//!                          ┌───────────────────┐
//!                          │  I/O task         │ ──Open/Message/Error/Close──> signals
//!                          │  select! {        │
//!                          │    read.next()    │
//!                          │    outbound.recv()│
//!                          │  }                │
//!                          └───────────────────┘
//! ```
//!
//! Only text frames carry protocol data. Binary frames are dropped and
//! WebSocket-level ping/pong is left to tungstenite.

use crate::traits::*;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug)]
enum Outbound {
    Frame(String),
    Close,
}

/// WebSocket transport for `ws://` and `wss://` URLs
pub struct TungsteniteTransport {
    headers: Option<Arc<dyn HeaderProvider>>,
    outbound: Option<UnboundedSender<Outbound>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self {
            headers: None,
            outbound: None,
            task: None,
        }
    }

    /// Add headers to the upgrade request
    pub fn with_headers(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.headers = Some(Arc::new(provider));
        self
    }

    fn outbound(&self) -> Result<&UnboundedSender<Outbound>> {
        self.outbound
            .as_ref()
            .ok_or_else(|| SocketError::InvalidState("transport is not open".to_string()))
    }
}

impl Default for TungsteniteTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TungsteniteTransport {
    fn open(&mut self, url: &str, signals: SignalSender) -> Result<()> {
        if self.outbound.is_some() {
            return Err(SocketError::InvalidState(
                "transport already opened".to_string(),
            ));
        }

        let (outbound_tx, outbound_rx) = unbounded_channel();
        let url = url.to_string();
        let headers = self.headers.clone();

        self.task = Some(tokio::spawn(async move {
            run_connection(url, headers, signals, outbound_rx).await;
        }));
        self.outbound = Some(outbound_tx);
        Ok(())
    }

    fn send(&mut self, frame: &str) -> Result<()> {
        self.outbound()?
            .send(Outbound::Frame(frame.to_string()))
            .map_err(|e| SocketError::ChannelSend(e.to_string()))
    }

    fn close(&mut self) -> Result<()> {
        self.outbound()?
            .send(Outbound::Close)
            .map_err(|e| SocketError::ChannelSend(e.to_string()))
    }
}

impl Drop for TungsteniteTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn connect(url: &str, headers: Option<Arc<dyn HeaderProvider>>) -> Result<WsStream> {
    let mut request = url
        .into_client_request()
        .map_err(|e| SocketError::ConnectionFailed(format!("Invalid URL '{}': {}", url, e)))?;

    if let Some(provider) = headers {
        for (key, value) in provider.get_headers().await {
            match (
                key.parse::<http::header::HeaderName>(),
                value.parse::<http::header::HeaderValue>(),
            ) {
                (Ok(name), Ok(value)) => {
                    request.headers_mut().insert(name, value);
                }
                (Err(_), _) => warn!("Invalid header name: {}", key),
                (_, Err(_)) => warn!("Invalid header value for key '{}': {}", key, value),
            }
        }
        debug!("Connecting with custom headers");
    }

    let (stream, _) = connect_async(request)
        .await
        .map_err(|e| SocketError::ConnectionFailed(e.to_string()))?;
    Ok(stream)
}

async fn run_connection(
    url: String,
    headers: Option<Arc<dyn HeaderProvider>>,
    signals: SignalSender,
    mut outbound: UnboundedReceiver<Outbound>,
) {
    let stream = match connect(&url, headers).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to connect: {}", e);
            let _ = signals.send(TransportSignal::Error(e.to_string()));
            return;
        }
    };

    info!("WebSocket connected to {}", url);
    let _ = signals.send(TransportSignal::Open);

    let (mut write, mut read) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = signals.send(TransportSignal::Message(text));
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!("Dropping {} byte binary frame", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    // tungstenite answers the close itself; the stream ends next
                    debug!("Close frame received: {:?}", frame);
                    closing = true;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Err(e)) => {
                    if !closing {
                        error!("WebSocket error: {}", e);
                        let _ = signals.send(TransportSignal::Error(e.to_string()));
                    }
                    break;
                }
                None => break,
            },

            cmd = outbound.recv(), if !closing => match cmd {
                Some(Outbound::Frame(frame)) => {
                    if let Err(e) = write.send(Message::Text(frame)).await {
                        error!("Failed to send frame: {}", e);
                        let _ = signals.send(TransportSignal::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outbound::Close) => {
                    debug!("Closing WebSocket");
                    closing = true;
                    if let Err(e) = write.close().await {
                        debug!("Close handshake failed: {}", e);
                        break;
                    }
                }
                None => {
                    debug!("Transport handle dropped, closing WebSocket");
                    closing = true;
                    let _ = write.close().await;
                }
            },
        }
    }

    info!("WebSocket connection to {} ended", url);
    let _ = signals.send(TransportSignal::Close);
}
