//! Common test utilities for swansocket integration tests
//!
//! Provides a tiny socket.io-speaking WebSocket server and helpers for
//! collecting listener calls.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// A mock socket.io server
///
/// - answers the `2probe` keepalive with `3probe`
/// - echoes every `42[...]` event frame back
/// - records every text frame plus the request URI and headers of each handshake
pub struct MockSocketIoServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    request_uris: Arc<Mutex<Vec<String>>>,
    request_headers: Arc<Mutex<Vec<HashMap<String, String>>>>,
    drop_clients: Arc<Notify>,
    shutdown: Arc<Notify>,
}

impl MockSocketIoServer {
    /// Create and start a new mock server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let request_uris = Arc::new(Mutex::new(Vec::new()));
        let request_headers = Arc::new(Mutex::new(Vec::new()));
        let drop_clients = Arc::new(Notify::new());
        let shutdown = Arc::new(Notify::new());

        let server = Self {
            addr,
            received: Arc::clone(&received),
            request_uris: Arc::clone(&request_uris),
            request_headers: Arc::clone(&request_headers),
            drop_clients: Arc::clone(&drop_clients),
            shutdown: Arc::clone(&shutdown),
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let received = Arc::clone(&received);
                                let request_uris = Arc::clone(&request_uris);
                                let request_headers = Arc::clone(&request_headers);
                                let drop_clients = Arc::clone(&drop_clients);
                                tokio::spawn(async move {
                                    Self::handle_connection(
                                        stream,
                                        received,
                                        request_uris,
                                        request_headers,
                                        drop_clients,
                                    )
                                    .await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown.notified() => {
                        break;
                    }
                }
            }
        });

        server
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        received: Arc<Mutex<Vec<String>>>,
        request_uris: Arc<Mutex<Vec<String>>>,
        request_headers: Arc<Mutex<Vec<HashMap<String, String>>>>,
        drop_clients: Arc<Notify>,
    ) {
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            request_uris.lock().push(req.uri().to_string());
            let headers = req
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            request_headers.lock().push(headers);
            Ok(resp)
        };

        let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            received.lock().push(text.clone());
                            let reply = if text == "2probe" {
                                Some("3probe".to_string())
                            } else if text.starts_with("42") {
                                Some(text)
                            } else {
                                None
                            };
                            if let Some(reply) = reply {
                                if write.send(Message::Text(reply)).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                _ = drop_clients.notified() => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/socket.io/", self.addr)
    }

    /// Text frames received so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    pub fn probes_received(&self) -> usize {
        self.received.lock().iter().filter(|f| *f == "2probe").count()
    }

    /// Request URIs of every handshake so far
    pub fn request_uris(&self) -> Vec<String> {
        self.request_uris.lock().clone()
    }

    /// Upgrade-request headers of every handshake so far, names lowercased
    pub fn request_headers(&self) -> Vec<HashMap<String, String>> {
        self.request_headers.lock().clone()
    }

    /// Close every connected client from the server side
    pub fn drop_clients(&self) {
        self.drop_clients.notify_waiters();
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockSocketIoServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Listener that forwards its arguments to a channel
pub fn recording_listener() -> (
    impl Fn(&[Value]) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<Vec<Value>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = move |args: &[Value]| {
        let _ = tx.send(args.to_vec());
    };
    (listener, rx)
}

/// Wait for the next listener call, failing the test after `timeout`
pub async fn next_call(
    rx: &mut mpsc::UnboundedReceiver<Vec<Value>>,
    timeout: Duration,
) -> Vec<Value> {
    tokio::time::timeout(timeout, rx.recv())
        .await
        .expect("timed out waiting for listener call")
        .expect("listener channel closed")
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
