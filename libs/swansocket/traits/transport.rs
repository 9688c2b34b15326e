//! Transport seam
//!
//! A session never touches sockets directly. It drives a [`Transport`],
//! which exchanges whole text frames and reports its lifecycle as
//! [`TransportSignal`]s on a channel handed over at open time.
//!
//! ```text
//! Session ──open(url)──> Transport ──Open/Message/Error/Close──> signal channel ──> Session driver
//! Session ──send(frame)─> Transport
//! Session ──close()────> Transport ──Close──> signal channel
//! ```

use crate::error::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Lifecycle signal raised by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    /// The connection is established and frames may flow
    Open,
    /// A complete text frame arrived
    Message(String),
    /// The transport failed
    Error(String),
    /// The connection is closed (clean or not)
    Close,
}

/// Sending half of the signal channel given to [`Transport::open`]
pub type SignalSender = UnboundedSender<TransportSignal>;

/// Receiving half of the signal channel, owned by the session driver
pub type SignalReceiver = UnboundedReceiver<TransportSignal>;

/// Create a signal channel pair
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Message-oriented, bidirectional transport carrying text frames
///
/// Implementations must deliver signals in the order they happen and must
/// not block in any method: `open` starts connecting and returns, `send`
/// queues a frame, `close` requests shutdown and later reports
/// [`TransportSignal::Close`].
///
/// A transport is exclusively owned by one session for its whole lifetime.
pub trait Transport: Send + 'static {
    /// Start connecting to `url`, reporting lifecycle signals on `signals`
    fn open(&mut self, url: &str, signals: SignalSender) -> Result<()>;

    /// Queue one text frame for sending
    fn send(&mut self, frame: &str) -> Result<()>;

    /// Request the connection to close
    fn close(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, url: &str, signals: SignalSender) -> Result<()> {
        (**self).open(url, signals)
    }

    fn send(&mut self, frame: &str) -> Result<()> {
        (**self).send(frame)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
