//! # swansocket traits
//!
//! Seams between the protocol core and the outside world:
//!
//! - **Transport**: opens the connection, sends frames, reports lifecycle signals
//! - **HeaderProvider**: supplies upgrade-request headers to WebSocket transports
//! - **SocketError**: error type shared by every layer

pub mod error;
pub mod headers;
pub mod transport;

// Re-export commonly used types
pub use error::{Result, SocketError};
pub use headers::{HeaderProvider, Headers, NoHeaders, StaticHeaders};
pub use transport::{signal_channel, SignalReceiver, SignalSender, Transport, TransportSignal};
