//! # swansocket
//!
//! A minimal socket.io-style client over a single message-oriented
//! transport.
//!
//! ## Features
//!
//! - **Frame codec**: `<packet digit>[<event digit>]<content>` frames, `42[...]` events
//! - **Keepalive**: one pending `2probe` at a time, rescheduled on every pong
//! - **Event dispatch**: `on` / `emit` with ordered listeners per event name
//! - **Pluggable transport**: tokio-tungstenite WebSocket or in-memory mock
//!
//! Not covered: binary events, acknowledgements, namespaces and reconnection.

pub mod traits;
pub mod core;
pub mod transport;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    builder, codec, config, connection_state, heartbeat, registry, session,
    builder::{states, SessionBuilder},
    codec::{EventType, Inbound, Packet, PacketType},
    config::{ConfigError, SessionConfig},
    connection_state::{AtomicMetrics, AtomicSessionState, SessionState},
    registry::{EventRegistry, Listener},
    session::{Metrics, SessionEvent, SocketSession},
};

// Re-export transports
pub use transport::{MockHandle, MockTransport, TungsteniteTransport};
