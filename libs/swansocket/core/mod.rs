//! # swansocket core
//!
//! The protocol state machine:
//!
//! - **codec**: frame encoding/decoding and inbound classification
//! - **registry**: event name to ordered listeners
//! - **connection_state**: atomic session state and counters
//! - **heartbeat**: single-shot keepalive deadline
//! - **config**: YAML configuration and connection URL building
//! - **builder**: type-state session builder
//! - **session**: the session handle and its driver task
//!
//! ## Example
//!
//! ```rust,ignore
//! use swansocket::{builder, TungsteniteTransport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> swansocket::Result<()> {
//!     let session = builder()
//!         .url("wss://game.example.com")
//!         .transport(TungsteniteTransport::new())
//!         .build();
//!
//!     session.on("hello", |args| println!("hello: {:?}", args));
//!     session.connect().await?;
//!
//!     session.emit("leave", &[json!({ "name": "XiaoMing" })])?;
//!     session.close().await
//! }
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod connection_state;
pub mod heartbeat;
pub mod registry;
pub mod session;

// Re-export main types
pub use builder::{states, SessionBuilder};
pub use codec::{EventType, Inbound, Packet, PacketType};
pub use config::{ConfigError, SessionConfig};
pub use connection_state::{AtomicMetrics, AtomicSessionState, SessionState};
pub use heartbeat::Keepalive;
pub use registry::{EventRegistry, Listener};
pub use session::{Metrics, SessionEvent, SocketSession};

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new session builder
///
/// This is a convenience function for starting the builder pattern.
pub fn builder() -> SessionBuilder<builder::states::NoUrl, builder::states::NoTransport> {
    SessionBuilder::new()
}
