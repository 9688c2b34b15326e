//! Transport implementations
//!
//! - **websocket**: tokio-tungstenite client for real servers
//! - **mock**: in-memory transport for tests

pub mod mock;
pub mod websocket;

pub use mock::{MockHandle, MockTransport};
pub use websocket::TungsteniteTransport;
