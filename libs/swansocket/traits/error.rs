use thiserror::Error;

/// Main error type for swansocket
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocketError {
    /// The transport reported a failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport failed before the session ever opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed while an operation depended on it
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Operation requires an open session
    #[error("socket is not connected")]
    NotConnected,

    /// Inbound frame did not match the framing pattern
    #[error("Parse error: {0}")]
    Parse(String),

    /// Outbound payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An `error` event was triggered with no listener registered
    #[error("Unhandled error event: {0}")]
    UnhandledError(String),

    /// Invalid state transition
    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),
}

impl From<serde_json::Error> for SocketError {
    fn from(err: serde_json::Error) -> Self {
        SocketError::Serialization(err.to_string())
    }
}

/// Result type for swansocket operations
pub type Result<T> = std::result::Result<T, SocketError>;
