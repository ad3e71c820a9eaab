use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors surfaced by the broker and the wire layer.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Player1 waited the full timeout without an opponent arriving.
    #[error("deadline exceeded waiting for opponent")]
    WaitTimeout,

    /// The peer cancelled or disconnected before the match started.
    #[error("player disconnected")]
    Cancelled,

    /// The stream ended before the opening name message.
    #[error("stream closed before the opening message")]
    Handshake,

    /// A frame failed validation (unknown shape code, wrong dimensions,
    /// unparsable payload). The session is treated as corrupt.
    #[error("invalid game message: {0}")]
    BadMessage(String),

    /// Failed to encode an outgoing frame.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
