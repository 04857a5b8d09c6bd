//! Error types for framelink.

use thiserror::Error;

/// Main error type for all framelink operations.
#[derive(Debug, Error)]
pub enum FramelinkError {
    /// Handshake received a validated message of an unexpected kind,
    /// or the child's first tagged message was not a handshake.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The opt-in handshake timeout elapsed before a reply validated.
    ///
    /// Only produced when a timeout was explicitly configured; by default
    /// an unanswered handshake leaves the connect future pending.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// The transport subscription ended (peer endpoint dropped).
    #[error("channel closed")]
    ChannelClosed,

    /// Operation attempted on a destroyed session.
    #[error("session destroyed")]
    Destroyed,

    /// A codec failed to decode an inbound payload. Dispatchers treat
    /// this like any validation failure: the message is discarded.
    #[error("codec decode error: {0}")]
    CodecDecode(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using FramelinkError.
pub type Result<T> = std::result::Result<T, FramelinkError>;
