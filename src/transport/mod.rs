//! Transport abstraction.
//!
//! The core never touches a concrete message channel; it only needs to
//! post a structured value toward a target origin and to subscribe to
//! whatever arrives at the local endpoint. [`ChannelHub`] provides an
//! in-memory, origin-addressed implementation used by the tests and by
//! same-process embeddings.

mod channel;

pub use channel::{ChannelEndpoint, ChannelHub};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// Wildcard target origin: deliver regardless of the receiver's origin.
pub const ANY_ORIGIN: &str = "*";

/// A message received from the transport, with its reported sender origin.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Origin the transport reports for the sender. Untrusted until
    /// validated.
    pub origin: String,
    /// The raw structured payload.
    pub data: Value,
}

/// A bidirectional, asynchronous message channel endpoint.
///
/// Implementations must deliver each posted message to the listeners
/// subscribed at the time of posting, asynchronously and without
/// reentrancy, and must stamp every delivery with the sender's origin.
pub trait Transport: Send + Sync + 'static {
    /// Post a message toward the given target origin. A message nobody
    /// receives is not an error from the protocol's point of view, but
    /// implementations may report a torn-down channel.
    fn post(&self, message: Value, target_origin: &str) -> Result<()>;

    /// Register a new listener. Each subscriber observes every message
    /// delivered to this endpoint after registration.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Inbound>;
}
