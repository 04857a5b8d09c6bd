//! Codec module - pluggable transformation of envelopes at the
//! transport boundary.
//!
//! A codec sees every outgoing wire value just before it is posted and
//! every inbound wire value just before validation, so an end-to-end
//! encryption layer can be slotted in without the handshake, correlation,
//! or validation core knowing whether payloads cross in clear.
//!
//! A failed decode is indistinguishable from foreign traffic and is
//! silently discarded, like any other validation failure.

mod plain;

pub use plain::PlainCodec;

use serde_json::Value;

use crate::error::Result;

/// Transforms wire values crossing the transport boundary.
pub trait Codec: Send + Sync + 'static {
    /// Transform an outgoing wire value before it is posted.
    fn encode_outgoing(&self, envelope: Value) -> Value;

    /// Transform an inbound wire value before validation.
    ///
    /// # Errors
    ///
    /// Returns an error (typically
    /// [`FramelinkError::CodecDecode`](crate::FramelinkError::CodecDecode))
    /// when the value cannot be decoded; the caller discards the message.
    fn decode_incoming(&self, envelope: Value) -> Result<Value>;
}
