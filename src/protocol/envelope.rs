//! Message envelope - the only entity ever transmitted.
//!
//! Every envelope carries a fixed channel tag ([`MESSAGE_TYPE`]) that
//! distinguishes framelink traffic from unrelated messages sharing the
//! same transport, and a [`Kind`] stating which protocol step it is.
//! Fields not used by a given kind are omitted on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The channel tag carried by every framelink message.
///
/// Cross-version or cross-library messages on the same transport carry a
/// different tag and are rejected by the validator.
pub const MESSAGE_TYPE: &str = "application/x-framelink-v1+json";

/// Protocol message kinds. Unknown kinds fail deserialization (fail closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Host -> child session negotiation, carries the host model snapshot.
    Handshake,
    /// Child -> host acceptance of a handshake.
    HandshakeReply,
    /// Host -> child property read, correlated by `uid`.
    Request,
    /// Child -> host answer to a request, correlated by `uid`.
    Reply,
    /// Host -> child fire-and-forget capability invocation.
    Call,
    /// Child -> host one-way event emission.
    Emit,
}

/// The structured message unit exchanged over the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Channel tag; must equal [`MESSAGE_TYPE`] exactly.
    #[serde(rename = "type")]
    pub marker: String,
    /// Protocol kind, named after the library on the wire.
    #[serde(rename = "framelink")]
    pub kind: Kind,
    /// Capability name targeted by request/call (echoed on reply).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Correlation id; present on request/reply pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u64>,
    /// Call/request arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Reply value, or the `{name, data}` pair of an emit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Host capability defaults; present on handshake only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Map<String, Value>>,
}

impl Envelope {
    fn base(kind: Kind) -> Self {
        Self {
            marker: MESSAGE_TYPE.to_string(),
            kind,
            property: None,
            uid: None,
            data: None,
            value: None,
            model: None,
        }
    }

    /// Build a handshake envelope carrying the host's model snapshot.
    pub fn handshake(model: Map<String, Value>) -> Self {
        let mut env = Self::base(Kind::Handshake);
        env.model = Some(model);
        env
    }

    /// Build a handshake-reply envelope.
    pub fn handshake_reply() -> Self {
        Self::base(Kind::HandshakeReply)
    }

    /// Build a request envelope for a property read.
    pub fn request(property: &str, uid: u64) -> Self {
        let mut env = Self::base(Kind::Request);
        env.property = Some(property.to_string());
        env.uid = Some(uid);
        env
    }

    /// Build a reply envelope answering the request with the given uid.
    pub fn reply(property: &str, uid: u64, value: Value) -> Self {
        let mut env = Self::base(Kind::Reply);
        env.property = Some(property.to_string());
        env.uid = Some(uid);
        env.value = Some(value);
        env
    }

    /// Build a fire-and-forget call envelope.
    pub fn call(property: &str, data: Value) -> Self {
        let mut env = Self::base(Kind::Call);
        env.property = Some(property.to_string());
        env.data = Some(data);
        env
    }

    /// Build an emit envelope carrying a `{name, data}` event pair.
    pub fn emit(name: &str, data: Value) -> Self {
        let mut env = Self::base(Kind::Emit);
        env.value = Some(json!({ "name": name, "data": data }));
        env
    }

    /// Serialize to the wire representation.
    pub fn to_value(&self) -> Value {
        // Envelope contains only JSON-representable fields; serialization
        // cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
