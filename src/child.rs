//! Handshake responder - the child side of session establishment.
//!
//! Purely reactive: the child registers a listener and waits. The first
//! inbound message carrying the protocol kind field decides the outcome.
//! A handshake is answered once, to the exact sender; anything else is a
//! terminal handshake failure. Untagged traffic is ignored and the wait
//! continues.
//!
//! # Example
//!
//! ```ignore
//! use framelink::{Child, Model};
//! use serde_json::json;
//!
//! let session = Child::builder(transport)
//!     .model(Model::new().with_value("height", json!(120)))
//!     .listen()
//!     .await?;
//!
//! session.emit("ready", json!(true))?;
//! ```

use std::sync::Arc;

use crate::codec::{Codec, PlainCodec};
use crate::error::{FramelinkError, Result};
use crate::model::Model;
use crate::protocol::{Envelope, Kind};
use crate::session::ChildSession;
use crate::transport::Transport;

/// Entry point of the child side.
pub struct Child;

impl Child {
    /// Create a builder over the given transport.
    pub fn builder<T: Transport>(transport: T) -> ChildBuilder {
        ChildBuilder::new(Arc::new(transport))
    }
}

/// Builder for configuring and establishing a child session.
pub struct ChildBuilder {
    transport: Arc<dyn Transport>,
    model: Model,
    codec: Arc<dyn Codec>,
    accept_any_origin: bool,
}

impl ChildBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            model: Model::new(),
            codec: Arc::new(PlainCodec),
            accept_any_origin: false,
        }
    }

    /// The local capability table served to the peer. Host-supplied
    /// defaults are merged in at handshake time; local definitions win.
    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Codec applied at the transport boundary. Default: [`PlainCodec`].
    pub fn codec<C: Codec>(mut self, codec: C) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Skip the per-message origin check on established-session traffic.
    ///
    /// Only for transports that guarantee origin isolation out-of-band;
    /// by default requests are served only for origins that completed a
    /// handshake.
    pub fn accept_any_origin(mut self) -> Self {
        self.accept_any_origin = true;
        self
    }

    /// Wait for a handshake and establish the session.
    ///
    /// # Errors
    ///
    /// [`FramelinkError::HandshakeFailed`] when the first tagged message
    /// is not a handshake; [`FramelinkError::ChannelClosed`] when the
    /// transport subscription ends while waiting.
    pub async fn listen(self) -> Result<ChildSession> {
        let mut model = self.model;
        let mut rx = self.transport.subscribe();
        tracing::debug!("Child: awaiting handshake");

        loop {
            let msg = rx.recv().await.ok_or(FramelinkError::ChannelClosed)?;
            let decoded = match self.codec.decode_incoming(msg.data) {
                Ok(value) => value,
                Err(_) => continue,
            };
            // Untagged traffic is not for us; keep waiting.
            let tagged = decoded
                .as_object()
                .map(|obj| obj.contains_key("framelink"))
                .unwrap_or(false);
            if !tagged {
                continue;
            }

            match serde_json::from_value::<Envelope>(decoded) {
                Ok(envelope) if envelope.kind == Kind::Handshake => {
                    tracing::debug!(origin = %msg.origin, "Child: received handshake");
                    if let Some(defaults) = envelope.model {
                        model.merge_defaults(defaults);
                    }
                    // Reply to the exact sender, not broadcast.
                    let wire = self
                        .codec
                        .encode_outgoing(Envelope::handshake_reply().to_value());
                    self.transport.post(wire, &msg.origin)?;
                    tracing::debug!(origin = %msg.origin, "Child: sent handshake reply");
                    return Ok(ChildSession::establish(
                        self.transport,
                        self.codec,
                        model,
                        msg.origin,
                        self.accept_any_origin,
                        rx,
                    ));
                }
                other => {
                    let detail = match other {
                        Ok(envelope) => format!("first tagged message was {:?}", envelope.kind),
                        Err(_) => "first tagged message had an unrecognized shape".to_string(),
                    };
                    tracing::debug!(%detail, "Child: handshake failed");
                    return Err(FramelinkError::HandshakeFailed(detail));
                }
            }
        }
    }
}
