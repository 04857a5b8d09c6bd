//! Child-side session facet.
//!
//! The inbound dispatcher runs for the lifetime of the session: `call`
//! invokes the named local capability without replying, `request`
//! resolves it and always answers with a `reply` carrying the same
//! correlation id, addressed to the message's reported sender. Replies
//! are per-sender, so several hosts may legitimately interact with one
//! child; a late handshake from a new origin is answered and the origin
//! joins the peer set.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::codec::Codec;
use crate::error::{FramelinkError, Result};
use crate::model::Model;
use crate::protocol::{sanitize, Envelope, Kind, OriginPolicy, Verdict};
use crate::transport::{Inbound, Transport};

type PeerSet = Arc<Mutex<HashSet<String>>>;

/// The live child-side connection: `emit` plus the request dispatcher.
pub struct ChildSession {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    peers: PeerSet,
    dispatcher: JoinHandle<()>,
    closed: AtomicBool,
}

impl ChildSession {
    /// Install the dispatcher over the channel carried from the handshake.
    pub(crate) fn establish(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
        model: Model,
        peer_origin: String,
        accept_any_origin: bool,
        rx: mpsc::UnboundedReceiver<Inbound>,
    ) -> Self {
        let peers: PeerSet = Arc::new(Mutex::new(HashSet::from([peer_origin])));

        tracing::debug!("Child: registering API");
        let dispatcher = tokio::spawn(Self::dispatch_loop(
            rx,
            transport.clone(),
            codec.clone(),
            Arc::new(model),
            peers.clone(),
            accept_any_origin,
        ));

        Self {
            transport,
            codec,
            peers,
            dispatcher,
            closed: AtomicBool::new(false),
        }
    }

    /// Origins with an established handshake, in no particular order.
    pub fn peer_origins(&self) -> Vec<String> {
        let peers = self.peers.lock().expect("peers lock poisoned");
        peers.iter().cloned().collect()
    }

    /// Emit a one-way event to every established peer, one targeted
    /// envelope per recorded origin. No acknowledgment.
    pub fn emit(&self, name: &str, data: Value) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FramelinkError::Destroyed);
        }
        tracing::debug!(event = %name, "Child: emitting event");
        let wire = self.codec.encode_outgoing(Envelope::emit(name, data).to_value());
        let peers = self.peer_origins();
        for origin in peers {
            self.transport.post(wire.clone(), &origin)?;
        }
        Ok(())
    }

    /// Stop the dispatcher. Idempotent; a second call is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("Child: closing session");
        self.dispatcher.abort();
    }

    async fn dispatch_loop(
        mut rx: mpsc::UnboundedReceiver<Inbound>,
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
        model: Arc<Model>,
        peers: PeerSet,
        accept_any_origin: bool,
    ) {
        while let Some(msg) = rx.recv().await {
            let decoded = match codec.decode_incoming(msg.data) {
                Ok(value) => value,
                Err(_) => continue,
            };
            let msg = Inbound {
                origin: msg.origin,
                data: decoded,
            };
            // Shape and tag are always checked; the origin gate below is
            // the peer set (unless skip-check was configured).
            let envelope = match sanitize(&msg, &OriginPolicy::Any) {
                Verdict::Accepted(envelope) => envelope,
                Verdict::Rejected => continue,
            };

            if envelope.kind == Kind::Handshake {
                let newly_recorded = peers
                    .lock()
                    .expect("peers lock poisoned")
                    .insert(msg.origin.clone());
                if newly_recorded {
                    tracing::debug!(origin = %msg.origin, "Child: handshake from new host");
                }
                let wire = codec.encode_outgoing(Envelope::handshake_reply().to_value());
                if transport.post(wire, &msg.origin).is_err() {
                    return;
                }
                continue;
            }

            let admitted = accept_any_origin
                || peers
                    .lock()
                    .expect("peers lock poisoned")
                    .contains(&msg.origin);
            if !admitted {
                continue;
            }

            match envelope.kind {
                Kind::Call => {
                    tracing::debug!(property = ?envelope.property, "Child: received call");
                    // Invoked in dispatch order, so a later request observes
                    // the call's effects.
                    let property = envelope.property.unwrap_or_default();
                    model.invoke(&property, envelope.data).await;
                }
                Kind::Request => {
                    let uid = match envelope.uid {
                        Some(uid) => uid,
                        None => continue,
                    };
                    let property = envelope.property.unwrap_or_default();
                    tracing::debug!(property = %property, uid, "Child: received request");
                    let resolution = model.resolve(&property, envelope.data);
                    let transport = transport.clone();
                    let codec = codec.clone();
                    let reply_to = msg.origin.clone();
                    // Resolution may be slow; never block the dispatcher.
                    tokio::spawn(async move {
                        let value = resolution.await;
                        let wire = codec
                            .encode_outgoing(Envelope::reply(&property, uid, value).to_value());
                        let _ = transport.post(wire, &reply_to);
                    });
                }
                kind => {
                    tracing::debug!(?kind, "Child: ignoring unexpected kind");
                }
            }
        }
    }
}

impl Drop for ChildSession {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}
