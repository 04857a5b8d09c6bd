//! Host-side session facet.
//!
//! Backed by a dispatcher task that consumes the transport subscription
//! carried over from the handshake, so no message sent between reply and
//! establishment is lost. Every inbound message is re-validated against
//! the recorded peer origin before any dispatch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec::Codec;
use crate::error::{FramelinkError, Result};
use crate::frame::Frame;
use crate::protocol::{sanitize, Envelope, IdSource, Kind, OriginPolicy, Verdict};
use crate::transport::{Inbound, Transport};

/// Callback registered for an event name. Last registration wins.
pub type EventCallback = Box<dyn FnMut(Value) + Send>;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;
// Callbacks live in their own cell so dispatch can release the map lock
// before invoking; a callback is then free to re-enter `on`.
type EventCell = Arc<Mutex<EventCallback>>;
type EventMap = Arc<Mutex<HashMap<String, EventCell>>>;

/// The live host-side connection: `get`/`call`/`on`/`destroy`.
pub struct HostSession {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    frame: Arc<dyn Frame>,
    peer_origin: String,
    ids: IdSource,
    pending: PendingMap,
    events: EventMap,
    dispatcher: JoinHandle<()>,
    destroyed: AtomicBool,
}

impl HostSession {
    /// Install the dispatcher over an already-validated channel.
    pub(crate) fn establish(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
        frame: Arc<dyn Frame>,
        peer_origin: String,
        rx: mpsc::UnboundedReceiver<Inbound>,
    ) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let events: EventMap = Arc::new(Mutex::new(HashMap::new()));

        tracing::debug!(origin = %peer_origin, "Host: registering API");
        let dispatcher = tokio::spawn(Self::dispatch_loop(
            rx,
            codec.clone(),
            OriginPolicy::Exact(peer_origin.clone()),
            pending.clone(),
            events.clone(),
        ));

        Self {
            transport,
            codec,
            frame,
            peer_origin,
            ids: IdSource::new(),
            pending,
            events,
            dispatcher,
            destroyed: AtomicBool::new(false),
        }
    }

    /// The peer origin recorded from the handshake reply. All traffic is
    /// sent to and validated against this origin.
    pub fn peer_origin(&self) -> &str {
        &self.peer_origin
    }

    /// Read a capability from the child's table.
    ///
    /// Resolves when the matching reply arrives. No timeout is imposed:
    /// a reply that never arrives leaves this future pending for the
    /// session's lifetime.
    pub async fn get(&self, property: &str) -> Result<Value> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(FramelinkError::Destroyed);
        }
        let uid = self.ids.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .insert(uid, tx);

        let wire = self
            .codec
            .encode_outgoing(Envelope::request(property, uid).to_value());
        self.transport.post(wire, &self.peer_origin)?;

        rx.await.map_err(|_| FramelinkError::ChannelClosed)
    }

    /// Fire-and-forget invocation of a child capability. No reply is
    /// awaited.
    pub fn call(&self, property: &str, data: Value) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(FramelinkError::Destroyed);
        }
        let wire = self
            .codec
            .encode_outgoing(Envelope::call(property, data).to_value());
        self.transport.post(wire, &self.peer_origin)
    }

    /// Register a callback for an event name. Exactly one callback per
    /// name; re-registering silently replaces the prior callback.
    ///
    /// May be called from inside another event callback.
    pub fn on<F>(&self, event_name: &str, callback: F) -> Result<()>
    where
        F: FnMut(Value) + Send + 'static,
    {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(FramelinkError::Destroyed);
        }
        self.events.lock().expect("events lock poisoned").insert(
            event_name.to_string(),
            Arc::new(Mutex::new(Box::new(callback))),
        );
        Ok(())
    }

    /// Tear the session down: stop the dispatcher, detach the frame, and
    /// fail any still-pending `get` with [`FramelinkError::ChannelClosed`].
    ///
    /// Idempotent; a second call is a no-op.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("Host: destroying session");
        self.dispatcher.abort();
        self.pending.lock().expect("pending lock poisoned").clear();
        self.frame.detach();
    }

    async fn dispatch_loop(
        mut rx: mpsc::UnboundedReceiver<Inbound>,
        codec: Arc<dyn Codec>,
        policy: OriginPolicy,
        pending: PendingMap,
        events: EventMap,
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
            let envelope = match sanitize(&msg, &policy) {
                Verdict::Accepted(envelope) => envelope,
                Verdict::Rejected => continue,
            };
            match envelope.kind {
                Kind::Reply => Self::settle_reply(&pending, envelope),
                Kind::Emit => Self::dispatch_emit(&events, envelope),
                kind => {
                    tracing::debug!(?kind, "Host: ignoring unexpected kind");
                }
            }
        }
    }

    fn settle_reply(pending: &PendingMap, envelope: Envelope) {
        let uid = match envelope.uid {
            Some(uid) => uid,
            None => return,
        };
        let waiter = pending
            .lock()
            .expect("pending lock poisoned")
            .remove(&uid);
        if let Some(tx) = waiter {
            // The waiter may have been dropped; that is not an error.
            let _ = tx.send(envelope.value.unwrap_or(Value::Null));
        } else {
            tracing::debug!(uid, "Host: reply with no pending transaction");
        }
    }

    fn dispatch_emit(events: &EventMap, envelope: Envelope) {
        let pair = match envelope.value {
            Some(pair) => pair,
            None => return,
        };
        let name = match pair.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => return,
        };
        let data = pair.get("data").cloned().unwrap_or(Value::Null);
        tracing::debug!(event = %name, "Host: received event emission");
        // Clone the cell out and release the map lock before invoking,
        // so a callback re-entering `on` only touches the map, never the
        // cell it is running in.
        let cell = events
            .lock()
            .expect("events lock poisoned")
            .get(&name)
            .cloned();
        if let Some(cell) = cell {
            let mut callback = cell.lock().expect("event callback lock poisoned");
            (*callback)(data);
        }
    }
}

impl Drop for HostSession {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}
