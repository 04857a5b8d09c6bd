//! Handshake initiator - the host side of session establishment.
//!
//! The [`HostBuilder`] provides a fluent API for configuring the
//! connection. [`HostBuilder::connect`] runs the lifecycle:
//! 1. Subscribe to the transport (before navigation, so no reply is missed)
//! 2. Navigate the frame to the target URL and await load
//! 3. Compute the expected peer origin from the URL
//! 4. Send the handshake, re-sending on a fixed interval up to the
//!    attempt cap
//! 5. Validate the reply and hand the channel to a [`HostSession`]
//!
//! # Example
//!
//! ```ignore
//! use framelink::{Host, Model, ChannelHub};
//! use serde_json::json;
//!
//! let (host_end, child_end) = ChannelHub::pair("https://host.example.com", "https://child.example.com");
//!
//! let session = Host::builder(host_end)
//!     .url("https://child.example.com/widget.html")
//!     .model(Model::new().with_value("theme", json!("dark")))
//!     .connect()
//!     .await?;
//!
//! let height = session.get("height").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use crate::codec::{Codec, PlainCodec};
use crate::error::{FramelinkError, Result};
use crate::frame::{DetachedFrame, Frame};
use crate::model::Model;
use crate::origin::resolve_origin;
use crate::protocol::{sanitize, Envelope, Kind, OriginPolicy, Verdict};
use crate::session::HostSession;
use crate::transport::{Inbound, Transport};

/// Default hard cap on handshake attempts.
pub const DEFAULT_MAX_HANDSHAKE_ATTEMPTS: u32 = 5;

/// Default interval between handshake attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Entry point of the host side.
pub struct Host;

impl Host {
    /// Create a builder over the given transport.
    pub fn builder<T: Transport>(transport: T) -> HostBuilder {
        HostBuilder::new(Arc::new(transport))
    }
}

/// Builder for configuring and establishing a host session.
pub struct HostBuilder {
    transport: Arc<dyn Transport>,
    url: String,
    local_origin: String,
    model: Model,
    frame: Arc<dyn Frame>,
    codec: Arc<dyn Codec>,
    max_handshake_attempts: u32,
    retry_interval: Duration,
    handshake_timeout: Option<Duration>,
}

impl HostBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            url: String::new(),
            local_origin: String::new(),
            model: Model::new(),
            frame: Arc::new(DetachedFrame),
            codec: Arc::new(PlainCodec),
            max_handshake_attempts: DEFAULT_MAX_HANDSHAKE_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            handshake_timeout: None,
        }
    }

    /// Target URL the child is loaded from. Its scheme+host+port become
    /// the expected peer origin for handshake validation.
    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Local document origin, used as the expected peer origin when the
    /// target URL is relative or empty.
    pub fn local_origin(mut self, origin: &str) -> Self {
        self.local_origin = origin.to_string();
        self
    }

    /// Capability defaults sent with the handshake and merged into the
    /// child's model for keys the child does not define itself.
    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// The frame collaborator to navigate and later detach.
    /// Default: [`DetachedFrame`] (no-op).
    pub fn frame<F: Frame>(mut self, frame: F) -> Self {
        self.frame = Arc::new(frame);
        self
    }

    /// Codec applied at the transport boundary. Default: [`PlainCodec`].
    pub fn codec<C: Codec>(mut self, codec: C) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Hard cap on handshake attempts. Default: 5.
    pub fn max_handshake_attempts(mut self, attempts: u32) -> Self {
        self.max_handshake_attempts = attempts;
        self
    }

    /// Interval between handshake attempts. Default: 500 ms.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Opt-in overall deadline for session establishment.
    ///
    /// By default an unanswered handshake leaves `connect()` pending
    /// forever once the retry budget is spent. With a timeout configured,
    /// `connect()` instead rejects with
    /// [`FramelinkError::HandshakeTimeout`].
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Establish the session.
    ///
    /// Resolves once a validated `handshake-reply` arrives from the
    /// expected origin. A validated message of any other kind during the
    /// handshake is a terminal [`FramelinkError::HandshakeFailed`].
    ///
    /// Without a configured [`handshake_timeout`](Self::handshake_timeout),
    /// this future never resolves if the child never replies: after the
    /// attempt cap the retry timer self-cancels and the future stays
    /// pending on inbound traffic.
    pub async fn connect(self) -> Result<HostSession> {
        match self.handshake_timeout {
            None => self.run().await,
            Some(limit) => match tokio::time::timeout(limit, self.run()).await {
                Ok(result) => result,
                Err(_) => Err(FramelinkError::HandshakeTimeout),
            },
        }
    }

    async fn run(self) -> Result<HostSession> {
        let mut rx = self.transport.subscribe();

        tracing::debug!(url = %self.url, "Host: loading frame");
        self.frame.navigate(&self.url).await?;

        let expected = resolve_origin(&self.url, &self.local_origin);
        let policy = OriginPolicy::Exact(expected.clone());
        let snapshot = self.model.snapshot();

        let mut ticker = interval(self.retry_interval);
        let mut attempt = 0u32;

        loop {
            tokio::select! {
                _ = ticker.tick(), if attempt < self.max_handshake_attempts => {
                    attempt += 1;
                    tracing::debug!(attempt, origin = %expected, "Host: sending handshake");
                    let wire = self
                        .codec
                        .encode_outgoing(Envelope::handshake(snapshot.clone()).to_value());
                    self.transport.post(wire, &expected)?;
                }
                inbound = rx.recv() => {
                    let msg = inbound.ok_or(FramelinkError::ChannelClosed)?;
                    let decoded = match self.codec.decode_incoming(msg.data) {
                        Ok(value) => value,
                        Err(_) => continue,
                    };
                    let msg = Inbound { origin: msg.origin, data: decoded };
                    let envelope = match sanitize(&msg, &policy) {
                        Verdict::Accepted(envelope) => envelope,
                        Verdict::Rejected => continue,
                    };
                    match envelope.kind {
                        Kind::HandshakeReply => {
                            // The peer origin for all subsequent traffic is
                            // the one reported by the reply, not the one
                            // computed from the URL.
                            tracing::debug!(origin = %msg.origin, "Host: received handshake reply");
                            return Ok(HostSession::establish(
                                self.transport,
                                self.codec,
                                self.frame,
                                msg.origin,
                                rx,
                            ));
                        }
                        kind => {
                            tracing::debug!(?kind, "Host: invalid handshake reply");
                            return Err(FramelinkError::HandshakeFailed(format!(
                                "expected handshake-reply, got {:?}",
                                kind
                            )));
                        }
                    }
                }
            }
        }
    }
}
