//! # framelink
//!
//! Bidirectional request/response and event channel between two isolated
//! execution contexts - a **host** and an embedded **child** - over a
//! postMessage-style transport.
//!
//! Neither side has direct access to the other; everything is
//! asynchronous message passing over a channel that may also carry
//! unrelated and hostile traffic. The crate owns the protocol:
//!
//! - handshake negotiation with bounded retry (5 attempts, 500 ms apart)
//! - strict origin and envelope validation, with silent discard of
//!   everything that fails it
//! - correlation ids matching concurrent replies to their requests
//! - a capability table of values and producers, resolved uniformly
//! - one-way event emission with per-name listener dispatch
//!
//! The DOM frame and the concrete wire are external collaborators behind
//! the [`Frame`] and [`Transport`] traits; [`ChannelHub`] ships as an
//! in-memory transport for tests and same-process embeddings. A
//! [`Codec`] hook at the transport boundary supports end-to-end payload
//! transformation without the core knowing.
//!
//! ## Example
//!
//! ```ignore
//! use framelink::{Child, ChannelHub, Host, Model};
//! use serde_json::json;
//!
//! let (host_end, child_end) =
//!     ChannelHub::pair("https://host.example.com", "https://child.example.com");
//!
//! let child = tokio::spawn(
//!     Child::builder(child_end)
//!         .model(Model::new().with_value("height", json!(120)))
//!         .listen(),
//! );
//!
//! let session = Host::builder(host_end)
//!     .url("https://child.example.com/widget.html")
//!     .connect()
//!     .await?;
//!
//! assert_eq!(session.get("height").await?, json!(120));
//! session.destroy();
//! ```

pub mod codec;
pub mod frame;
pub mod model;
pub mod origin;
pub mod protocol;
pub mod transport;

mod child;
mod error;
mod host;
mod session;

pub use child::{Child, ChildBuilder};
pub use codec::{Codec, PlainCodec};
pub use error::{FramelinkError, Result};
pub use frame::{DetachedFrame, Frame};
pub use host::{Host, HostBuilder, DEFAULT_MAX_HANDSHAKE_ATTEMPTS, DEFAULT_RETRY_INTERVAL};
pub use model::{Capability, Model};
pub use session::{ChildSession, EventCallback, HostSession};
pub use transport::{ChannelEndpoint, ChannelHub, Inbound, Transport};
