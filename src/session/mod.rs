//! Established sessions.
//!
//! Once a handshake completes, each side holds a session facet backed by
//! the same validated-envelope channel: the host side exposes
//! `get`/`call`/`on`/`destroy`, the child side exposes `emit` and serves
//! inbound requests against its capability table.

mod child;
mod host;

pub use child::ChildSession;
pub use host::{EventCallback, HostSession};
