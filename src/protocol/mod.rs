//! Protocol layer: the wire envelope, the inbound-message validator,
//! and the correlation-id source.
//!
//! Everything that crosses the transport is an [`Envelope`]. Everything
//! that arrives from the transport passes through [`sanitize`] before any
//! session state may change.

mod correlation;
mod envelope;
mod validate;

pub use correlation::IdSource;
pub use envelope::{Envelope, Kind, MESSAGE_TYPE};
pub use validate::{sanitize, OriginPolicy, Verdict};
