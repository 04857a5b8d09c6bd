//! Embedded-frame collaborator.
//!
//! Creating, styling, and inserting the actual frame element belongs to
//! the embedding environment. The handshake initiator only needs to
//! navigate the frame and learn when it has loaded, and teardown only
//! needs to detach it.

use crate::error::Result;
use crate::model::BoxFuture;

/// The frame the host loads the child into.
pub trait Frame: Send + Sync + 'static {
    /// Navigate the frame to the given URL. The returned future resolves
    /// when the frame signals load completion.
    fn navigate(&self, url: &str) -> BoxFuture<'static, Result<()>>;

    /// Detach the frame from its container. Called once, at teardown.
    fn detach(&self);
}

/// No-op frame for transports that are already connected (tests,
/// same-process embeddings, workers).
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedFrame;

impl Frame for DetachedFrame {
    fn navigate(&self, _url: &str) -> BoxFuture<'static, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn detach(&self) {}
}
