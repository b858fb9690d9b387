//! The capability seam between the supervisor and a concrete listener.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::task::Task;

/// A source of peers and the work to perform for each of them.
///
/// Implementations own the listener; the supervisor owns the lifecycle. The
/// variant to serve is selected once at startup, then
/// [`serve`](crate::serve) is monomorphized over it — no dispatch on the
/// accept path.
#[async_trait]
pub trait Transport: Send + 'static {
    /// An accepted, not-yet-handled connection handle.
    type Peer: Send + 'static;

    /// Bind and listen. A failure here is fatal for the whole service.
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Produce the next accepted peer.
    ///
    /// A failure here is also fatal: the acceptor loop stops without
    /// dispatching anything for the failed attempt.
    async fn connect(&mut self) -> Result<Self::Peer, TransportError>;

    /// Build the unit of work for an accepted peer.
    ///
    /// Ownership of the peer transfers into the returned [`Task`] for its
    /// lifetime.
    fn respond(&self, peer: Self::Peer) -> Task;
}
