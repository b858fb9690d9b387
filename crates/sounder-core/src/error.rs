//! Service and transport error types.

use thiserror::Error;
use tokio::task::JoinError;

/// Result alias for service-level outcomes.
pub type ServeResult<T = ()> = Result<T, ServeError>;

/// Errors a [`Transport`](crate::Transport) can report.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failure while binding, accepting, or serving.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An operation was attempted before [`open`](crate::Transport::open)
    /// succeeded.
    #[error("transport is not open")]
    NotOpen,

    /// The transport stopped producing peers.
    #[error("transport closed")]
    Closed,
}

/// The aggregate, first-error-wins outcome of a [`serve`](crate::serve) run.
///
/// Only service-level failures appear here. Per-connection errors are handled
/// (logged, link dropped) inside the owning task and never escape it.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The transport failed to bind or listen. Fatal, reported immediately.
    #[error("failed to open transport: {0}")]
    Open(#[source] TransportError),

    /// The transport failed to produce the next peer. Fatal: the acceptor
    /// loop stops and no further peers are accepted.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] TransportError),

    /// A connection task reported a failure of its own.
    #[error("connection task failed: {0}")]
    Task(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A connection task panicked or was aborted out from under the group.
    #[error("connection task panicked: {0}")]
    Panicked(#[from] JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_display_includes_source() {
        let err = ServeError::Open(TransportError::NotOpen);
        assert_eq!(err.to_string(), "failed to open transport: transport is not open");
    }

    #[test]
    fn io_error_converts_into_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err = TransportError::from(io);
        assert!(matches!(err, TransportError::Io(_)));
    }
}
