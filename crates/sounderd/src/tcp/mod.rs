//! TCP transport: the real line-echo protocol.
//!
//! Newline-delimited text. Any line whose trimmed form is not the reserved
//! `halt` command is written back to the sender unmodified, trailing newline
//! and internal whitespace included. The `halt` line produces no response;
//! it triggers service-wide shutdown and closes the link that sent it.

mod engine;
mod link;

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use sounder_core::{Task, Transport, TransportError};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// One accepted, not-yet-handled connection.
#[derive(Debug)]
pub struct TcpPeer {
    pub(crate) stream: TcpStream,
    pub(crate) addr: SocketAddr,
}

/// Byte-stream listener speaking the line-echo protocol.
pub struct TcpTransport {
    bind: SocketAddr,
    listener: Option<TcpListener>,
}

impl TcpTransport {
    #[must_use]
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            listener: None,
        }
    }

    /// Adopt an already-bound listener, e.g. one on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub fn from_listener(listener: TcpListener) -> io::Result<Self> {
        Ok(Self {
            bind: listener.local_addr()?,
            listener: Some(listener),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Peer = TcpPeer;

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.listener.is_none() {
            self.listener = Some(TcpListener::bind(self.bind).await?);
        }
        info!(addr = %self.bind, proto = "tcp", "ready");
        Ok(())
    }

    async fn connect(&mut self) -> Result<TcpPeer, TransportError> {
        let listener = self.listener.as_ref().ok_or(TransportError::NotOpen)?;
        let (stream, addr) = listener.accept().await?;
        debug!(peer = %addr, "accepted");
        Ok(TcpPeer { stream, addr })
    }

    fn respond(&self, peer: TcpPeer) -> Task {
        Task::new(move |shutdown| engine::drive(shutdown, peer))
    }
}
