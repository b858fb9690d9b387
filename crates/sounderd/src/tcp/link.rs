//! Protocol-level wrapper around one accepted connection.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use super::TcpPeer;

/// One peer's stream with buffered line reading and idempotent teardown.
///
/// Owned exclusively by the task driving it; reads and writes are strictly
/// sequential, one line in flight at a time. The `closed` flag, once set, is
/// never reset.
pub(crate) struct Link {
    read: BufReader<OwnedReadHalf>,
    write: OwnedWriteHalf,
    peer: SocketAddr,
    closed: bool,
}

impl Link {
    pub(crate) fn new(peer: TcpPeer) -> Self {
        let TcpPeer { stream, addr } = peer;
        let (read, write) = stream.into_split();
        Self {
            read: BufReader::new(read),
            write,
            peer: addr,
            closed: false,
        }
    }

    /// Remote address, for diagnostics.
    pub(crate) const fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) const fn is_closed(&self) -> bool {
        self.closed
    }

    /// One buffered line read, trailing newline included.
    ///
    /// `Ok(None)` is a clean EOF. On an already-closed link this reports
    /// immediately without touching the stream.
    pub(crate) async fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "read on closed connection",
            ));
        }
        let mut line = String::new();
        let read = self.read.read_line(&mut line).await?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// Write `line` back to the peer verbatim.
    pub(crate) async fn send(&mut self, line: &str) -> io::Result<()> {
        self.write.write_all(line.as_bytes()).await?;
        self.write.flush().await
    }

    /// Tear the link down. Idempotent: the first call shuts the stream down
    /// and marks the link closed; every later call is a no-op.
    pub(crate) async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Best-effort FIN so a peer blocked on read observes the close.
        let _ = self.write.shutdown().await;
    }
}
