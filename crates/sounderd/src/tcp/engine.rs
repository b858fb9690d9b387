//! Per-connection protocol engine: one line in, one decision out.

use sounder_core::{until_cancelled, ServeResult};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::link::Link;
use super::TcpPeer;

/// Reserved input token that shuts the whole service down.
const HALT_COMMAND: &str = "halt";

#[derive(Debug, Error)]
enum EngineError {
    /// The peer asked for service-wide shutdown. A control signal, not a
    /// failure: the task still finishes with success.
    #[error("halt requested")]
    Halt,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Drive one link until it closes or the service shuts down.
///
/// Link-level failures are logged and close this link only; they never
/// escape as the task's result.
pub(crate) async fn drive(shutdown: CancellationToken, peer: TcpPeer) -> ServeResult {
    let mut link = Link::new(peer);
    info!(peer = %link.peer(), "connect");
    while !link.is_closed() {
        let read = until_cancelled(&shutdown, link.read_line()).await;
        match read {
            // Cancelled; any in-flight read result is discarded, not forwarded.
            None => link.close().await,
            Some(Ok(Some(line))) => match respond(&mut link, &line).await {
                Ok(()) => {},
                Err(EngineError::Halt) => {
                    warn!(peer = %link.peer(), "HALT: closing all connections");
                    shutdown.cancel();
                    link.close().await;
                },
                Err(EngineError::Io(err)) => {
                    error!(peer = %link.peer(), error = %err, "request failed");
                    link.close().await;
                },
            },
            Some(Ok(None)) => {
                debug!(peer = %link.peer(), "peer closed the connection");
                link.close().await;
            },
            Some(Err(err)) => {
                error!(peer = %link.peer(), error = %err, "read failed");
                link.close().await;
            },
        }
    }
    info!(peer = %link.peer(), "disconnect");
    Ok(())
}

/// Apply the control-command rule to one line; echo everything else verbatim.
async fn respond(link: &mut Link, line: &str) -> Result<(), EngineError> {
    let request = line.trim();
    if request == HALT_COMMAND {
        return Err(EngineError::Halt);
    }
    info!(peer = %link.peer(), request, "request");
    link.send(line).await?;
    Ok(())
}
