//! The accept/dispatch loop and its cancellable task group.

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ServeError, ServeResult};
use crate::race::until_cancelled;
use crate::task::Task;
use crate::transport::Transport;

/// Run `transport` under a cancellable task group until it fails or the
/// shared token fires.
///
/// One acceptor task drives [`Transport::connect`]; every accepted peer is
/// wrapped via [`Transport::respond`] and spawned into the same group. The
/// dispatch channel closing is the sole termination signal for the consumer
/// side. The outcome is first-error-wins: the first failing participant
/// cancels everyone else, whose own results are then discarded.
///
/// # Errors
///
/// Returns the first service-level failure: a transport that would not open,
/// an accept attempt that failed, a task that failed, or a task that
/// panicked. Cancellation (external or via a task pulling the trigger) is a
/// clean shutdown, not an error.
pub async fn serve<T>(shutdown: CancellationToken, transport: T) -> ServeResult
where
    T: Transport,
{
    let mut group: JoinSet<ServeResult> = JoinSet::new();
    let (dispatch, mut accepted) = mpsc::channel::<Task>(1);
    group.spawn(accept_loop(shutdown.clone(), transport, dispatch));

    let mut outcome: ServeResult = Ok(());
    loop {
        tokio::select! {
            task = accepted.recv() => match task {
                Some(task) => {
                    group.spawn(task.run(shutdown.clone()));
                },
                // Acceptor gone; everything that will ever run is in the group.
                None => break,
            },
            Some(joined) = group.join_next() => settle(&mut outcome, &shutdown, joined),
        }
    }

    while let Some(joined) = group.join_next().await {
        settle(&mut outcome, &shutdown, joined);
    }
    outcome
}

/// Fold one participant's result into the aggregate outcome.
fn settle(
    outcome: &mut ServeResult,
    shutdown: &CancellationToken,
    joined: Result<ServeResult, JoinError>,
) {
    let result = joined.unwrap_or_else(|panic| Err(ServeError::Panicked(panic)));
    if let Err(err) = result {
        shutdown.cancel();
        if outcome.is_ok() {
            *outcome = Err(err);
        } else {
            debug!(error = %err, "discarding error after the first");
        }
    }
}

/// Accept peers and hand their tasks to the dispatch channel.
///
/// Every await races against the shared token, so neither a blocking accept
/// nor a task handoff can stall shutdown. A connect failure aborts the loop
/// without dispatching anything for the failed attempt.
async fn accept_loop<T>(
    shutdown: CancellationToken,
    mut transport: T,
    dispatch: mpsc::Sender<Task>,
) -> ServeResult
where
    T: Transport,
{
    transport.open().await.map_err(ServeError::Open)?;
    loop {
        let peer = match until_cancelled(&shutdown, transport.connect()).await {
            None => return Ok(()),
            Some(Err(err)) => return Err(ServeError::Accept(err)),
            Some(Ok(peer)) => peer,
        };
        let task = transport.respond(peer);
        match until_cancelled(&shutdown, dispatch.send(task)).await {
            None | Some(Err(_)) => return Ok(()),
            Some(Ok(())) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::error::TransportError;

    /// Peer value whose task pulls the shared cancellation trigger.
    const HALT_PEER: u32 = 99;
    /// Peer value whose task fails.
    const FAIL_PEER: u32 = 666;

    struct MockTransport {
        fail_open: bool,
        feed: mpsc::UnboundedReceiver<Result<u32, TransportError>>,
        handled: mpsc::UnboundedSender<u32>,
    }

    fn mock() -> (
        MockTransport,
        mpsc::UnboundedSender<Result<u32, TransportError>>,
        mpsc::UnboundedReceiver<u32>,
    ) {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let (handled_tx, handled_rx) = mpsc::unbounded_channel();
        let transport = MockTransport {
            fail_open: false,
            feed: feed_rx,
            handled: handled_tx,
        };
        (transport, feed_tx, handled_rx)
    }

    #[async_trait]
    impl Transport for MockTransport {
        type Peer = u32;

        async fn open(&mut self) -> Result<(), TransportError> {
            if self.fail_open {
                Err(TransportError::NotOpen)
            } else {
                Ok(())
            }
        }

        async fn connect(&mut self) -> Result<u32, TransportError> {
            match self.feed.recv().await {
                Some(next) => next,
                // Feed exhausted: behave like a quiet listener.
                None => std::future::pending().await,
            }
        }

        fn respond(&self, peer: u32) -> Task {
            let handled = self.handled.clone();
            Task::new(move |shutdown| async move {
                match peer {
                    HALT_PEER => {
                        shutdown.cancel();
                        Ok(())
                    },
                    FAIL_PEER => Err(ServeError::Task("mock task failure".into())),
                    _ => {
                        handled.send(peer).expect("test observer dropped");
                        Ok(())
                    },
                }
            })
        }
    }

    #[tokio::test]
    async fn open_failure_is_the_service_outcome() {
        let (mut transport, _feed, _handled) = mock();
        transport.fail_open = true;

        let err = serve(CancellationToken::new(), transport)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Open(TransportError::NotOpen)));
    }

    #[tokio::test]
    async fn connect_error_terminates_without_dispatching() {
        let (transport, feed, mut handled) = mock();
        feed.send(Err(TransportError::Closed)).unwrap();

        let err = serve(CancellationToken::new(), transport)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Accept(TransportError::Closed)));
        assert!(handled.try_recv().is_err());
    }

    #[tokio::test]
    async fn accepted_peers_run_as_concurrent_tasks() {
        let (transport, feed, mut handled) = mock();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(shutdown.clone(), transport));

        feed.send(Ok(1)).unwrap();
        feed.send(Ok(2)).unwrap();
        let mut seen = vec![handled.recv().await.unwrap(), handled.recv().await.unwrap()];
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn external_cancellation_is_a_clean_shutdown() {
        let (transport, _feed, _handled) = mock();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        serve(shutdown, transport).await.unwrap();
    }

    #[tokio::test]
    async fn task_failure_wins_the_aggregate_and_cancels_the_rest() {
        let (transport, feed, _handled) = mock();
        let shutdown = CancellationToken::new();
        feed.send(Ok(FAIL_PEER)).unwrap();

        let err = serve(shutdown.clone(), transport).await.unwrap_err();
        assert!(matches!(err, ServeError::Task(_)));
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn task_triggered_halt_unwinds_cleanly() {
        let (transport, feed, _handled) = mock();
        let shutdown = CancellationToken::new();
        feed.send(Ok(HALT_PEER)).unwrap();

        serve(shutdown.clone(), transport).await.unwrap();
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn no_peers_are_accepted_after_a_connect_failure() {
        let (transport, feed, mut handled) = mock();
        feed.send(Ok(1)).unwrap();
        feed.send(Err(TransportError::Closed)).unwrap();
        feed.send(Ok(3)).unwrap();

        let err = serve(CancellationToken::new(), transport)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Accept(TransportError::Closed)));

        // The peer accepted before the failure still ran; the one queued
        // behind the failure was never dispatched.
        let seen: Vec<u32> = std::iter::from_fn(|| handled.try_recv().ok()).collect();
        assert_eq!(seen, vec![1]);
    }
}
