//! Cancellation-aware racing.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Race `op` against `shutdown`, returning `None` if cancellation wins.
///
/// The race is biased toward the token: a result that completes after the
/// signal is already set is discarded rather than forwarded, so a slow or
/// stale operation cannot leak state past shutdown.
pub async fn until_cancelled<F>(shutdown: &CancellationToken, op: F) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = shutdown.cancelled() => None,
        out = op => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completion_wins_when_not_cancelled() {
        let token = CancellationToken::new();
        let out = until_cancelled(&token, async { 7 }).await;
        assert_eq!(out, Some(7));
    }

    #[tokio::test]
    async fn pre_set_token_discards_even_ready_results() {
        let token = CancellationToken::new();
        token.cancel();
        let out = until_cancelled(&token, async { 7 }).await;
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn cancellation_unblocks_a_pending_operation() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move { trigger.cancel() });
        let out = until_cancelled(&token, std::future::pending::<()>()).await;
        assert_eq!(out, None);
    }
}
