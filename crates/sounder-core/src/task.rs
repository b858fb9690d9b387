//! The per-peer unit of work.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::ServeResult;

/// A unit of work built for one accepted peer.
///
/// Created by [`Transport::respond`](crate::Transport::respond) and consumed
/// exactly once by the supervisor's task group. The shared token handed in at
/// dispatch time is both the shutdown signal (`cancelled()`) and the trigger
/// (`cancel()`) a task may pull to unwind the whole service.
pub struct Task {
    run: Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, ServeResult> + Send>,
}

impl Task {
    /// Wrap a closure over the peer into a dispatchable task.
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ServeResult> + Send + 'static,
    {
        Self {
            run: Box::new(move |shutdown| Box::pin(run(shutdown))),
        }
    }

    /// Start the task with the service's shared cancellation token.
    pub fn run(self, shutdown: CancellationToken) -> BoxFuture<'static, ServeResult> {
        (self.run)(shutdown)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn task_receives_the_dispatch_token() {
        let token = CancellationToken::new();
        token.cancel();
        let task = Task::new(|shutdown: CancellationToken| async move {
            assert!(shutdown.is_cancelled());
            Ok(())
        });
        task.run(token).await.unwrap();
    }
}
