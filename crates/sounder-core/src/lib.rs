//! Connection-acceptance supervision.
//!
//! This crate decouples *accepting* connections from *handling* them and runs
//! both under one cancellable task group, so that a fault or shutdown signal
//! anywhere tears the whole service down cleanly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 serve()                       │
//! │                                               │
//! │  ┌──────────┐   dispatch    ┌─────────────┐  │
//! │  │ acceptor  │──channel────►│ task group   │  │
//! │  │ (connect) │              │ (JoinSet)    │  │
//! │  └─────┬────┘               └──────┬──────┘  │
//! │        │                          │          │
//! │        └───── CancellationToken ──┘          │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The acceptor asks the [`Transport`] for the next peer, wraps it into a
//! [`Task`] via [`Transport::respond`], and hands it to the group over a
//! bounded channel. Every await is raced against the shared
//! [`CancellationToken`], which any task may trigger to unwind the whole
//! service. The group outcome is first-error-wins: the first failing
//! participant cancels the rest and becomes the single returned error.
//!
//! # Module Overview
//!
//! - [`error`]: service and transport error types
//! - [`race`]: cancellation-aware race combinator
//! - [`supervisor`]: the accept/dispatch loop ([`serve`])
//! - [`task`]: the per-peer unit of work ([`Task`])
//! - [`transport`]: the capability seam ([`Transport`])
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod error;
pub mod race;
pub mod supervisor;
pub mod task;
pub mod transport;

pub use error::{ServeError, ServeResult, TransportError};
pub use race::until_cancelled;
pub use supervisor::serve;
pub use task::Task;
pub use transport::Transport;
