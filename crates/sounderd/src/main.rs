//! sounderd — process entry point.
//!
//! Owns only process setup: flag parsing, log initialization, signal wiring,
//! and transport selection. All protocol work lives in the library crates.

use anyhow::Result;
use clap::Parser;
use sounder_core::serve;
use sounderd::config::{Flags, Proto};
use sounderd::http::HttpTransport;
use sounderd::tcp::TcpTransport;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let flags = Flags::parse();
    init_tracing(&flags);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %flags.bind,
        proto = %flags.proto,
        "starting sounderd"
    );

    let shutdown = CancellationToken::new();
    let server = match flags.proto {
        Proto::Tcp => tokio::spawn(serve(shutdown.clone(), TcpTransport::new(flags.bind))),
        Proto::Http => tokio::spawn(serve(
            shutdown.clone(),
            HttpTransport::new(flags.bind, flags.http_config()),
        )),
    };

    wait_for_shutdown(&shutdown).await?;
    shutdown.cancel();

    // Runtime failures are logged, never turned into an exit code.
    match server.await {
        Ok(Ok(())) => {},
        Ok(Err(err)) => error!(error = %err, "server error"),
        Err(err) => error!(error = %err, "server task panicked"),
    }
    Ok(())
}

/// Block until a termination signal arrives or the service cancels itself.
async fn wait_for_shutdown(shutdown: &CancellationToken) -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => info!(signal = "SIGINT", "closing all connections"),
        _ = terminate.recv() => info!(signal = "SIGTERM", "closing all connections"),
        () = shutdown.cancelled() => {},
    }
    Ok(())
}

fn init_tracing(flags: &Flags) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(flags.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
