//! Command-line flags and derived settings.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::http::HttpConfig;

/// Process-level flags for the daemon.
#[derive(Debug, Parser)]
#[command(name = "sounderd", version, about = "Supervised line-echo daemon")]
pub struct Flags {
    /// Bind to interface `[ADDR]:PORT` (omit ADDR to listen on all interfaces)
    #[arg(
        short = 'l',
        long = "listen",
        value_name = "[ADDR]:PORT",
        default_value = "0.0.0.0:8080",
        value_parser = parse_bind
    )]
    pub bind: SocketAddr,

    /// Serve with protocol PROTO
    #[arg(short = 'p', long = "proto", value_enum, default_value_t = Proto::Tcp)]
    pub proto: Proto,

    /// Enable additional, verbose logging (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Timeout for handling one HTTP request, in milliseconds (http only)
    #[arg(long = "http-timeout-ms", value_name = "MS", default_value_t = 5_000)]
    pub http_timeout_ms: u64,

    /// Timeout for reading HTTP request headers, in milliseconds (http only)
    #[arg(long = "http-header-timeout-ms", value_name = "MS", default_value_t = 1_000)]
    pub http_header_timeout_ms: u64,
}

impl Flags {
    /// Settings for the HTTP transport variant.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_millis(self.http_timeout_ms),
            header_timeout: Duration::from_millis(self.http_header_timeout_ms),
        }
    }

    /// Default log filter for the verbosity counter; `RUST_LOG` overrides it.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Listener protocol selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Proto {
    /// Newline-delimited echo protocol over raw TCP.
    Tcp,
    /// Minimal HTTP/1 readiness listener.
    Http,
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Http => f.write_str("http"),
        }
    }
}

/// Accept `ADDR:PORT` or the `:PORT` shorthand for all interfaces.
fn parse_bind(raw: &str) -> Result<SocketAddr, String> {
    let full;
    let addr = if raw.starts_with(':') {
        full = format!("0.0.0.0{raw}");
        full.as_str()
    } else {
        raw
    };
    addr.parse()
        .map_err(|err| format!("invalid bind address {raw:?}: {err}"))
}
