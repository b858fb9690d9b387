//! sounderd — a supervised line-echo daemon.
//!
//! Two transports plug into the `sounder-core` supervisor:
//!
//! - [`tcp`]: the real protocol. Newline-delimited text; every line is echoed
//!   back verbatim, except the reserved `halt` command, which shuts the whole
//!   service down.
//! - [`http`]: a minimal HTTP/1 listener answering `GET /` with `ready`.
//!
//! The binary in `src/main.rs` owns only process setup: flag parsing, log
//! initialization, signal wiring, and transport selection.

pub mod config;
pub mod http;
pub mod tcp;
