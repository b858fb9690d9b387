//! HTTP transport: a minimal readiness listener.
//!
//! Serves each accepted connection with hyper's HTTP/1 stack. `GET /`
//! answers `200 OK` with the body `ready`; every other path is a 404. The
//! header timeout bounds header reading at the connection level; the request
//! timeout bounds handling and answers 408 when it expires. Per-connection
//! failures are logged and never escalate to the service outcome.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use sounder_core::{until_cancelled, ServeResult, Task, Transport, TransportError};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timeouts for the HTTP variant.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// Bound on handling one request.
    pub timeout: Duration,
    /// Bound on reading a request's headers.
    pub header_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            header_timeout: Duration::from_secs(1),
        }
    }
}

/// One accepted, not-yet-served connection.
#[derive(Debug)]
pub struct HttpPeer {
    stream: TcpStream,
    addr: SocketAddr,
}

/// HTTP/1 listener.
pub struct HttpTransport {
    bind: SocketAddr,
    config: HttpConfig,
    listener: Option<TcpListener>,
}

impl HttpTransport {
    #[must_use]
    pub fn new(bind: SocketAddr, config: HttpConfig) -> Self {
        Self {
            bind,
            config,
            listener: None,
        }
    }

    /// Adopt an already-bound listener, e.g. one on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub fn from_listener(listener: TcpListener, config: HttpConfig) -> io::Result<Self> {
        Ok(Self {
            bind: listener.local_addr()?,
            config,
            listener: Some(listener),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    type Peer = HttpPeer;

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.listener.is_none() {
            self.listener = Some(TcpListener::bind(self.bind).await?);
        }
        info!(addr = %self.bind, proto = "http", "ready");
        Ok(())
    }

    async fn connect(&mut self) -> Result<HttpPeer, TransportError> {
        let listener = self.listener.as_ref().ok_or(TransportError::NotOpen)?;
        let (stream, addr) = listener.accept().await?;
        debug!(peer = %addr, "accepted");
        Ok(HttpPeer { stream, addr })
    }

    fn respond(&self, peer: HttpPeer) -> Task {
        let config = self.config;
        Task::new(move |shutdown| serve_connection(shutdown, config, peer))
    }
}

/// Serve one connection until it finishes or the service shuts down.
async fn serve_connection(
    shutdown: CancellationToken,
    config: HttpConfig,
    peer: HttpPeer,
) -> ServeResult {
    let HttpPeer { stream, addr } = peer;
    let service = service_fn(move |request| handle(request, config.timeout));
    let connection = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(config.header_timeout)
        .serve_connection(TokioIo::new(stream), service);

    debug!(peer = %addr, "http connect");
    match until_cancelled(&shutdown, connection).await {
        None => debug!(peer = %addr, "http connection cancelled"),
        Some(Ok(())) => debug!(peer = %addr, "http disconnect"),
        Some(Err(err)) => warn!(peer = %addr, error = %err, "http connection failed"),
    }
    Ok(())
}

async fn handle(
    request: Request<Incoming>,
    timeout: Duration,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match tokio::time::timeout(timeout, route(request)).await {
        Ok(response) => response,
        Err(_) => Ok(status(StatusCode::REQUEST_TIMEOUT)),
    }
}

/// `GET /` answers `ready`; the root pattern matches nothing else.
async fn route(request: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    if request.uri().path() != "/" {
        return Ok(status(StatusCode::NOT_FOUND));
    }
    Ok(Response::new(Full::new(Bytes::from_static(b"ready"))))
}

fn status(code: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = code;
    response
}
