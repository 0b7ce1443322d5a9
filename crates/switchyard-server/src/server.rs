//! HTTP/1 transport for a [`Dispatcher`].
//!
//! Built on Hyper and Tokio. Each connection runs on its own task; each
//! request body is collected in full and the dispatch itself runs on a
//! blocking worker, since middleware and handlers are synchronous.
//!
//! # Example
//!
//! ```rust,no_run
//! use switchyard_core::{Context, Exchange};
//! use switchyard_server::Dispatcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dispatcher = Dispatcher::new();
//!     dispatcher.get("/hello/:name", |ex: &mut Exchange, ctx: &mut Context| {
//!         ex.write(format!("hello, {}", ctx.param("name")));
//!     });
//!
//!     dispatcher.listen(8080).await?.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use switchyard_telemetry::ConnectionGauge;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// A bound HTTP server.
///
/// Created by [`Server::bind`] or [`Dispatcher::listen`]; the socket is
/// bound on creation, connections are accepted once [`Server::run`] starts.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
}

/// Per-request timeouts copied into each connection task.
#[derive(Debug, Clone, Copy)]
struct RequestLimits {
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Server {
    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if the address does not parse
    /// and [`ServerError::Bind`] if it cannot be bound.
    pub async fn bind(config: ServerConfig, dispatcher: Dispatcher) -> Result<Self, ServerError> {
        let addr = config.socket_addr().map_err(|source| ServerError::InvalidAddress {
            addr: config.http_addr().to_string(),
            source,
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            addr = %local_addr,
            routes = dispatcher.router().len(),
            middleware = dispatcher.middleware().len(),
            "Server bound"
        );

        Ok(Self {
            listener,
            local_addr,
            dispatcher: Arc::new(dispatcher),
            config,
        })
    }

    /// The address actually bound, with the real port when `0` was asked for.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves until SIGTERM or Ctrl+C, then shuts down gracefully.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and skipped, so this returns `Ok` once
    /// shutdown completes.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Serves until `shutdown` is triggered.
    ///
    /// After the trigger no new connections are accepted, open connections
    /// finish their current request and close, and the call returns once
    /// they are gone or the shutdown timeout expires.
    ///
    /// # Errors
    ///
    /// See [`Server::run`].
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let Self {
            listener,
            local_addr,
            dispatcher,
            config,
        } = self;

        let limits = RequestLimits {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        };
        let tracker = ConnectionTracker::new();

        tracing::info!(addr = %local_addr, "Server listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let dispatcher = Arc::clone(&dispatcher);
                            let config = config.clone();
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                let _gauge = ConnectionGauge::open();
                                if let Err(e) = serve_connection(
                                    stream,
                                    dispatcher,
                                    &config,
                                    limits,
                                    shutdown,
                                )
                                .await
                                {
                                    tracing::debug!(
                                        remote = %remote_addr,
                                        error = %e,
                                        "Connection closed with error"
                                    );
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);

        let shutdown_timeout = config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_count(),
            timeout_secs = shutdown_timeout.as_secs_f64(),
            "Waiting for open connections"
        );

        tokio::select! {
            () = tracker.wait_idle() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_count(),
                    "Shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

async fn serve_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    config: &ServerConfig,
    limits: RequestLimits,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<_, Infallible>(handle_request(req, dispatcher, limits).await) }
    });

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_timeout())
        .max_buf_size(config.max_header_bytes());

    let conn = builder.serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    dispatcher: Arc<Dispatcher>,
    limits: RequestLimits,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let body = match tokio::time::timeout(limits.read_timeout, body.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to read request body");
            return text_response(StatusCode::BAD_REQUEST, "failed to read request body");
        }
        Err(_) => {
            tracing::warn!(path = parts.uri.path(), "Request body read timed out");
            return text_response(StatusCode::REQUEST_TIMEOUT, "request body read timed out");
        }
    };

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let request = Request::from_parts(parts, body);

    let work = tokio::task::spawn_blocking(move || dispatcher.dispatch(request));

    match tokio::time::timeout(limits.write_timeout, work).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::error!(
                method = %method,
                path = %path,
                panicked = e.is_panic(),
                error = %e,
                "Dispatch failed"
            );
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
        Err(_) => {
            // The blocking worker keeps running; only the response is abandoned.
            tracing::warn!(method = %method, path = %path, "Dispatch timed out");
            text_response(StatusCode::GATEWAY_TIMEOUT, "request timed out")
        }
    }
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
