//! The proxy server: accept loop, per-request routing and forwarding

use crate::config::Config;
use crate::forward::forward;
use crate::response::{text_response, ProxyBody};
use crate::router::{route, RouteDecision};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// The reverse proxy server
pub struct ProxyServer {
    bind_addr: SocketAddr,
    config: Arc<Config>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ProxyServer {
    pub fn new(
        bind_addr: SocketAddr,
        config: Arc<Config>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            bind_addr,
            config,
            shutdown_rx,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, host = %self.config.host, "Proxy server listening");

        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let config = Arc::clone(&self.config);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, config).await {
                                    debug!(addr = %addr, error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                changed = shutdown_rx.changed() => {
                    // A dropped sender counts as shutdown
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Proxy server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(stream: TcpStream, config: Arc<Config>) -> anyhow::Result<()> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let config = Arc::clone(&config);
        async move { handle_request(req, config).await }
    });

    // When the client closes the connection, hyper drops the in-flight
    // service future, which cancels any pending backend request with it
    hyper::server::conn::http1::Builder::new()
        .preserve_header_case(true)
        .serve_connection(io, service)
        .await
        .map_err(|e| anyhow::anyhow!("Connection error: {}", e))?;

    Ok(())
}

/// Classify the request and either answer it directly or forward it.
/// Every path produces exactly one response.
async fn handle_request(
    req: Request<Incoming>,
    config: Arc<Config>,
) -> Result<Response<ProxyBody>, hyper::Error> {
    let host_header = req
        .headers()
        .get(hyper::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_default();

    debug!(host = %host_header, method = %req.method(), uri = %req.uri(), "Incoming request");

    match route(&config, &host_header) {
        RouteDecision::Home => Ok(text_response(StatusCode::OK, &config.messages.home)),
        RouteDecision::Invalid => Ok(text_response(
            StatusCode::BAD_REQUEST,
            &config.messages.invalid,
        )),
        RouteDecision::Forward(port) => match forward(req, port).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_down() => {
                debug!(host = %host_header, port, "Backend is down");
                Ok(text_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    &config.messages.down,
                ))
            }
            Err(e) => {
                error!(host = %host_header, port, error = %e, "Failed to forward request");
                Ok(text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &config.messages.error,
                ))
            }
        },
    }
}
