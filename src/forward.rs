//! Per-request forwarding to a local backend
//!
//! Each forward opens one fresh connection to `127.0.0.1:<port>` and
//! relays the request verbatim; there is no connection reuse and no
//! retry. Bodies stream through in both directions without being
//! buffered.

use crate::response::ProxyBody;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

/// Failure modes of a single backend attempt
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Nothing is listening on the backend port
    #[error("backend on port {port} refused the connection")]
    Refused { port: u16 },

    /// The connection could not be established for another reason
    #[error("failed to connect to backend on port {port}: {source}")]
    Connect {
        port: u16,
        source: std::io::Error,
    },

    /// The backend accepted the connection but the exchange failed
    /// (reset, protocol violation, premature close)
    #[error("backend request on port {port} failed: {source}")]
    Upstream { port: u16, source: hyper::Error },
}

impl ForwardError {
    /// True when the backend is down (connection refused) rather than
    /// misbehaving
    pub fn is_down(&self) -> bool {
        matches!(self, ForwardError::Refused { .. })
    }
}

/// Forward the request to `127.0.0.1:<port>` and stream back the
/// backend's response. Method, path, and headers pass through verbatim.
pub async fn forward<B>(req: Request<B>, port: u16) -> Result<Response<ProxyBody>, ForwardError>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                ForwardError::Refused { port }
            } else {
                ForwardError::Connect { port, source: e }
            }
        })?;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::Builder::new()
        .preserve_header_case(true)
        .handshake(io)
        .await
        .map_err(|e| ForwardError::Upstream { port, source: e })?;

    // Drive the connection; this task ends once the exchange completes or
    // the request future is dropped on client abort
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(port, error = %e, "Backend connection ended");
        }
    });

    let outbound = to_origin_form(req);

    let response = sender
        .send_request(outbound)
        .await
        .map_err(|e| ForwardError::Upstream { port, source: e })?;

    Ok(response.map(|body| body.boxed()))
}

/// Rewrite the request target to origin form (path and query only), as
/// expected by a backend server. Method, headers, and body are untouched.
fn to_origin_form<B>(req: Request<B>) -> Request<B> {
    let (mut parts, body) = req.into_parts();

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    parts.uri = path.parse().expect("valid origin-form URI from path and query");

    Request::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Empty;
    use hyper::body::Bytes;

    fn empty_request(uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .unwrap()
    }

    #[test]
    fn test_origin_form_keeps_path_and_query() {
        let req = to_origin_form(empty_request("http://example.com/a/b?x=1"));
        assert_eq!(req.uri().to_string(), "/a/b?x=1");
    }

    #[test]
    fn test_origin_form_defaults_to_root() {
        let req = to_origin_form(empty_request("http://example.com"));
        assert_eq!(req.uri().to_string(), "/");
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_down() {
        // Bind then drop to find a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = forward(empty_request("/"), port).await.unwrap_err();
        assert!(err.is_down());
        assert!(matches!(err, ForwardError::Refused { .. }));
    }

    #[tokio::test]
    async fn test_reset_after_accept_is_not_down() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept and immediately close without responding
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let err = forward(empty_request("/"), port).await.unwrap_err();
        assert!(!err.is_down());
    }
}
