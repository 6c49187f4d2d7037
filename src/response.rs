//! Plain-text responses for requests the proxy answers itself

use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Body type shared by synthesized and proxied responses
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Build a `text/plain` response carrying the message plus a trailing
/// newline
pub fn text_response(status: StatusCode, message: &str) -> Response<ProxyBody> {
    let mut body = String::with_capacity(message.len() + 1);
    body.push_str(message);
    body.push('\n');

    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "text/plain")
        .body(
            Full::new(Bytes::from(body))
                .map_err(|never| match never {})
                .boxed(),
        )
        .expect("valid response with StatusCode enum and static header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_response_shape() {
        let response = text_response(StatusCode::OK, "This is the home page.");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(hyper::header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"This is the home page.\n");
    }

    #[tokio::test]
    async fn test_text_response_appends_single_newline() {
        let response = text_response(StatusCode::BAD_REQUEST, "nope");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"nope\n");
    }
}
