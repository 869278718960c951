//! The submission endpoint.

use crate::pipeline::{SubmissionResponse, INVALID_BODY, RATE_LIMITED_BODY};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

/// POST / — run the request body through the submission pipeline.
///
/// Responses are plain text with three shapes: 503 when the rate gate fires,
/// 400 when the body never decodes into an image, and 200 with a per-stage
/// summary for everything else.
pub async fn submit_image(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let source_ip = source_ip(&headers, addr);

    match state.pipeline.handle(&body, &source_ip).await {
        SubmissionResponse::RateLimited => text_response(
            StatusCode::SERVICE_UNAVAILABLE,
            RATE_LIMITED_BODY.to_string(),
        ),
        SubmissionResponse::InvalidBody => {
            text_response(StatusCode::BAD_REQUEST, INVALID_BODY.to_string())
        }
        SubmissionResponse::Completed(summary) => text_response(StatusCode::OK, summary),
    }
}

/// First hop of `X-Forwarded-For` when a proxy set it, the peer address
/// otherwise.
fn source_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn text_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/html")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "192.0.2.1:4242".parse().unwrap()
    }

    #[test]
    fn test_source_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());

        assert_eq!(source_ip(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn test_source_ip_takes_first_hop_of_forwarded_chain() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1, 10.0.0.2".parse().unwrap(),
        );

        assert_eq!(source_ip(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn test_source_ip_falls_back_to_peer_address() {
        assert_eq!(source_ip(&HeaderMap::new(), peer()), "192.0.2.1");
    }

    #[test]
    fn test_source_ip_ignores_empty_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());

        assert_eq!(source_ip(&headers, peer()), "192.0.2.1");
    }
}
