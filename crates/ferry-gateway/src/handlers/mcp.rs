use axum::{
    body::{Body, Bytes},
    extract::{RawQuery, State},
    http::header::{ACCEPT, CONNECTION, CONTENT_TYPE},
    http::{HeaderMap, HeaderName, StatusCode},
    response::Response,
};

use ferry_core::auth::{presented_from_headers, query_token};
use ferry_core::endpoint::{endpoint_event_data, messages_url, ForwardingHeaders, ENDPOINT_EVENT};
use ferry_core::session::{Frame, SessionStream};
use ferry_mcp::dispatch::initialize_result;
use ferry_mcp::web::{authorize, reject, sse_response};

use crate::app_state::GatewayState;

/// SSE event carrying the gateway's `initialize`-shaped greeting.
pub const HELLO_EVENT: &str = "hello";

/// Headers that describe a single connection and are never relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// SSE handshake served entirely by the gateway.
///
/// Sends the endpoint event, then a hello event, then keepalive comments.
pub async fn handshake(
    State(state): State<GatewayState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let token_param = query_token(query.as_deref());
    let token_param = token_param.as_deref();
    if let Err(err) = authorize(&state.guard, &headers, token_param) {
        return reject(&err);
    }

    let url = match messages_url(
        &state.config.endpoint,
        &ForwardingHeaders::from_headers(&headers),
        token_param,
    ) {
        Ok(url) => url,
        Err(err) => return reject(&err),
    };
    tracing::debug!(messages = %url, "advertising messages URL");

    let hello = initialize_result(&state.server_info).to_string();
    let session = SessionStream::open(
        vec![
            Frame::event(ENDPOINT_EVENT, endpoint_event_data(&url)),
            Frame::event(HELLO_EVENT, hello),
        ],
        state.config.endpoint.keepalive,
        presented_from_headers(&headers, token_param).map(str::to_string),
    );

    sse_response(session)
}

/// Relay one JSON-RPC POST to the dispatcher.
pub async fn proxy(
    State(state): State<GatewayState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let token_param = query_token(query.as_deref());
    let presented = presented_from_headers(&headers, token_param.as_deref());
    if let Err(err) = state.guard.check(presented) {
        return reject(&err);
    }

    let accept = headers.get(ACCEPT).cloned();
    let content_type = headers.get(CONTENT_TYPE).cloned();
    match state
        .upstream
        .forward(body, presented, accept, content_type)
        .await
    {
        Ok(upstream) => relay(upstream),
        Err(err) => reject(&err),
    }
}

/// Liveness probe on the messages path. No auth, no upstream contact.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    tracing::debug!(status = status.as_u16(), "relaying upstream response");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
