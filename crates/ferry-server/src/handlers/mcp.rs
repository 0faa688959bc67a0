use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use ferry_core::auth::{presented_from_headers, query_token};
use ferry_core::endpoint::{endpoint_event_data, messages_url, ForwardingHeaders, ENDPOINT_EVENT};
use ferry_core::session::{Frame, SessionStream};
use ferry_mcp::web::{authorize, reject, sse_response};

use crate::app_state::AppState;

/// SSE handshake.
///
/// 1. Server sends `event: endpoint` with `{"messages": "<absolute POST URL>"}`
/// 2. Client POSTs JSON-RPC to that URL and reads the response body
/// 3. The stream carries only keepalive comments until the client leaves
pub async fn mcp_sse(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let token_param = query_token(query.as_deref());
    let token_param = token_param.as_deref();
    if state.config.require_auth {
        if let Err(err) = authorize(&state.guard, &headers, token_param) {
            return reject(&err);
        }
    }

    let url = match messages_url(
        &state.config.endpoint,
        &ForwardingHeaders::from_headers(&headers),
        token_param,
    ) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(error = %err, "cannot resolve messages URL");
            return reject(&err);
        }
    };
    tracing::debug!(messages = %url, "advertising messages URL");

    let session = SessionStream::open(
        vec![Frame::event(ENDPOINT_EVENT, endpoint_event_data(&url))],
        state.config.endpoint.keepalive,
        presented_from_headers(&headers, token_param).map(str::to_string),
    );
    if let Some(watch) = &state.session_watch {
        let _ = watch.send(session.closed());
    }

    sse_response(session)
}

/// Handle one JSON-RPC request; the response envelope is the HTTP body.
///
/// JSON-RPC level failures are still HTTP 200.
pub async fn mcp_request(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.config.require_auth {
        let token_param = query_token(query.as_deref());
        if let Err(err) = authorize(&state.guard, &headers, token_param.as_deref()) {
            return reject(&err);
        }
    }

    let response = state.dispatcher.handle(&body).await;
    Json(response).into_response()
}

/// Liveness probe on the messages path.
pub async fn mcp_liveness() -> StatusCode {
    StatusCode::OK
}
