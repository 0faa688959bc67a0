//! axum glue shared by the dispatcher and gateway binaries.

use std::convert::Infallible;

use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response, Sse};
use axum::Json;
use serde_json::Value;

use ferry_core::auth::{presented_from_headers, AuthGuard};
use ferry_core::session::{Frame, SessionStream};
use ferry_core::Error;

use crate::jsonrpc::JsonRpcResponse;

/// Disables response buffering in nginx-style proxies.
pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Check the token presented on a request.
///
/// # Errors
///
/// Returns the guard's error, see [`AuthGuard::check`].
pub fn authorize(
    guard: &AuthGuard,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<(), Error> {
    guard.check(presented_from_headers(headers, query_token))
}

/// JSON-RPC shaped rejection carrying the error's HTTP status, `id: null`.
pub fn reject(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(JsonRpcResponse::from_error(Value::Null, err))).into_response()
}

pub fn frame_to_event(frame: Frame) -> Event {
    match frame {
        Frame::Event { name, data } => Event::default().event(name).data(data),
        Frame::KeepAlive => Event::default().comment("keepalive"),
    }
}

/// Stream a session to the client as `text/event-stream`.
///
/// The session is dropped with the response body, which stops its keepalive.
pub fn sse_response(session: SessionStream) -> Response {
    tracing::info!(
        session = %session.id(),
        opened_at = %session.opened_at(),
        authenticated = session.token().is_some(),
        "SSE session streaming"
    );

    let stream = tokio_stream::StreamExt::map(session, |frame| {
        Ok::<_, Infallible>(frame_to_event(frame))
    });
    ([(X_ACCEL_BUFFERING, "no")], Sse::new(stream)).into_response()
}
