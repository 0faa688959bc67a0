//! Plain REST probes that exercise the backend without a JSON-RPC client.

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use ferry_core::auth::{query_token, query_value};
use ferry_core::Error;
use ferry_mcp::tools::{FetchArgs, SearchArgs};
use ferry_mcp::web::authorize;

use crate::app_state::AppState;

fn respond(result: Result<Value, Error>) -> Response {
    match result {
        Ok(data) => Json(serde_json::json!({ "ok": true, "data": data })).into_response(),
        Err(err) => {
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(serde_json::json!({ "ok": false, "error": err.to_string() })))
                .into_response()
        }
    }
}

/// `GET /search?q=&max=`
pub async fn search_probe(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    respond(run_search(&state, &headers, query.as_deref()).await)
}

async fn run_search(
    state: &AppState,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<Value, Error> {
    authorize(&state.guard, headers, query_token(query).as_deref())?;
    let args = SearchArgs::from_value(&serde_json::json!({
        "q": query_value(query, "q"),
        "max": query_value(query, "max"),
    }))?;
    let results = state.dispatcher.backend().search(&args.query, args.max).await?;
    Ok(Value::Array(results.0))
}

/// `GET /fetch?id=&lines=`
pub async fn fetch_probe(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    respond(run_fetch(&state, &headers, query.as_deref()).await)
}

async fn run_fetch(
    state: &AppState,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<Value, Error> {
    authorize(&state.guard, headers, query_token(query).as_deref())?;
    let args = FetchArgs::from_value(&serde_json::json!({
        "id": query_value(query, "id"),
        "lines": query_value(query, "lines"),
    }))?;
    let file = state
        .dispatcher
        .backend()
        .fetch(&args.id, args.lines.as_ref())
        .await?;
    Ok(file.0)
}
