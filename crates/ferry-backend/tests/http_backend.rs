use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use ferry_backend::HttpBackend;
use ferry_core::config::BackendConfig;
use ferry_core::{ContentBackend, Error, LineRange};

/// Mimics the content API: flat envelopes for search, nested for fetch.
async fn content_api(Query(q): Query<HashMap<String, String>>) -> axum::response::Response {
    if q.get("key").map(String::as_str) != Some("k3y") {
        return Json(serde_json::json!({"ok": false, "error": "invalid key"})).into_response();
    }

    match q.get("action").map(String::as_str) {
        Some("search") => {
            let max: usize = q.get("max").and_then(|m| m.parse().ok()).unwrap_or(0);
            let files: Vec<_> = (0..3)
                .take(max)
                .map(|i| serde_json::json!({"id": format!("f{i}"), "name": q["q"]}))
                .collect();
            Json(serde_json::json!({"ok": true, "data": files})).into_response()
        }
        Some("fetch") => match q.get("id").map(String::as_str) {
            Some("doc-1") => Json(serde_json::json!({
                "ok": true,
                "data": {"ok": true, "data": {
                    "id": "doc-1",
                    "inline": true,
                    "text": "hello",
                    "lines": q.get("lines"),
                }}
            }))
            .into_response(),
            Some("html") => (StatusCode::BAD_GATEWAY, "<html>upstream down</html>").into_response(),
            _ => Json(serde_json::json!({"ok": false, "error": "file not found"})).into_response(),
        },
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn spawn_content_api() -> SocketAddr {
    let app = Router::new().route("/exec", get(content_api));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn backend(addr: SocketAddr, key: &str) -> HttpBackend {
    let config = BackendConfig {
        api_key: Some(key.to_string()),
        ..BackendConfig::with_base_url(format!("http://{addr}/exec"))
    };
    HttpBackend::new(&config).unwrap()
}

#[tokio::test]
async fn search_returns_normalized_list() {
    let addr = spawn_content_api().await;
    let results = backend(addr, "k3y").search("quarterly report", 5).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results.0[0]["name"], "quarterly report");
}

#[tokio::test]
async fn search_honors_max() {
    let addr = spawn_content_api().await;
    let results = backend(addr, "k3y").search("x", 2).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn fetch_unwraps_nested_envelope() {
    let addr = spawn_content_api().await;
    let lines = LineRange("10-20".to_string());
    let file = backend(addr, "k3y").fetch("doc-1", Some(&lines)).await.unwrap();

    assert_eq!(file.inline_text(), Some("hello"));
    assert_eq!(file.0["lines"], "10-20");
}

#[tokio::test]
async fn backend_failure_message_is_surfaced() {
    let addr = spawn_content_api().await;
    let err = backend(addr, "k3y").fetch("missing", None).await.unwrap_err();
    assert_eq!(err.to_string(), "backend error: file not found");

    let err = backend(addr, "wrong").search("x", 1).await.unwrap_err();
    assert_eq!(err.to_string(), "backend error: invalid key");
}

#[tokio::test]
async fn non_json_body_is_backend_error() {
    let addr = spawn_content_api().await;
    let err = backend(addr, "k3y").fetch("html", None).await.unwrap_err();
    assert!(matches!(err, Error::Backend { status: Some(502), .. }));
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = BackendConfig {
        timeout: Duration::from_secs(2),
        ..BackendConfig::with_base_url(format!("http://{addr}/exec"))
    };
    let err = HttpBackend::new(&config)
        .unwrap()
        .search("x", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BackendUnreachable(_)));
}
