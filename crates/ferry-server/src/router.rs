use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::handlers;

/// Create the dispatcher router with all routes.
pub fn create_router(state: AppState) -> Router {
    let messages_path = state.config.endpoint.messages_path.clone();

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // MCP endpoint: SSE handshake (GET), JSON-RPC (POST), liveness (HEAD)
        .route(
            &messages_path,
            get(handlers::mcp_sse)
                .post(handlers::mcp_request)
                .head(handlers::mcp_liveness),
        )
        // REST probes against the backend
        .route("/search", get(handlers::search_probe))
        .route("/fetch", get(handlers::fetch_probe))
        .layer(TraceLayer::new_for_http())
        // CORS: allow any origin; the gateway applies the allow-list
        .layer(CorsLayer::permissive())
        .with_state(state)
}
