use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::app_state::GatewayState;
use crate::{cors, handlers};

/// Create the gateway router.
///
/// CORS is the outermost layer so preflights on any path get a 204 before
/// auth or routing.
pub fn create_router(state: GatewayState) -> Router {
    let messages_path = state.config.endpoint.messages_path.clone();

    Router::new()
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .route(
            &messages_path,
            get(handlers::handshake)
                .post(handlers::proxy)
                .head(handlers::liveness)
                .fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(state.clone(), cors::apply_cors))
        .with_state(state)
}
