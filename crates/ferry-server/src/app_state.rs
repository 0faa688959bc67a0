use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ferry_core::auth::AuthGuard;
use ferry_core::config::ServerConfig;
use ferry_core::traits::ContentBackend;
use ferry_mcp::{Dispatcher, ServerInfo};

/// Shared application state with injected dependencies.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub guard: AuthGuard,
    pub config: Arc<ServerConfig>,
    /// Receives the close token of every SSE session as it opens.
    pub session_watch: Option<mpsc::UnboundedSender<CancellationToken>>,
}

impl AppState {
    pub fn new(config: ServerConfig, backend: Arc<dyn ContentBackend>) -> Self {
        let server_info = ServerInfo::new("ferry", env!("CARGO_PKG_VERSION"));
        Self {
            dispatcher: Arc::new(Dispatcher::new(backend, server_info)),
            guard: AuthGuard::new(config.bridge_secret.clone()),
            config: Arc::new(config),
            session_watch: None,
        }
    }

    #[must_use]
    pub fn with_session_watch(mut self, watch: mpsc::UnboundedSender<CancellationToken>) -> Self {
        self.session_watch = Some(watch);
        self
    }
}
