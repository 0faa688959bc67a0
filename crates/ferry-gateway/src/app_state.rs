use std::sync::Arc;

use ferry_core::auth::AuthGuard;
use ferry_core::config::GatewayConfig;
use ferry_core::Error;
use ferry_mcp::ServerInfo;

use crate::upstream::Upstream;

/// Shared gateway state.
#[derive(Clone)]
pub struct GatewayState {
    pub upstream: Arc<Upstream>,
    pub guard: AuthGuard,
    pub config: Arc<GatewayConfig>,
    /// Reported in the hello event.
    pub server_info: ServerInfo,
}

impl GatewayState {
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the upstream client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, Error> {
        Ok(Self {
            upstream: Arc::new(Upstream::new(&config)?),
            guard: AuthGuard::new(config.bridge_secret.clone()),
            server_info: ServerInfo::new("ferry-gateway", env!("CARGO_PKG_VERSION")),
            config: Arc::new(config),
        })
    }
}
