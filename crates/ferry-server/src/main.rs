use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferry_backend::HttpBackend;
use ferry_core::config::{normalize_path, BackendConfig, EndpointConfig, ServerConfig};
use ferry_server::app_state::AppState;

#[derive(Parser)]
#[command(name = "ferry-server", about = "Ferry dispatcher - MCP tools over JSON-RPC")]
struct Args {
    /// Loopback by default; the gateway is the public entry point
    #[arg(long, env = "FERRY_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "FERRY_PORT", default_value_t = 3000)]
    port: u16,

    /// Shared secret presented by clients
    #[arg(long, env = "FERRY_BRIDGE_SECRET", hide_env_values = true)]
    bridge_secret: Option<String>,

    /// Serve the MCP endpoint without checking the shared secret
    #[arg(long, env = "FERRY_NO_REQUIRE_AUTH")]
    no_require_auth: bool,

    /// Base URL of the content API
    #[arg(long, env = "FERRY_BACKEND_URL")]
    backend_url: Option<String>,

    #[arg(long, env = "FERRY_BACKEND_KEY", hide_env_values = true)]
    backend_key: Option<String>,

    #[arg(long, env = "FERRY_BACKEND_TIMEOUT_SECS", default_value_t = 30)]
    backend_timeout_secs: u64,

    #[arg(long, env = "FERRY_MESSAGES_PATH", default_value = "/mcp")]
    messages_path: String,

    /// Externally visible base URL, overrides forwarding headers
    #[arg(long, env = "FERRY_PUBLIC_URL")]
    public_url: Option<String>,

    #[arg(long, env = "FERRY_KEEPALIVE_SECS", default_value_t = 20)]
    keepalive_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            bridge_secret: self.bridge_secret,
            require_auth: !self.no_require_auth,
            endpoint: EndpointConfig {
                messages_path: normalize_path(&self.messages_path),
                public_url: self.public_url,
                keepalive: Duration::from_secs(self.keepalive_secs.max(1)),
                ..EndpointConfig::default()
            },
            backend: BackendConfig {
                base_url: self.backend_url,
                api_key: self.backend_key,
                timeout: Duration::from_secs(self.backend_timeout_secs),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let config = args.into_config();

    if config.bridge_secret.as_deref().unwrap_or_default().is_empty() {
        tracing::warn!("FERRY_BRIDGE_SECRET is not set; guarded routes will answer 500");
    }
    if !config.require_auth {
        tracing::warn!("MCP endpoint is not guarded; keep the dispatcher off public interfaces");
    }

    let backend = HttpBackend::new(&config.backend).context("failed to configure backend client")?;
    let state = AppState::new(config, Arc::new(backend));
    let app = ferry_server::router::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Ferry dispatcher listening on {addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
