use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferry_core::config::{normalize_path, parse_origin_list, EndpointConfig, GatewayConfig};
use ferry_gateway::app_state::GatewayState;

#[derive(Parser)]
#[command(
    name = "ferry-gateway",
    about = "Ferry gateway - CORS, auth and SSE in front of the dispatcher"
)]
struct Args {
    #[arg(long, env = "FERRY_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "FERRY_PORT", default_value_t = 8080)]
    port: u16,

    /// Shared secret presented by clients
    #[arg(long, env = "FERRY_BRIDGE_SECRET", hide_env_values = true)]
    bridge_secret: Option<String>,

    /// Dispatcher messages URL that receives proxied POSTs
    #[arg(long, env = "FERRY_UPSTREAM_URL", default_value = "http://127.0.0.1:3000/mcp")]
    upstream_url: String,

    /// Comma-separated origins echoed in Access-Control-Allow-Origin
    #[arg(long, env = "FERRY_ALLOWED_ORIGINS", default_value = "")]
    allowed_origins: String,

    #[arg(long, env = "FERRY_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    connect_timeout_secs: u64,

    #[arg(long, env = "FERRY_MESSAGES_PATH", default_value = "/mcp")]
    messages_path: String,

    /// Externally visible base URL, overrides forwarding headers
    #[arg(long, env = "FERRY_PUBLIC_URL")]
    public_url: Option<String>,

    #[arg(long, env = "FERRY_KEEPALIVE_SECS", default_value_t = 20)]
    keepalive_secs: u64,
}

impl Args {
    fn into_config(self) -> GatewayConfig {
        GatewayConfig {
            bridge_secret: self.bridge_secret,
            upstream_url: self.upstream_url,
            allowed_origins: parse_origin_list(&self.allowed_origins),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            endpoint: EndpointConfig {
                messages_path: normalize_path(&self.messages_path),
                public_url: self.public_url,
                keepalive: Duration::from_secs(self.keepalive_secs.max(1)),
                ..EndpointConfig::default()
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

    let state = GatewayState::new(config).context("failed to configure gateway")?;
    tracing::info!(upstream = %state.upstream.url(), "forwarding JSON-RPC to dispatcher");
    let app = ferry_gateway::router::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Ferry gateway listening on {addr}");

    axum::serve(listener, app).await.context("gateway error")?;
    Ok(())
}
