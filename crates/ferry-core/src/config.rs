//! Immutable configuration values, built once in `main` and shared by `Arc`.
//!
//! No component reads the process environment directly; the binaries parse
//! flags and env vars with clap and hand the result to these types.

use std::time::Duration;

use crate::error::Error;

/// Path that serves the SSE handshake (GET), JSON-RPC (POST) and liveness (HEAD).
pub const DEFAULT_MESSAGES_PATH: &str = "/mcp";

/// Interval between keepalive comments on an idle stream.
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(20);

/// Connection to the external content API.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Whole-request timeout for a backend call.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the URL is unset or unparseable.
    pub fn base_url(&self) -> Result<url::Url, Error> {
        let raw = self
            .base_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Configuration("backend base URL is not set".to_string()))?;
        url::Url::parse(raw)
            .map_err(|e| Error::Configuration(format!("invalid backend base URL '{raw}': {e}")))
    }
}

/// Settings shared by both network-facing processes.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub messages_path: String,
    /// Externally visible base URL; overrides header-based detection when set.
    pub public_url: Option<String>,
    /// Scheme assumed when no forwarding header says otherwise.
    pub fallback_scheme: String,
    pub keepalive: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            messages_path: DEFAULT_MESSAGES_PATH.to_string(),
            public_url: None,
            fallback_scheme: "http".to_string(),
            keepalive: DEFAULT_KEEPALIVE,
        }
    }
}

/// Configuration of the dispatcher process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bridge_secret: Option<String>,
    /// Guard the messages endpoint. On unless explicitly disabled.
    pub require_auth: bool,
    pub endpoint: EndpointConfig,
    pub backend: BackendConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bridge_secret: None,
            require_auth: true,
            endpoint: EndpointConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

/// Configuration of the proxy gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bridge_secret: Option<String>,
    /// Dispatcher URL that receives proxied POST bodies.
    pub upstream_url: String,
    pub allowed_origins: Vec<String>,
    pub connect_timeout: Duration,
    pub endpoint: EndpointConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bridge_secret: None,
            upstream_url: format!("http://127.0.0.1:3000{DEFAULT_MESSAGES_PATH}"),
            allowed_origins: Vec::new(),
            connect_timeout: Duration::from_secs(5),
            endpoint: EndpointConfig::default(),
        }
    }
}

/// Normalize a route path to a single leading slash and no trailing slash.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_MESSAGES_PATH.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Split a comma-separated origin list, dropping blanks.
#[must_use]
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_guards_messages_by_default() {
        assert!(ServerConfig::default().require_auth);
    }

    #[test]
    fn paths_are_normalized() {
        assert_eq!(normalize_path("mcp/"), "/mcp");
        assert_eq!(normalize_path("/rpc/v1"), "/rpc/v1");
        assert_eq!(normalize_path(" / "), DEFAULT_MESSAGES_PATH);
    }

    #[test]
    fn backend_url_must_be_set() {
        let err = BackendConfig::default().base_url().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn backend_url_must_parse() {
        let err = BackendConfig::with_base_url("not a url").base_url().unwrap_err();
        assert!(err.to_string().contains("invalid backend base URL"));

        let ok = BackendConfig::with_base_url("https://api.example.com/exec")
            .base_url()
            .unwrap();
        assert_eq!(ok.host_str(), Some("api.example.com"));
    }

    #[test]
    fn origin_list_parsing() {
        let origins = parse_origin_list(" https://a.example/, ,https://b.example ");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }
}
