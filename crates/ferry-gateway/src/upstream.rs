//! Client for the dispatcher behind the gateway.
//!
//! One pooled reqwest client with a connect timeout and no overall timeout,
//! since response bodies are streamed through. No retries.

use axum::body::Bytes;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::HeaderValue;
use reqwest::{Client, Url};

use ferry_core::auth::TOKEN_HEADER;
use ferry_core::config::GatewayConfig;
use ferry_core::error::{describe_chain, Error};

#[derive(Debug)]
pub struct Upstream {
    client: Client,
    url: Url,
}

impl Upstream {
    /// # Errors
    ///
    /// [`Error::Configuration`] if the upstream URL is invalid.
    pub fn new(config: &GatewayConfig) -> Result<Self, Error> {
        let url = Url::parse(&config.upstream_url).map_err(|e| {
            Error::Configuration(format!("invalid upstream URL '{}': {e}", config.upstream_url))
        })?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST a request body to the dispatcher.
    ///
    /// The token the client presented travels in the dedicated header, so a
    /// dispatcher that guards its messages path accepts the relayed call.
    /// Any HTTP status is a successful forward; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// [`Error::UpstreamUnreachable`] on connect failure, timeout or reset,
    /// carrying the low-level reason.
    pub async fn forward(
        &self,
        body: Bytes,
        token: Option<&str>,
        accept: Option<HeaderValue>,
        content_type: Option<HeaderValue>,
    ) -> Result<reqwest::Response, Error> {
        let content_type =
            content_type.unwrap_or_else(|| HeaderValue::from_static("application/json"));
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        if let Some(token) = token.and_then(|t| HeaderValue::from_str(t).ok()) {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        request.send().await.map_err(|e| {
            let reason = describe_chain(&e);
            tracing::warn!(upstream = %self.url, %reason, "upstream request failed");
            Error::UpstreamUnreachable(reason)
        })
    }
}
