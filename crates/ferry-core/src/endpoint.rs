//! Resolution of the externally reachable messages URL.
//!
//! Behind a reverse proxy the process sees plain HTTP from the proxy, so the
//! scheme and host advertised to clients come from forwarding headers.

use http::HeaderMap;
use url::Url;

use crate::auth::TOKEN_QUERY_PARAM;
use crate::config::EndpointConfig;
use crate::error::Error;

/// SSE event name of the discovery frame.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Raw header values relevant to origin detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardingHeaders<'a> {
    /// RFC 7239 `Forwarded`.
    pub forwarded: Option<&'a str>,
    pub forwarded_proto: Option<&'a str>,
    pub forwarded_host: Option<&'a str>,
    pub host: Option<&'a str>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First element of a comma-separated header (proxies append their own hop).
fn first_hop(value: &str) -> Option<&str> {
    value.split(',').next().map(str::trim).filter(|v| !v.is_empty())
}

/// Look up `key` in the first element of an RFC 7239 `Forwarded` header.
fn forwarded_param<'a>(forwarded: &'a str, key: &str) -> Option<&'a str> {
    first_hop(forwarded)?
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
}

fn normalize_scheme(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_lowercase().as_str() {
        "https" | "wss" => Some("https"),
        "http" | "ws" => Some("http"),
        _ => None,
    }
}

impl<'a> ForwardingHeaders<'a> {
    #[must_use]
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            forwarded: header(headers, "forwarded"),
            forwarded_proto: header(headers, "x-forwarded-proto"),
            forwarded_host: header(headers, "x-forwarded-host"),
            host: header(headers, "host"),
        }
    }

    /// Externally visible scheme, if a forwarding header names one.
    #[must_use]
    pub fn scheme(&self) -> Option<&'static str> {
        self.forwarded
            .and_then(|f| forwarded_param(f, "proto"))
            .or_else(|| self.forwarded_proto.and_then(first_hop))
            .and_then(normalize_scheme)
    }

    /// Externally visible host (with port), if any header names one.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.forwarded
            .and_then(|f| forwarded_param(f, "host"))
            .or_else(|| self.forwarded_host.and_then(first_hop))
            .or_else(|| self.host.map(str::trim).filter(|h| !h.is_empty()))
    }
}

/// Absolute URL to which JSON-RPC POSTs must be sent.
///
/// A token presented as a query parameter on the handshake is carried over so
/// the follow-up POSTs authenticate the same way.
///
/// # Errors
///
/// [`Error::Configuration`] if the configured public URL is invalid,
/// [`Error::InvalidRequest`] if no host can be determined.
pub fn messages_url(
    config: &EndpointConfig,
    headers: &ForwardingHeaders<'_>,
    query_token: Option<&str>,
) -> Result<Url, Error> {
    let mut url = if let Some(public) = config.public_url.as_deref() {
        Url::parse(public)
            .map_err(|e| Error::Configuration(format!("invalid public URL '{public}': {e}")))?
    } else {
        let scheme = headers
            .scheme()
            .unwrap_or(config.fallback_scheme.as_str());
        let host = headers
            .host()
            .ok_or_else(|| Error::InvalidRequest("cannot determine request host".to_string()))?;
        Url::parse(&format!("{scheme}://{host}"))
            .map_err(|e| Error::InvalidRequest(format!("invalid host '{host}': {e}")))?
    };

    let base_path = url.path().trim_end_matches('/').to_string();
    let messages_path = config.messages_path.trim_start_matches('/');
    url.set_path(&format!("{base_path}/{messages_path}"));
    url.set_query(None);
    url.set_fragment(None);

    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
    }

    Ok(url)
}

/// JSON payload of the discovery frame.
#[must_use]
pub fn endpoint_event_data(url: &Url) -> String {
    serde_json::json!({ "messages": url.as_str() }).to_string()
}
