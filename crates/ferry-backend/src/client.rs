use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use ferry_core::config::BackendConfig;
use ferry_core::error::describe_chain;
use ferry_core::traits::ContentBackend;
use ferry_core::types::{FileContent, LineRange, SearchResults};
use ferry_core::Error;

use crate::envelope;

/// reqwest-backed client for the content API.
///
/// Every call is a single `GET` against the configured base URL; the action and
/// its arguments travel as query parameters together with the access key.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the base URL is missing or invalid.
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        let base_url = config.base_url()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn action_url(&self, action: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", action);
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if let Some(api_key) = &self.api_key {
                query.append_pair("key", api_key);
            }
        }
        url
    }

    async fn call(&self, action: &str, params: &[(&str, &str)]) -> Result<Value, Error> {
        let url = self.action_url(action, params);
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(action, error = %describe_chain(&e), "backend unreachable");
                Error::BackendUnreachable(describe_chain(&e))
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::BackendUnreachable(describe_chain(&e)))?;

        tracing::debug!(
            action,
            status,
            bytes = body.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "backend call finished"
        );

        envelope::normalize(status, &body)
    }
}

#[async_trait]
impl ContentBackend for HttpBackend {
    async fn search(&self, query: &str, max: u32) -> Result<SearchResults, Error> {
        let max = max.to_string();
        let payload = self.call("search", &[("q", query), ("max", &max)]).await?;

        match payload {
            Value::Array(items) => Ok(SearchResults(items)),
            Value::Null => Ok(SearchResults::default()),
            Value::Object(mut obj) => match obj.remove("results").or_else(|| obj.remove("files")) {
                Some(Value::Array(items)) => Ok(SearchResults(items)),
                _ => Err(Error::Backend {
                    message: "backend search payload is not a list".to_string(),
                    status: None,
                }),
            },
            _ => Err(Error::Backend {
                message: "backend search payload is not a list".to_string(),
                status: None,
            }),
        }
    }

    async fn fetch(&self, id: &str, lines: Option<&LineRange>) -> Result<FileContent, Error> {
        let mut params = vec![("id", id)];
        if let Some(lines) = lines {
            params.push(("lines", lines.0.as_str()));
        }

        match self.call("fetch", &params).await? {
            Value::Null => Err(Error::Backend {
                message: format!("backend returned no content for '{id}'"),
                status: None,
            }),
            payload => Ok(FileContent(payload)),
        }
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_url_appends_params_and_key() {
        let config = BackendConfig {
            api_key: Some("k3y".to_string()),
            ..BackendConfig::with_base_url("https://api.example.com/exec?deployment=1")
        };
        let backend = HttpBackend::new(&config).unwrap();
        let url = backend.action_url("search", &[("q", "quarterly report"), ("max", "5")]);
        assert_eq!(
            url.as_str(),
            "https://api.example.com/exec?deployment=1&action=search&q=quarterly+report&max=5&key=k3y"
        );
    }

    #[test]
    fn missing_base_url_is_configuration_error() {
        let err = HttpBackend::new(&BackendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let config = BackendConfig {
            api_key: Some("k3y".to_string()),
            ..BackendConfig::with_base_url("https://api.example.com/")
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert!(!format!("{backend:?}").contains("k3y"));
    }
}
