use axum::body::Body;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::app_state::GatewayState;

const ALLOW_METHODS: &str = "GET, POST, HEAD, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Accept, Authorization, X-Bridge-Token";
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Value for `Access-Control-Allow-Origin`: the request origin when it is on
/// the allow-list, otherwise `*`.
pub fn allowed_origin(allow_list: &[String], origin: Option<&HeaderValue>) -> HeaderValue {
    origin
        .filter(|origin| {
            origin
                .to_str()
                .is_ok_and(|o| allow_list.iter().any(|allowed| allowed == o))
        })
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"))
}

/// Overlay the CORS headers on a response, replacing any set upstream.
pub fn overlay(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));

    let varies_on_origin = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case("origin"));
    if !varies_on_origin {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// CORS for every request; preflights are answered here, before auth and routing.
pub async fn apply_cors(
    State(state): State<GatewayState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = allowed_origin(&state.config.allowed_origins, request.headers().get(ORIGIN));

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        overlay(response.headers_mut(), origin);
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
        return response;
    }

    let mut response = next.run(request).await;
    overlay(response.headers_mut(), origin);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> Vec<String> {
        vec!["https://chat.example.com".to_string()]
    }

    #[test]
    fn listed_origin_is_echoed() {
        let origin = HeaderValue::from_static("https://chat.example.com");
        assert_eq!(allowed_origin(&allow_list(), Some(&origin)), origin);
    }

    #[test]
    fn unlisted_or_missing_origin_falls_back_to_wildcard() {
        let origin = HeaderValue::from_static("https://evil.example.com");
        assert_eq!(allowed_origin(&allow_list(), Some(&origin)), "*");
        assert_eq!(allowed_origin(&allow_list(), None), "*");
        assert_eq!(allowed_origin(&[], Some(&origin)), "*");
    }

    #[test]
    fn overlay_replaces_origin_and_keeps_existing_vary() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(VARY, HeaderValue::from_static("origin, access-control-request-method"));

        overlay(&mut headers, HeaderValue::from_static("https://chat.example.com"));

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://chat.example.com");
        assert_eq!(headers.get_all(VARY).iter().count(), 1);
    }

    #[test]
    fn overlay_adds_vary() {
        let mut headers = HeaderMap::new();
        overlay(&mut headers, HeaderValue::from_static("*"));
        assert_eq!(headers[VARY], "Origin");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
    }
}
