use http::header::AUTHORIZATION;
use http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::error::Error;

/// Dedicated header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-bridge-token";

/// Query parameter carrying the shared secret.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Pick the presented token from the places a caller may put it.
///
/// The dedicated header wins, then the `token` query parameter, then the
/// `Authorization` header with its scheme word (`Bearer`, `Token`, ...) stripped.
#[must_use]
pub fn presented_token<'a>(
    token_header: Option<&'a str>,
    query_token: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    let explicit = token_header
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| query_token.map(str::trim).filter(|t| !t.is_empty()));
    if explicit.is_some() {
        return explicit;
    }

    let auth = authorization.map(str::trim).filter(|a| !a.is_empty())?;
    let token = match auth.split_once(char::is_whitespace) {
        Some((_scheme, rest)) => rest.trim(),
        None => auth,
    };
    (!token.is_empty()).then_some(token)
}

/// [`presented_token`] over request headers plus an already-parsed query token.
#[must_use]
pub fn presented_from_headers<'a>(
    headers: &'a HeaderMap,
    query_token: Option<&'a str>,
) -> Option<&'a str> {
    presented_token(
        headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()),
        query_token,
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
    )
}

/// First value of `name` in a raw query string.
///
/// Never fails: repeated keys, stray separators and bad percent-escapes are
/// tolerated, so a malformed query still reaches the auth check.
#[must_use]
pub fn query_value(raw_query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(raw_query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// The `token` query parameter, see [`query_value`].
#[must_use]
pub fn query_token(raw_query: Option<&str>) -> Option<String> {
    query_value(raw_query, TOKEN_QUERY_PARAM)
}

/// Compares presented tokens against the configured shared secret.
#[derive(Clone)]
pub struct AuthGuard {
    secret: Option<String>,
}

impl AuthGuard {
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Check a presented token.
    ///
    /// An unset secret authorizes no one.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when no secret is configured,
    /// [`Error::Unauthorized`] when the token is missing or does not match.
    pub fn check(&self, presented: Option<&str>) -> Result<(), Error> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::error!("request rejected: bridge secret is not configured");
            return Err(Error::Configuration(
                "bridge secret is not configured".to_string(),
            ));
        };

        let matches = presented
            .map(|token| bool::from(token.as_bytes().ct_eq(secret.as_bytes())))
            .unwrap_or(false);

        if matches {
            Ok(())
        } else {
            tracing::warn!(presented = presented.is_some(), "request rejected: bad token");
            Err(Error::Unauthorized)
        }
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_beats_query_and_authorization() {
        let token = presented_token(Some("h"), Some("q"), Some("Bearer a"));
        assert_eq!(token, Some("h"));

        let token = presented_token(None, Some("q"), Some("Bearer a"));
        assert_eq!(token, Some("q"));
    }

    #[test]
    fn authorization_scheme_is_optional() {
        assert_eq!(presented_token(None, None, Some("Bearer abc")), Some("abc"));
        assert_eq!(presented_token(None, None, Some("Token  abc ")), Some("abc"));
        assert_eq!(presented_token(None, None, Some("abc")), Some("abc"));
        assert_eq!(presented_token(Some(" "), Some(""), None), None);
    }

    #[test]
    fn reads_header_map() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer from-auth".parse().unwrap());
        assert_eq!(presented_from_headers(&headers, None), Some("from-auth"));
        assert_eq!(presented_from_headers(&headers, Some("q")), Some("q"));

        headers.insert(TOKEN_HEADER, "from-header".parse().unwrap());
        assert_eq!(presented_from_headers(&headers, Some("q")), Some("from-header"));
    }

    #[test]
    fn query_token_tolerates_repeats_and_junk() {
        assert_eq!(query_token(Some("token=a&token=b")), Some("a".to_string()));
        assert_eq!(query_token(Some("&&token=a%20b&x")), Some("a b".to_string()));
        assert_eq!(query_token(Some("token=%zz")), Some("%zz".to_string()));
        assert_eq!(query_token(Some("q=1")), None);
        assert_eq!(query_token(None), None);
        assert_eq!(query_value(Some("max=5&max=9"), "max"), Some("5".to_string()));
    }

    #[test]
    fn exact_match_is_authorized() {
        let guard = AuthGuard::new(Some("s3cret".into()));
        assert!(guard.check(Some("s3cret")).is_ok());
        assert!(matches!(guard.check(Some("s3cret ")), Err(Error::Unauthorized)));
        assert!(matches!(guard.check(Some("S3CRET")), Err(Error::Unauthorized)));
        assert!(matches!(guard.check(None), Err(Error::Unauthorized)));
    }

    #[test]
    fn unset_secret_fails_closed() {
        for guard in [AuthGuard::new(None), AuthGuard::new(Some(String::new()))] {
            assert!(matches!(guard.check(Some("")), Err(Error::Configuration(_))));
            assert!(matches!(guard.check(None), Err(Error::Configuration(_))));
        }
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let guard = AuthGuard::new(Some("s3cret".into()));
        assert!(!format!("{guard:?}").contains("s3cret"));
    }
}
