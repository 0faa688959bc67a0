use serde_json::Value;

/// JSON-RPC codes for every failure the bridge can report.
pub mod codes {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    /// Implementation-defined server error (backend failures, misconfiguration).
    pub const SERVER_ERROR: i32 = -32000;
    pub const UNAUTHORIZED: i32 = -32001;
    pub const UPSTREAM_UNREACHABLE: i32 = -32098;
}

/// Core error type for the ferry bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("backend error: {message}")]
    Backend { message: String, status: Option<u16> },

    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// JSON-RPC error code reported for this failure.
    #[must_use]
    pub fn rpc_code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => codes::INVALID_REQUEST,
            Self::MethodNotFound(_) | Self::UnknownTool(_) => codes::METHOD_NOT_FOUND,
            Self::InvalidArguments(_) => codes::INVALID_PARAMS,
            Self::Backend { .. } | Self::BackendUnreachable(_) | Self::Configuration(_) => {
                codes::SERVER_ERROR
            }
            Self::Unauthorized => codes::UNAUTHORIZED,
            Self::UpstreamUnreachable(_) => codes::UPSTREAM_UNREACHABLE,
        }
    }

    /// Diagnostic detail attached as the JSON-RPC error `data` member.
    #[must_use]
    pub fn rpc_data(&self) -> Option<Value> {
        match self {
            Self::Backend { status, .. } => Some(serde_json::json!({
                "kind": "backend_error",
                "status": status,
            })),
            Self::BackendUnreachable(_) => {
                Some(serde_json::json!({ "kind": "backend_unreachable" }))
            }
            _ => None,
        }
    }

    /// HTTP status for failures reported outside a JSON-RPC exchange
    /// (auth, misconfiguration, gateway upstream).
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::InvalidRequest(_) | Self::InvalidArguments(_) => 400,
            Self::MethodNotFound(_) | Self::UnknownTool(_) => 404,
            Self::Backend { .. } | Self::BackendUnreachable(_) | Self::UpstreamUnreachable(_) => {
                502
            }
            Self::Configuration(_) => 500,
        }
    }
}

/// Render an error with its `source()` chain, e.g.
/// `error sending request: client error (Connect): Connection refused`.
#[must_use]
pub fn describe_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !out.contains(&cause_text) {
            out.push_str(": ");
            out.push_str(&cause_text);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let wrapped = Error::Configuration("outer".into());
        assert_eq!(describe_chain(&wrapped), "configuration error: outer");
        assert_eq!(describe_chain(&io), "connection refused");
    }

    #[test]
    fn unknown_tool_shares_method_not_found_code() {
        assert_eq!(
            Error::UnknownTool("nope".into()).rpc_code(),
            Error::MethodNotFound("nope".into()).rpc_code()
        );
    }

    #[test]
    fn configuration_is_server_side() {
        let err = Error::Configuration("no secret".into());
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.rpc_code(), codes::SERVER_ERROR);
    }

    #[test]
    fn backend_error_carries_status_detail() {
        let err = Error::Backend {
            message: "quota exceeded".into(),
            status: Some(429),
        };
        assert_eq!(err.to_string(), "backend error: quota exceeded");
        assert_eq!(err.rpc_data().unwrap()["status"], 429);
    }

    #[test]
    fn upstream_unreachable_is_bad_gateway() {
        let err = Error::UpstreamUnreachable("connection refused".into());
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.rpc_code(), -32098);
    }
}
