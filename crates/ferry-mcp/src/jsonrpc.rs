use serde::{Deserialize, Serialize};
use serde_json::Value;

use ferry_core::Error;

pub use ferry_core::error::codes::{
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, SERVER_ERROR, UNAUTHORIZED,
    UPSTREAM_UNREACHABLE,
};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Requests without an id (or with `null`) are notifications.
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    /// Create an error response carrying diagnostic `data`.
    pub fn error_with_data(
        id: Value,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Error envelope for a bridge failure.
    pub fn from_error(id: Value, err: &Error) -> Self {
        Self::error_with_data(id, err.rpc_code(), err.to_string(), err.rpc_data())
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A body that is not a usable JSON-RPC request.
#[derive(Debug, Clone)]
pub struct InvalidEnvelope {
    /// Request id if one could be recovered, otherwise `null`.
    pub id: Value,
    pub reason: String,
}

impl InvalidEnvelope {
    fn new(id: Value, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }

    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(
            self.id,
            INVALID_REQUEST,
            format!("Invalid Request: {}", self.reason),
        )
    }
}

/// Parse and validate a raw request body.
///
/// # Errors
///
/// Returns [`InvalidEnvelope`] for non-JSON bodies, batches, a `jsonrpc`
/// member other than `"2.0"`, a non-string `method`, or non-object `params`.
pub fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, InvalidEnvelope> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| InvalidEnvelope::new(Value::Null, format!("body is not valid JSON ({e})")))?;

    let is_batch = value.is_array();
    let Value::Object(mut obj) = value else {
        let reason = if is_batch {
            "batch requests are not supported"
        } else {
            "body is not a JSON object"
        };
        return Err(InvalidEnvelope::new(Value::Null, reason));
    };

    let id = match obj.remove("id") {
        Some(id @ (Value::String(_) | Value::Number(_))) => id,
        Some(Value::Null) | None => Value::Null,
        Some(_) => {
            return Err(InvalidEnvelope::new(
                Value::Null,
                "id must be a string, number or null",
            ))
        }
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(InvalidEnvelope::new(id, "jsonrpc must be \"2.0\""));
    }

    let Some(Value::String(method)) = obj.remove("method") else {
        return Err(InvalidEnvelope::new(id, "method must be a string"));
    };

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(params @ Value::Object(_)) => Some(params),
        Some(_) => return Err(InvalidEnvelope::new(id, "params must be an object")),
    };

    Ok(JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id,
        method,
        params,
    })
}
