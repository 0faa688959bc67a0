//! Normalization of the backend's JSON envelope.
//!
//! The content API answers `{ok, data}` from some deployments and
//! `{ok, data: {ok, data}}` from others. Both collapse to the inner payload.

use serde_json::{Map, Value};

use ferry_core::Error;

fn failure_message(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(e)) => Some(
            e.get("message")
                .and_then(Value::as_str)
                .map_or_else(|| Value::Object(e.clone()).to_string(), str::to_string),
        ),
        Some(other) => Some(other.to_string()),
    }
}

/// Reject an envelope level that reports failure; `None` means success.
fn envelope_failure(obj: &Map<String, Value>) -> Option<String> {
    let ok = obj.get("ok").and_then(Value::as_bool);
    match (ok, failure_message(obj)) {
        (Some(false), message) => {
            Some(message.unwrap_or_else(|| "backend reported failure".to_string()))
        }
        (None, Some(message)) => Some(message),
        _ => None,
    }
}

/// Extract the canonical payload from a raw backend response.
///
/// # Errors
///
/// [`Error::Backend`] for non-JSON bodies, non-2xx statuses and envelopes that
/// report failure; the backend's own message is preserved.
pub fn normalize(status: u16, body: &[u8]) -> Result<Value, Error> {
    let parsed: Value = serde_json::from_slice(body).map_err(|_| Error::Backend {
        message: format!("backend returned a non-JSON response (HTTP {status})"),
        status: Some(status),
    })?;

    let Value::Object(outer) = parsed else {
        return Err(Error::Backend {
            message: "backend returned an unexpected envelope".to_string(),
            status: Some(status),
        });
    };

    if let Some(message) = envelope_failure(&outer) {
        return Err(Error::Backend {
            message,
            status: Some(status),
        });
    }

    if !(200..300).contains(&status) {
        return Err(Error::Backend {
            message: format!("backend request failed (HTTP {status})"),
            status: Some(status),
        });
    }

    let data = outer.get("data").cloned().unwrap_or(Value::Null);
    match data {
        // Only an inner `data` member marks the nested shape.
        Value::Object(mut inner) if inner.contains_key("data") => {
            if let Some(message) = envelope_failure(&inner) {
                return Err(Error::Backend {
                    message,
                    status: Some(status),
                });
            }
            Ok(inner.remove("data").unwrap_or(Value::Null))
        }
        // A nested failure may omit `data` altogether.
        Value::Object(inner) if inner.get("ok") == Some(&Value::Bool(false)) => {
            Err(Error::Backend {
                message: envelope_failure(&inner)
                    .unwrap_or_else(|| "backend reported failure".to_string()),
                status: Some(status),
            })
        }
        other => Ok(other),
    }
}
