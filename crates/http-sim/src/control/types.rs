//! Envelope and response helpers for the control API.
//!
//! Every control endpoint answers HTTP 200 with an `OperationResult`
//! envelope; failures are reported through `success`/`message`, not through
//! the status code.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Uniform control API envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Serialize an envelope into a JSON response.
pub fn envelope_response<T: Serialize>(result: &OperationResult<T>) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(StatusCode::OK, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status, headers, and body. The
/// builder fails only on malformed header names or values; that case
/// degrades to a bare 500.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(Full::new(body.into())).unwrap_or_else(|_| {
        let mut fallback = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let result = OperationResult::ok(vec![1, 2]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("message").is_none());
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_failure_envelope_shape() {
        let result: OperationResult<()> = OperationResult::failure("boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "boom");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_envelope_response_is_json_ok() {
        let response = envelope_response(&OperationResult::ok(42));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }
}
