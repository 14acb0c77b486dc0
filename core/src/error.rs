//! Error types for the request layer.
//!
//! # Design
//! Callers tell failures apart by their code: transport failures carry none,
//! HTTP failures carry the status, and server logic failures carry the
//! server's own `code` field. Every variant renders a human-readable message,
//! falling back to [`DEFAULT_FAILURE_MESSAGE`] when the server said nothing.

use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

/// Message used whenever a failed response carries no message of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "request failed";

/// Errors surfaced by `RequestClient` and the endpoint groups.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport never produced a response (network, DNS, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a status other than 200/201.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The server answered 200/201 but its envelope `code` signals failure.
    #[error("{message}")]
    Server { code: Value, message: String },

    /// The chat backend reported an `error`, or answered with a non-200 status.
    #[error("{message}")]
    Chat { status: u16, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A resolved payload did not match the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl ApiError {
    /// Machine-readable code: the HTTP status for `Http`, the envelope code
    /// for `Server`, nothing otherwise.
    pub fn code(&self) -> Option<Value> {
        match self {
            ApiError::Http { status, .. } => Some(Value::from(*status)),
            ApiError::Server { code, .. } => Some(code.clone()),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Http { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Chat { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportErrorKind;
    use serde_json::json;

    #[test]
    fn http_error_code_is_status() {
        let err = ApiError::Http {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.code(), Some(json!(404)));
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn server_error_code_is_envelope_code() {
        let err = ApiError::Server {
            code: json!("E_DUP"),
            message: "duplicate".to_string(),
        };
        assert_eq!(err.code(), Some(json!("E_DUP")));
        assert_eq!(err.message(), "duplicate");
    }

    #[test]
    fn transport_and_chat_errors_have_no_code() {
        let err = ApiError::from(TransportError::new(TransportErrorKind::Timeout, "timed out"));
        assert!(err.code().is_none());
        assert!(err.message().contains("timed out"));

        let err = ApiError::Chat {
            status: 200,
            message: "boom".to_string(),
        };
        assert!(err.code().is_none());
        assert_eq!(err.message(), "boom");
    }
}
