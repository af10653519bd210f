//! Client error types

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message used when the server does not explain a failure status
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Message used when no response was received
pub const NETWORK_ERROR_MESSAGE: &str = "network error";

/// Message used for local failures that carry no message of their own
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Where a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server answered with a failure status
    Server,
    /// Server answered 401
    Unauthorized,
    /// Request was sent but no response came back
    Network,
    /// Request could not be built, or the response could not be decoded
    Local,
}

/// Normalized API error.
///
/// Every failed call surfaces as one of these, whatever the transport or
/// server produced. `status_code` is 0 when no HTTP status is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status {status_code})")]
pub struct ApiError {
    message: String,
    status_code: u16,
    kind: ErrorKind,
}

impl ApiError {
    /// Create error from HTTP status code and raw response body
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = if status == StatusCode::UNAUTHORIZED {
            ErrorKind::Unauthorized
        } else {
            ErrorKind::Server
        };

        Self {
            message: extract_detail(body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            status_code: status.as_u16(),
            kind,
        }
    }

    /// Request went out but nothing came back
    pub fn network() -> Self {
        Self {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            status_code: 0,
            kind: ErrorKind::Network,
        }
    }

    /// Failure before the request left or after the response arrived
    pub fn local(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNEXPECTED_ERROR_MESSAGE.to_string()
        } else {
            message
        };

        Self {
            message,
            status_code: 0,
            kind: ErrorKind::Local,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Check if the server rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }

    /// Check if the server could not be reached
    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_decode() {
            Self::local(err.to_string())
        } else {
            // connect, timeout, request and body errors all mean no usable response
            Self::network()
        }
    }
}

/// Pull a human readable message out of an error body.
///
/// Accepts `{"detail": "..."}` and the validation shape
/// `{"detail": [{"msg": "..."}, ...]}`.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
