//! HTTP transport and network errors.

use serde_json::Value;
use thiserror::Error;

/// Broad category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The server answered with a non-2xx status.
    Http,
    /// The request exceeded its timeout.
    Timeout,
    /// No connection could be established.
    Connection,
    /// Any other failure (invalid URL, body encoding, ...).
    Other,
}

/// A failed transport call.
///
/// Carries the status code and raw error payload when the server produced
/// them, so callers can branch on e.g. 404 versus 500.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status code, when a response was received.
    pub status: Option<u16>,
    /// Decoded error body, when a response was received.
    pub payload: Option<Value>,
    /// Human-readable description.
    pub message: String,
    /// Failure category.
    pub kind: TransportErrorKind,
}

impl TransportError {
    /// Creates an error for a non-2xx response.
    pub fn http(status: u16, payload: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            payload,
            message: message.into(),
            kind: TransportErrorKind::Http,
        }
    }

    /// Creates an error for a failure with no response.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: None,
            payload: None,
            message: message.into(),
            kind: TransportErrorKind::Other,
        }
    }

    /// Returns `true` if repeating the call might succeed.
    ///
    /// Timeouts, connection failures, 5xx and 429 responses are retryable.
    /// The dispatcher never retries; this is information for the caller.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            TransportErrorKind::Timeout | TransportErrorKind::Connection => true,
            TransportErrorKind::Http => self.status.is_some_and(|s| s >= 500 || s == 429),
            TransportErrorKind::Other => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connection
        } else {
            TransportErrorKind::Other
        };

        Self {
            status: err.status().map(|s| s.as_u16()),
            payload: None,
            message: format!("HTTP request failed: {err}"),
            kind,
        }
    }
}
