//! Top-level dispatch error type.

use serde_json::Value;
use thiserror::Error;

use super::TransportError;
use crate::schema::Issues;

/// Every way a dispatch can fail.
///
/// The set is closed: the dispatcher never returns anything else, and never
/// downgrades one of these into a successful result.
///
/// ## Examples
///
/// ```rust,ignore
/// use apimap_lib::DispatchError;
///
/// match dispatcher.dispatch("getUser", params).await {
///     Ok(user) => println!("{user}"),
///     Err(DispatchError::Transport(e)) if e.status == Some(404) => println!("no such user"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No endpoint is registered under the key.
    #[error("Unknown endpoint: {key}")]
    UnknownEndpoint {
        /// The key that was looked up.
        key: String,
    },

    /// A placeholder in the path template had no usable value.
    #[error("Missing required path parameter: {name}")]
    MissingPathParam {
        /// Name of the leftmost missing placeholder.
        name: String,
    },

    /// The parameter set failed the endpoint's request schema.
    #[error("Request validation failed:\n{issues}")]
    RequestValidation {
        /// Field-level issues reported by the schema.
        issues: Issues,
    },

    /// The server response failed the endpoint's response schema.
    #[error("Response from '{endpoint}' does not match its schema:\n{issues}")]
    ResponseValidation {
        /// Key of the endpoint that produced the response.
        endpoint: String,
        /// Field-level issues reported by the schema.
        issues: Issues,
        /// The payload exactly as received.
        payload: Value,
    },

    /// Network failure or non-2xx response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The caller cancelled the call while it was in flight.
    #[error("Request was cancelled")]
    Cancelled,
}

impl DispatchError {
    /// Creates a missing path parameter error.
    pub fn missing_path_param(name: impl Into<String>) -> Self {
        Self::MissingPathParam { name: name.into() }
    }

    /// Returns `true` if the caller supplied something unusable.
    ///
    /// These errors are raised before any network traffic and will fail
    /// identically on every attempt.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEndpoint { .. }
                | Self::MissingPathParam { .. }
                | Self::RequestValidation { .. }
        )
    }

    /// Returns the HTTP status code if the server answered with one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status,
            _ => None,
        }
    }

    /// Returns the raw payload attached to this error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::ResponseValidation { payload, .. } => Some(payload),
            Self::Transport(e) => e.payload.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Issue;
    use serde_json::json;

    #[test]
    fn test_missing_path_param_display() {
        let err = DispatchError::missing_path_param("id");
        assert_eq!(err.to_string(), "Missing required path parameter: id");
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_request_validation_lists_issues() {
        let err = DispatchError::RequestValidation {
            issues: Issues::from(vec![
                Issue::new("name", "expected string"),
                Issue::new("", "missing email"),
            ]),
        };
        let display = err.to_string();
        assert!(display.contains("name: expected string"));
        assert!(display.contains("\nmissing email"));
    }

    #[test]
    fn test_status_code_from_transport() {
        let err: DispatchError = TransportError::http(404, Some(json!({"message": "Not Found"})), "Not Found").into();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.payload(), Some(&json!({"message": "Not Found"})));
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_response_validation_keeps_payload() {
        let err = DispatchError::ResponseValidation {
            endpoint: "getUser".to_string(),
            issues: Issues::from(vec![Issue::new("id", "not a number")]),
            payload: json!({"id": "x"}),
        };
        assert!(err.to_string().contains("'getUser'"));
        assert_eq!(err.payload(), Some(&json!({"id": "x"})));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_cancelled_is_not_caller_error() {
        assert!(!DispatchError::Cancelled.is_caller_error());
        assert_eq!(DispatchError::Cancelled.to_string(), "Request was cancelled");
    }
}
