//! URL chain builder errors.

use thiserror::Error;

use crate::method::RestMethod;

/// Errors raised while selecting a resource or building its URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    /// No resource is defined under the name.
    #[error("Resource \"{0}\" not found")]
    UnknownResource(String),

    /// The resource definition has no path.
    #[error("Path is required for resource definition")]
    MissingPath,

    /// The resource definition lists no methods.
    #[error("At least one HTTP method is required")]
    NoMethods,

    /// The method is not allowed for the resource.
    #[error("Method \"{method}\" is not allowed for this resource. Allowed methods: {allowed}")]
    MethodNotAllowed {
        /// The rejected method.
        method: RestMethod,
        /// Comma-separated allowed methods.
        allowed: String,
    },

    /// Required path parameters were not supplied.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParams(Vec<String>),

    /// Parameters outside the resource's allowed list were supplied.
    #[error("Invalid parameters: {}. Allowed parameters: {}", .invalid.join(", "), .allowed.join(", "))]
    InvalidParams {
        /// The rejected names.
        invalid: Vec<String>,
        /// The allowed names.
        allowed: Vec<String>,
    },

    /// A path parameter was null or empty.
    #[error("Parameter \"{0}\" cannot be null or empty")]
    EmptyParam(String),

    /// The resource does not accept query parameters.
    #[error("Query parameters are not allowed for this resource")]
    QueryNotAllowed,

    /// Query parameters outside the resource's allowed list were supplied.
    #[error("Invalid query parameters: {}. Allowed parameters: {}", .invalid.join(", "), .allowed.join(", "))]
    InvalidQuery {
        /// The rejected names.
        invalid: Vec<String>,
        /// The allowed names.
        allowed: Vec<String>,
    },

    /// A query parameter array was empty.
    #[error("Query parameter \"{0}\" array cannot be empty")]
    EmptyQueryArray(String),
}
