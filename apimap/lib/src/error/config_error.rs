//! Endpoint registration and configuration errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::endpoint_key::EndpointKeyError;

/// Errors in endpoint registration or client configuration.
///
/// These occur at startup, typically indicating programmer errors or an
/// invalid configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Endpoint key validation failed.
    #[error("Invalid endpoint key: {0}")]
    InvalidEndpointKey(#[from] EndpointKeyError),

    /// Duplicate endpoint key detected.
    #[error("Duplicate endpoint key: {key}")]
    DuplicateEndpoint {
        /// The duplicate key.
        key: String,
    },

    /// Path template contains invalid placeholder syntax.
    #[error("Invalid path template: {message}")]
    InvalidPathTemplate {
        /// Description of the path template error.
        message: String,
    },

    /// A path placeholder is missing from the endpoint's allowed parameters.
    #[error("Endpoint '{key}' uses placeholder ':{placeholder}' which is not an allowed parameter")]
    PlaceholderNotAllowed {
        /// The endpoint key.
        key: String,
        /// The offending placeholder name.
        placeholder: String,
    },

    /// A schema document could not be compiled.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// An environment variable holding a credential is not set.
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential {
        /// The variable that was read.
        var: String,
    },

    /// A configuration or definitions file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration or definitions file could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed (usually a file path).
        what: String,
        /// The parser's message.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid path template error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPathTemplate {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }
}
