//! Layered error types for the dispatch core.
//!
//! - [`DispatchError`] - Closed taxonomy returned by every dispatch
//! - [`TransportError`] - Network and HTTP status failures
//! - [`ConfigError`] - Endpoint registration and configuration errors
//! - [`UrlError`] - URL chain builder errors

mod config_error;
mod dispatch_error;
mod transport_error;
mod url_error;

pub use config_error::ConfigError;
pub use dispatch_error::DispatchError;
pub use transport_error::{TransportError, TransportErrorKind};
pub use url_error::UrlError;
