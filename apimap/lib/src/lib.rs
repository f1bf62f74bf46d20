//! Typed endpoint registry and dispatch core for JSON REST APIs.
//!
//! Callers name an endpoint and pass a flat parameter object; the dispatcher
//! looks the endpoint up, splits the parameters into path, query and body,
//! validates them, sends the request, validates the response, and returns it.
//!
//! ## Features
//!
//! - **Registry of named endpoints**: method, `:name` path template, optional
//!   request/response schemas, loaded from code or a definitions file
//! - **Schema validation**: JSON Schema via `jsonschema`, or hand-written
//!   validators, reporting field-level issues
//! - **Short-TTL response cache** for GET endpoints, with explicit invalidation
//! - **Pluggable transport**: `reqwest`-backed [`HttpTransport`] or any
//!   [`Transport`] implementation
//! - **Closed error taxonomy**: every failure is a [`DispatchError`]
//! - **URL chain builder** for validated URL strings
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use apimap_lib::{definitions, Dispatcher, HttpTransport, ResponseCache};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(
//!     Arc::new(definitions::user_registry()?),
//!     Arc::new(ResponseCache::default()),
//!     HttpTransport::new("https://api.example.com")?,
//! );
//!
//! let params = json!({"id": 1}).as_object().cloned().unwrap();
//! let user = dispatcher.dispatch("getUser", params).await?;
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod definitions;
pub mod dispatch;
pub mod endpoint;
pub mod endpoint_key;
pub mod error;
pub mod method;
pub mod params;
pub mod path;
pub mod registry;
pub mod schema;
pub mod transport;
pub mod url;

// Re-exports for convenience
pub use auth::ApiAuthMethod;
pub use cache::{CacheConfig, CachePolicy, ResponseCache, cache_key};
pub use config::ClientConfig;
pub use dispatch::Dispatcher;
pub use endpoint::{EndpointBuilder, EndpointSpec};
pub use endpoint_key::{EndpointKey, EndpointKeyError};
pub use error::{ConfigError, DispatchError, TransportError, TransportErrorKind, UrlError};
pub use method::RestMethod;
pub use params::{ParamSet, PartitionedParams};
pub use registry::Registry;
pub use schema::{FnSchema, Issue, Issues, JsonSchema, Schema};
pub use transport::{HttpTransport, HttpTransportBuilder, Transport, TransportRequest, TransportResponse};
