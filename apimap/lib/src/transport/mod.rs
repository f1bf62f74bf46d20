//! The transport seam.
//!
//! The dispatcher never talks HTTP itself. It hands a [`TransportRequest`]
//! to a [`Transport`] and gets back a [`TransportResponse`] or a
//! [`TransportError`]. [`HttpTransport`] is the `reqwest` implementation;
//! tests plug in stubs.

mod http;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TransportError;
use crate::method::RestMethod;
use crate::params::ParamSet;

pub use http::{HttpTransport, HttpTransportBuilder};

/// One outgoing call, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: RestMethod,
    /// Resolved path, relative to the transport's base URL (`/users/1`).
    pub path: String,
    pub query: ParamSet,
    /// JSON body; `None` means no body is sent.
    pub body: Option<Value>,
    /// Per-request headers, on top of the transport's defaults.
    pub headers: BTreeMap<String, String>,
}

impl TransportRequest {
    pub fn new(method: RestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: ParamSet::new(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_query(mut self, query: ParamSet) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Decoded body. An empty body is `Null`; a non-JSON body is a `String`.
    pub data: Value,
}

impl TransportResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// A `200 OK` carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }
}

/// Sends resolved requests.
///
/// Implementations must map non-2xx statuses to a [`TransportError`] carrying
/// the status and decoded error payload.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

/// Decodes a response body: empty is `Null`, JSON is parsed, anything else
/// is kept as a string.
pub(crate) fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
