//! Endpoint definitions files.
//!
//! A definitions file lists endpoint rows with JSON Schema documents for the
//! request and response sides:
//!
//! ```yaml
//! endpoints:
//!   - key: getUser
//!     method: GET
//!     path: /users/:id
//!     allowed_params: [id]
//!     cache: 5000          # ms, or one of: default, no_expiry, disabled
//!     request_schema:
//!       type: object
//!       required: [id]
//!     response_schema:
//!       type: object
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::Registry;
use crate::cache::CachePolicy;
use crate::config::{FileFormat, read_file};
use crate::endpoint::EndpointSpec;
use crate::endpoint_key::EndpointKey;
use crate::error::ConfigError;
use crate::method::RestMethod;
use crate::schema::JsonSchema;

/// A parsed definitions file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionsFile {
    #[serde(default)]
    pub endpoints: Vec<EndpointRow>,
}

/// One endpoint as written in a definitions file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRow {
    pub key: EndpointKey,
    pub method: RestMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_params: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// Cache setting of a row: a TTL in milliseconds or a named mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheSetting {
    TtlMs(u64),
    Mode(CacheMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Default,
    NoExpiry,
    Disabled,
}

impl From<CacheSetting> for CachePolicy {
    fn from(setting: CacheSetting) -> Self {
        match setting {
            CacheSetting::TtlMs(ms) => CachePolicy::Ttl(Duration::from_millis(ms)),
            CacheSetting::Mode(CacheMode::Default) => CachePolicy::Default,
            CacheSetting::Mode(CacheMode::NoExpiry) => CachePolicy::NoExpiry,
            CacheSetting::Mode(CacheMode::Disabled) => CachePolicy::Disabled,
        }
    }
}

impl EndpointRow {
    /// Compiles the row's schemas and builds its specification.
    ///
    /// ## Errors
    ///
    /// Returns the first template, placeholder or schema error. Keys are
    /// checked when the row is deserialized.
    pub fn into_spec(self) -> Result<EndpointSpec, ConfigError> {
        let mut builder = EndpointSpec::builder()
            .key(self.key)
            .method(self.method)
            .path(self.path)
            .cache(self.cache.map(CachePolicy::from).unwrap_or_default());

        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        if let Some(allowed) = self.allowed_params {
            builder = builder.allowed_params(allowed);
        }
        if let Some(document) = self.request_schema {
            builder = builder.request_schema(JsonSchema::new(document)?);
        }
        if let Some(document) = self.response_schema {
            builder = builder.response_schema(JsonSchema::new(document)?);
        }

        builder.build()
    }
}

impl Registry {
    /// Loads a registry from a definitions file (YAML, JSON or TOML by
    /// extension).
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Read`] / [`ConfigError::Parse`] for unreadable
    /// files, and any registration error raised by a row.
    pub fn from_definitions_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let definitions: DefinitionsFile = read_file(path)?;
        let registry = Self::from_definitions(definitions)?;
        info!(path = %path.display(), endpoints = registry.len(), "loaded endpoint definitions");
        Ok(registry)
    }

    /// Loads a registry from definitions text in the given format.
    pub fn from_definitions_str(text: &str, format: FileFormat) -> Result<Self, ConfigError> {
        Self::from_definitions(format.parse(text, "endpoint definitions")?)
    }

    /// Builds a registry from parsed definitions.
    pub fn from_definitions(definitions: DefinitionsFile) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for row in definitions.endpoints {
            registry.register(row.into_spec()?)?;
        }
        Ok(registry)
    }
}
