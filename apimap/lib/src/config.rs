//! Client configuration.
//!
//! A [`ClientConfig`] describes where requests go and how they are sent. It is
//! loaded from a TOML, YAML or JSON file (chosen by extension), then
//! optionally overridden from the environment:
//!
//! | Variable            | Field        |
//! |---------------------|--------------|
//! | `APIMAP_BASE_URL`   | `base_url`   |
//! | `APIMAP_TIMEOUT_MS` | `timeout_ms` |
//!
//! ## Examples
//!
//! ```rust
//! use apimap_lib::config::ClientConfig;
//!
//! let config: ClientConfig = toml::from_str(r#"
//!     base_url = "https://api.example.com"
//!
//!     [cache]
//!     default_ttl_ms = 500
//! "#).unwrap();
//!
//! assert_eq!(config.timeout_ms, 10_000);
//! assert_eq!(config.cache.default_ttl_ms, 500);
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::ApiAuthMethod;
use crate::cache::CacheConfig;
use crate::error::ConfigError;
use crate::transport::HttpTransport;

pub const BASE_URL_ENV: &str = "APIMAP_BASE_URL";
pub const TIMEOUT_ENV: &str = "APIMAP_TIMEOUT_MS";

const DEFAULT_BASE_URL: &str = "http://localhost/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Serialization format of a configuration or definitions file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Picks the format from a file extension. Unknown extensions are YAML,
    /// which also accepts JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    /// Parses `text` in this format.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Parse`] naming `what` on malformed input.
    pub fn parse<T: DeserializeOwned>(self, text: &str, what: &str) -> Result<T, ConfigError> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|e| ConfigError::parse(what, e)),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| ConfigError::parse(what, e)),
            Self::Toml => toml::from_str(text).map_err(|e| ConfigError::parse(what, e)),
        }
    }
}

/// Reads and parses a file, choosing the format by extension.
pub(crate) fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FileFormat::from_path(path).parse(&text, &path.display().to_string())
}

/// Credential settings.
///
/// The credential itself is never stored in the file; `key_env` names the
/// environment variable holding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub method: ApiAuthMethod,
    pub key_env: Option<String>,
}

/// Settings for the HTTP transport and response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub cache: CacheConfig,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    pub auth: AuthConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache: CacheConfig::default(),
            headers: BTreeMap::new(),
            auth: AuthConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Loads a configuration file.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = read_file(path)?;
        debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Applies overrides from the process environment.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Parse`] if `APIMAP_TIMEOUT_MS` is not an integer.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV).filter(|v| !v.is_empty()) {
            self.timeout_ms = timeout.trim().parse().map_err(|e| ConfigError::parse(TIMEOUT_ENV, e))?;
        }
        Ok(self)
    }

    /// Resolves the configured auth method and its credential.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if the method needs a key and
    /// the named variable is unset.
    pub fn resolve_auth(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<(ApiAuthMethod, String)>, ConfigError> {
        if !self.auth.method.needs_key() {
            return Ok(None);
        }

        let var = self
            .auth
            .key_env
            .clone()
            .unwrap_or_else(|| "APIMAP_API_KEY".to_string());
        let key = lookup(&var).ok_or(ConfigError::MissingCredential { var })?;
        Ok(Some((self.auth.method.clone(), key)))
    }

    /// Builds an [`HttpTransport`] from this configuration, reading the
    /// credential from the process environment.
    ///
    /// ## Errors
    ///
    /// Propagates URL, header, credential and client construction errors.
    pub fn http_transport(&self) -> Result<HttpTransport, ConfigError> {
        let mut builder = HttpTransport::builder(&self.base_url).timeout(self.timeout());
        for (name, value) in &self.headers {
            builder = builder.default_header(name, value)?;
        }
        if let Some((method, key)) = self.resolve_auth(|name| std::env::var(name).ok())? {
            builder = builder.auth(method, key);
        }
        builder.build()
    }
}
