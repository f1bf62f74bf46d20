//! The endpoint registry.
//!
//! Maps endpoint keys to their [`EndpointSpec`]s. A registry is populated at
//! startup (from a static table, a definitions file, or individual
//! [`register`](Registry::register) calls) and is read-only afterwards, so it
//! can be shared across tasks as an `Arc<Registry>` without locking.

mod file;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use tracing::debug;

use crate::endpoint::EndpointSpec;
use crate::endpoint_key::EndpointKey;
use crate::error::{ConfigError, DispatchError};

pub use file::{CacheMode, CacheSetting, DefinitionsFile, EndpointRow};

/// Endpoint specifications by key.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::{EndpointSpec, Registry, RestMethod};
///
/// let registry = Registry::from_table([
///     EndpointSpec::builder().key("getUsers").method(RestMethod::Get).path("/users").build().unwrap(),
///     EndpointSpec::builder().key("getUser").method(RestMethod::Get).path("/users/:id").build().unwrap(),
/// ])
/// .unwrap();
///
/// assert_eq!(registry.lookup("getUser").unwrap().path(), "/users/:id");
/// assert!(registry.lookup("nope").is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Registry {
    endpoints: BTreeMap<EndpointKey, Arc<EndpointSpec>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a startup table.
    ///
    /// ## Errors
    ///
    /// Fails on the first duplicate key or invalid specification.
    pub fn from_table<I>(table: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = EndpointSpec>,
    {
        let mut registry = Self::new();
        for spec in table {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Adds an endpoint.
    ///
    /// Path placeholders have already been checked against the allowed
    /// params by [`EndpointBuilder::build`](crate::endpoint::EndpointBuilder::build).
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::DuplicateEndpoint`] if the key is already registered.
    pub fn register(&mut self, spec: EndpointSpec) -> Result<(), ConfigError> {
        match self.endpoints.entry(spec.key().clone()) {
            Entry::Occupied(entry) => Err(ConfigError::DuplicateEndpoint {
                key: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                debug!(api.endpoint = %spec.key(), http.method = %spec.method(), path = spec.path(), "registered endpoint");
                entry.insert(Arc::new(spec));
                Ok(())
            }
        }
    }

    /// Returns the specification registered under `key`.
    ///
    /// ## Errors
    ///
    /// Returns [`DispatchError::UnknownEndpoint`] if nothing is registered.
    pub fn lookup(&self, key: &str) -> Result<Arc<EndpointSpec>, DispatchError> {
        self.get(key).cloned().ok_or_else(|| DispatchError::UnknownEndpoint {
            key: key.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Arc<EndpointSpec>> {
        self.endpoints.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.endpoints.contains_key(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &EndpointKey> {
        self.endpoints.keys()
    }

    /// Registered specifications in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EndpointSpec>> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::RestMethod;

    fn spec(key: &str, method: RestMethod, path: &str) -> EndpointSpec {
        EndpointSpec::builder()
            .key(key)
            .method(method)
            .path(path)
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_known_and_unknown() {
        let registry = Registry::from_table([spec("getUser", RestMethod::Get, "/users/:id")]).unwrap();

        let found = registry.lookup("getUser").unwrap();
        assert_eq!(found.method(), RestMethod::Get);

        let err = registry.lookup("getUserz").unwrap_err();
        assert!(matches!(err, DispatchError::UnknownEndpoint { ref key } if key == "getUserz"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = Registry::new();
        registry.register(spec("getUsers", RestMethod::Get, "/users")).unwrap();

        let err = registry
            .register(spec("getUsers", RestMethod::Post, "/users"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEndpoint { ref key } if key == "getUsers"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("getUsers").unwrap().method(), RestMethod::Get);
    }

    #[test]
    fn test_keys_are_sorted() {
        let registry = Registry::from_table([
            spec("updateUser", RestMethod::Put, "/users/:id"),
            spec("createUser", RestMethod::Post, "/users"),
            spec("getUsers", RestMethod::Get, "/users"),
        ])
        .unwrap();

        let keys: Vec<&str> = registry.keys().map(EndpointKey::as_str).collect();
        assert_eq!(keys, vec!["createUser", "getUsers", "updateUser"]);
        assert_eq!(registry.iter().count(), 3);
        assert!(!registry.is_empty());
        assert!(registry.contains("createUser"));
    }

    #[test]
    fn test_lookup_shares_the_same_spec() {
        let registry = Registry::from_table([spec("getUsers", RestMethod::Get, "/users")]).unwrap();
        let a = registry.lookup("getUsers").unwrap();
        let b = registry.lookup("getUsers").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
