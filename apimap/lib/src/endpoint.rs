//! Endpoint specification with a type-state builder.
//!
//! An [`EndpointSpec`] binds a stable key to an HTTP method, a path template
//! and optional request/response schemas. The [`EndpointBuilder`] tracks the
//! required fields in its type parameters, so `build()` only exists once the
//! key, method and path have all been supplied.

use std::fmt;
use std::sync::Arc;

use crate::cache::CachePolicy;
use crate::endpoint_key::EndpointKey;
use crate::error::ConfigError;
use crate::method::RestMethod;
use crate::path::{check_template, placeholders};
use crate::schema::Schema;

/// Builder states.
///
/// A required field is [`Missing`] until it is set; after that the type
/// parameter is the field's value type.
pub mod builder_state {
    /// Marker for a required field that has not been set.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Missing;
}

use builder_state::Missing;

/// A registered endpoint.
///
/// Immutable once built; the registry hands out shared `Arc`s of it.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::{EndpointSpec, RestMethod};
///
/// let spec = EndpointSpec::builder()
///     .key("getUser")
///     .method(RestMethod::Get)
///     .path("/users/:id")
///     .description("Fetch a single user")
///     .build()
///     .unwrap();
///
/// assert_eq!(spec.key().as_str(), "getUser");
/// assert_eq!(spec.placeholders(), vec!["id"]);
/// ```
#[derive(Clone)]
pub struct EndpointSpec {
    key: EndpointKey,
    method: RestMethod,
    path: String,
    request_schema: Option<Arc<dyn Schema>>,
    response_schema: Option<Arc<dyn Schema>>,
    allowed_params: Option<Vec<String>>,
    description: Option<String>,
    cache: CachePolicy,
}

impl EndpointSpec {
    pub fn builder() -> EndpointBuilder<Missing, Missing, Missing> {
        EndpointBuilder::new()
    }

    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// The path template, e.g. `/users/:id`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_schema(&self) -> Option<&dyn Schema> {
        self.request_schema.as_deref()
    }

    pub fn response_schema(&self) -> Option<&dyn Schema> {
        self.response_schema.as_deref()
    }

    /// Declared parameter names, if the endpoint restricts them.
    pub fn allowed_params(&self) -> Option<&[String]> {
        self.allowed_params.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache
    }

    /// Placeholder names of the path template, in template order.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.path)
    }

    /// Returns `true` if successful responses may be served from the cache.
    pub fn is_cacheable(&self) -> bool {
        self.method.is_cacheable() && self.cache != CachePolicy::Disabled
    }
}

impl fmt::Debug for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSpec")
            .field("key", &self.key)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("request_schema", &self.request_schema.is_some())
            .field("response_schema", &self.response_schema.is_some())
            .field("allowed_params", &self.allowed_params)
            .field("description", &self.description)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Type-state builder for [`EndpointSpec`].
///
/// ## Type Parameters
///
/// - `K`: `Missing` or `String` (the key).
/// - `M`: `Missing` or [`RestMethod`].
/// - `P`: `Missing` or `String` (the path template).
pub struct EndpointBuilder<K, M, P> {
    key: K,
    method: M,
    path: P,
    request_schema: Option<Arc<dyn Schema>>,
    response_schema: Option<Arc<dyn Schema>>,
    allowed_params: Option<Vec<String>>,
    description: Option<String>,
    cache: CachePolicy,
}

impl EndpointBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self {
            key: Missing,
            method: Missing,
            path: Missing,
            request_schema: None,
            response_schema: None,
            allowed_params: None,
            description: None,
            cache: CachePolicy::Default,
        }
    }
}

impl Default for EndpointBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, P> EndpointBuilder<Missing, M, P> {
    /// Sets the endpoint key. It is validated by `build()`.
    pub fn key(self, key: impl Into<String>) -> EndpointBuilder<String, M, P> {
        EndpointBuilder {
            key: key.into(),
            method: self.method,
            path: self.path,
            request_schema: self.request_schema,
            response_schema: self.response_schema,
            allowed_params: self.allowed_params,
            description: self.description,
            cache: self.cache,
        }
    }
}

impl<K, P> EndpointBuilder<K, Missing, P> {
    pub fn method(self, method: RestMethod) -> EndpointBuilder<K, RestMethod, P> {
        EndpointBuilder {
            key: self.key,
            method,
            path: self.path,
            request_schema: self.request_schema,
            response_schema: self.response_schema,
            allowed_params: self.allowed_params,
            description: self.description,
            cache: self.cache,
        }
    }
}

impl<K, M> EndpointBuilder<K, M, Missing> {
    /// Sets the path template. Placeholders are written `:name`.
    pub fn path(self, path: impl Into<String>) -> EndpointBuilder<K, M, String> {
        EndpointBuilder {
            key: self.key,
            method: self.method,
            path: path.into(),
            request_schema: self.request_schema,
            response_schema: self.response_schema,
            allowed_params: self.allowed_params,
            description: self.description,
            cache: self.cache,
        }
    }
}

// Optional fields - available in any state
impl<K, M, P> EndpointBuilder<K, M, P> {
    /// Validates the full incoming parameter set before any network call.
    pub fn request_schema(self, schema: impl Schema + 'static) -> Self {
        self.request_schema_arc(Arc::new(schema))
    }

    pub fn request_schema_arc(mut self, schema: Arc<dyn Schema>) -> Self {
        self.request_schema = Some(schema);
        self
    }

    /// Validates the response payload. Without one, payloads pass through raw.
    pub fn response_schema(self, schema: impl Schema + 'static) -> Self {
        self.response_schema_arc(Arc::new(schema))
    }

    pub fn response_schema_arc(mut self, schema: Arc<dyn Schema>) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Declares the parameter names the endpoint accepts.
    ///
    /// Every path placeholder must be among them.
    pub fn allowed_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache = policy;
        self
    }
}

impl EndpointBuilder<String, RestMethod, String> {
    /// Builds the endpoint.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::InvalidEndpointKey`] if the key is malformed.
    /// - [`ConfigError::InvalidPathTemplate`] if a `:` ends a segment without a name.
    /// - [`ConfigError::PlaceholderNotAllowed`] if allowed params are declared
    ///   and a placeholder is not among them.
    pub fn build(self) -> Result<EndpointSpec, ConfigError> {
        let key = EndpointKey::new(self.key)?;
        check_template(&self.path)?;

        if let Some(allowed) = &self.allowed_params
            && let Some(placeholder) = placeholders(&self.path)
                .into_iter()
                .find(|name| !allowed.iter().any(|a| a == name))
        {
            return Err(ConfigError::PlaceholderNotAllowed {
                key: key.to_string(),
                placeholder: placeholder.to_string(),
            });
        }

        Ok(EndpointSpec {
            key,
            method: self.method,
            path: self.path,
            request_schema: self.request_schema,
            response_schema: self.response_schema,
            allowed_params: self.allowed_params,
            description: self.description,
            cache: self.cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::schema::{FnSchema, Issues};
    use serde_json::Value;

    fn pass() -> FnSchema<impl Fn(&Value) -> Result<Value, Issues> + Send + Sync> {
        FnSchema::new(|v: &Value| Ok(v.clone()))
    }

    #[test]
    fn test_builder_basic() {
        let spec = EndpointSpec::builder()
            .key("getUsers")
            .method(RestMethod::Get)
            .path("/users")
            .build()
            .unwrap();

        assert_eq!(spec.key().as_str(), "getUsers");
        assert_eq!(spec.method(), RestMethod::Get);
        assert_eq!(spec.path(), "/users");
        assert!(spec.request_schema().is_none());
        assert!(spec.response_schema().is_none());
        assert_eq!(spec.cache_policy(), CachePolicy::Default);
        assert!(spec.is_cacheable());
    }

    #[test]
    fn test_builder_order_independence() {
        let spec = EndpointSpec::builder()
            .path("/users/:id")
            .response_schema(pass())
            .method(RestMethod::Delete)
            .key("deleteUser")
            .build()
            .unwrap();

        assert_eq!(spec.key().as_str(), "deleteUser");
        assert!(spec.response_schema().is_some());
        assert!(!spec.is_cacheable());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = EndpointSpec::builder()
            .key("1bad")
            .method(RestMethod::Get)
            .path("/x")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpointKey(_)));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let err = EndpointSpec::builder()
            .key("bad")
            .method(RestMethod::Get)
            .path("/x/:")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPathTemplate { .. }));
    }

    #[test]
    fn test_literal_colon_registers() {
        let spec = EndpointSpec::builder()
            .key("getSlot")
            .method(RestMethod::Get)
            .path("/slots/12:30/:room")
            .allowed_params(["room"])
            .build()
            .unwrap();
        assert_eq!(spec.placeholders(), vec!["room"]);
    }

    #[test]
    fn test_placeholder_must_be_allowed() {
        let err = EndpointSpec::builder()
            .key("getPost")
            .method(RestMethod::Get)
            .path("/users/:userId/posts/:postId")
            .allowed_params(["userId"])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PlaceholderNotAllowed { ref placeholder, .. } if placeholder == "postId"
        ));
    }

    #[test]
    fn test_placeholders_without_allowed_list_are_fine() {
        let spec = EndpointSpec::builder()
            .key("getPost")
            .method(RestMethod::Get)
            .path("/users/:userId/posts/:postId")
            .build()
            .unwrap();
        assert_eq!(spec.placeholders(), vec!["userId", "postId"]);
        assert_eq!(spec.allowed_params(), None);
    }

    #[test]
    fn test_disabled_cache_is_not_cacheable() {
        let spec = EndpointSpec::builder()
            .key("getClock")
            .method(RestMethod::Get)
            .path("/clock")
            .cache(CachePolicy::Disabled)
            .build()
            .unwrap();
        assert!(!spec.is_cacheable());

        let ttl = EndpointSpec::builder()
            .key("getClock")
            .method(RestMethod::Get)
            .path("/clock")
            .cache(CachePolicy::Ttl(Duration::from_millis(50)))
            .build()
            .unwrap();
        assert!(ttl.is_cacheable());
    }

    #[test]
    fn test_debug_hides_schema_internals() {
        let spec = EndpointSpec::builder()
            .key("getUsers")
            .method(RestMethod::Get)
            .path("/users")
            .request_schema(pass())
            .build()
            .unwrap();
        let debug = format!("{spec:?}");
        assert!(debug.contains("request_schema: true"));
        assert!(debug.contains("response_schema: false"));
    }
}
