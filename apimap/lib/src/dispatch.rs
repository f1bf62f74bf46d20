//! The dispatch core.
//!
//! A [`Dispatcher`] turns `(endpoint key, params)` into a validated result.
//! Each call runs one sequential pipeline:
//!
//! ```text
//! lookup -> partition -> path_resolve -> request_validate -> cache_check
//!        -> transport -> response_validate -> cache_store -> done
//! ```
//!
//! Any stage may fail; the failure is returned as a [`DispatchError`] and
//! logged with the stage it came from. The transport call is the only
//! suspension point. Nothing is retried.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::Display;
use tracing::{Span, debug, instrument};

use crate::cache::{ResponseCache, cache_key};
use crate::config::ClientConfig;
use crate::error::{ConfigError, DispatchError};
use crate::params::{ParamSet, partition};
use crate::path::resolve;
use crate::registry::Registry;
use crate::schema::{Issue, Issues, validate_request, validate_response};
use crate::transport::{HttpTransport, Transport, TransportRequest};

/// Pipeline stage, used to tag failures in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
enum Stage {
    Lookup,
    Partition,
    PathResolve,
    RequestValidate,
    Transport,
    ResponseValidate,
}

fn at<V>(stage: Stage, result: Result<V, DispatchError>) -> Result<V, DispatchError> {
    if let Err(err) = &result {
        debug!(stage = %stage, error = %err, "dispatch failed");
    }
    result
}

/// Dispatches calls to registered endpoints.
///
/// The registry and cache are shared handles: several dispatchers (or clones
/// of one) may use the same cache, and invalidation through any of them is
/// seen by all.
///
/// ## Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use apimap_lib::{definitions, Dispatcher, HttpTransport, ResponseCache};
/// use serde_json::json;
///
/// let dispatcher = Dispatcher::new(
///     Arc::new(definitions::user_registry()?),
///     Arc::new(ResponseCache::default()),
///     HttpTransport::new("https://api.example.com")?,
/// );
///
/// let params = json!({"id": 1}).as_object().cloned().unwrap();
/// let user: definitions::User = dispatcher.dispatch_as("getUser", params).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    registry: Arc<Registry>,
    cache: Arc<ResponseCache>,
    transport: T,
}

impl Dispatcher<HttpTransport> {
    /// Builds a dispatcher over HTTP from a client configuration.
    ///
    /// The cache's background sweeper is started on the current tokio
    /// runtime, evicting expired entries every `cache.cleanup_interval_ms`.
    /// Outside a runtime the cache still expires entries lazily on read.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP transport cannot be built.
    pub fn from_config(registry: Arc<Registry>, config: &ClientConfig) -> Result<Self, ConfigError> {
        let transport = config.http_transport()?;
        let cache = Arc::new(ResponseCache::new(config.cache));
        cache.start_sweeper();
        Ok(Self::new(registry, cache, transport))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(registry: Arc<Registry>, cache: Arc<ResponseCache>, transport: T) -> Self {
        Self {
            registry,
            cache,
            transport,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Calls the endpoint registered under `key`.
    ///
    /// ## Errors
    ///
    /// Returns the [`DispatchError`] of the first stage that failed.
    pub async fn dispatch(&self, key: &str, params: ParamSet) -> Result<Value, DispatchError> {
        self.dispatch_with_cancel(key, params, std::future::pending()).await
    }

    /// Calls the endpoint and decodes the validated result into `R`.
    ///
    /// ## Errors
    ///
    /// As [`dispatch`](Self::dispatch); a result that does not decode into `R`
    /// is a [`DispatchError::ResponseValidation`] with a single root issue.
    pub async fn dispatch_as<R: DeserializeOwned>(&self, key: &str, params: ParamSet) -> Result<R, DispatchError> {
        let value = self.dispatch(key, params).await?;
        serde_json::from_value(value.clone()).map_err(|e| DispatchError::ResponseValidation {
            endpoint: key.to_string(),
            issues: Issues::from(vec![Issue::root(e.to_string())]),
            payload: value,
        })
    }

    /// Calls the endpoint, giving up if `cancel` completes first.
    ///
    /// Cancellation is only observed while the transport call is in flight;
    /// a cancelled call returns [`DispatchError::Cancelled`] and writes
    /// nothing to the cache.
    ///
    /// ## Errors
    ///
    /// Returns the [`DispatchError`] of the first stage that failed.
    #[instrument(
        name = "dispatch",
        skip(self, params, cancel),
        fields(
            api.endpoint = key,
            http.method = tracing::field::Empty,
            cache.hit = tracing::field::Empty,
        )
    )]
    pub async fn dispatch_with_cancel<C>(
        &self,
        key: &str,
        params: ParamSet,
        cancel: C,
    ) -> Result<Value, DispatchError>
    where
        C: Future<Output = ()>,
    {
        let spec = at(Stage::Lookup, self.registry.lookup(key))?;
        let method = spec.method();
        Span::current().record("http.method", method.to_string().as_str());

        let mut parts = at(Stage::Partition, partition(method, spec.path(), &params))?;
        let mut path = at(Stage::PathResolve, resolve(spec.path(), &parts.path))?;
        let validated = at(
            Stage::RequestValidate,
            validate_request(spec.request_schema(), &params),
        )?;

        // A request schema may normalise the parameters; route what it returned.
        let params = match validated {
            Value::Object(normalised) if normalised != params => {
                parts = at(Stage::Partition, partition(method, spec.path(), &normalised))?;
                path = at(Stage::PathResolve, resolve(spec.path(), &parts.path))?;
                normalised
            }
            _ => params,
        };

        let cache_entry = spec.is_cacheable().then(|| cache_key(key, &params));
        if let Some(entry) = &cache_entry {
            if let Some(hit) = self.cache.get(entry) {
                Span::current().record("cache.hit", true);
                debug!(cache.key = %entry, "cache hit");
                return Ok(hit);
            }
            Span::current().record("cache.hit", false);
        }

        let body = (method.has_body() || !parts.body.is_empty()).then(|| Value::Object(parts.body));
        let request = TransportRequest {
            method,
            path,
            query: parts.query,
            body,
            headers: Default::default(),
        };

        let response = tokio::select! {
            biased;
            () = cancel => {
                debug!("dispatch cancelled during transport");
                return Err(DispatchError::Cancelled);
            }
            response = self.transport.send(request) => {
                at(Stage::Transport, response.map_err(DispatchError::from))?
            }
        };

        let data = at(
            Stage::ResponseValidate,
            validate_response(key, spec.response_schema(), response.data),
        )?;

        if let Some(entry) = cache_entry
            && let Some(ttl) = spec.cache_policy().store_ttl(self.cache.default_ttl())
        {
            debug!(cache.key = %entry, ttl = ?ttl, "cache store");
            self.cache.set(entry, data.clone(), ttl);
        }

        Ok(data)
    }

    /// Drops every cached response of `key`. Returns how many were removed.
    pub fn invalidate(&self, key: &str) -> usize {
        self.cache.delete_by_endpoint(key)
    }

    /// Drops the cached response of one call.
    pub fn invalidate_call(&self, key: &str, params: &ParamSet) -> bool {
        self.cache.delete(key, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CachePolicy};
    use crate::endpoint::EndpointSpec;
    use crate::error::TransportError;
    use crate::method::RestMethod;
    use crate::transport::TransportResponse;
    use serde_json::json;
    use std::time::Duration;

    struct Echo;

    impl Transport for Echo {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse::ok(json!({ "path": request.path })))
        }
    }

    fn echo_dispatcher() -> Dispatcher<Echo> {
        let registry = Registry::from_table([EndpointSpec::builder()
            .key("getThing")
            .method(RestMethod::Get)
            .path("/things/:id")
            .build()
            .unwrap()])
        .unwrap();
        Dispatcher::new(Arc::new(registry), Arc::new(ResponseCache::default()), Echo)
    }

    fn id(n: u64) -> ParamSet {
        json!({ "id": n }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Lookup.to_string(), "lookup");
        assert_eq!(Stage::PathResolve.to_string(), "path_resolve");
        assert_eq!(Stage::ResponseValidate.to_string(), "response_validate");
    }

    #[test]
    fn test_at_passes_results_through() {
        assert_eq!(at(Stage::Lookup, Ok::<_, DispatchError>(3)).unwrap(), 3);
        let err = at::<()>(Stage::Transport, Err(DispatchError::Cancelled)).unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_cache_hit_and_store_are_logged() {
        let dispatcher = echo_dispatcher();

        let first = dispatcher.dispatch("getThing", id(7)).await.unwrap();
        assert!(logs_contain("cache store"));
        assert!(!logs_contain("cache hit"));

        let second = dispatcher.dispatch("getThing", id(7)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, json!({ "path": "/things/7" }));
        assert!(logs_contain("cache hit"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_cache_store_logs_sub_millisecond_ttl() {
        let registry = Registry::from_table([EndpointSpec::builder()
            .key("getTick")
            .method(RestMethod::Get)
            .path("/ticks/:id")
            .cache(CachePolicy::Ttl(Duration::from_micros(1_500)))
            .build()
            .unwrap()])
        .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(ResponseCache::default()), Echo);

        dispatcher.dispatch("getTick", id(1)).await.unwrap();
        assert!(logs_contain("ttl=Some(1.5ms)"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_failure_is_logged_with_stage() {
        let dispatcher = echo_dispatcher();

        let err = dispatcher.dispatch("getThing", ParamSet::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingPathParam { .. }));
        assert!(logs_contain("dispatch failed"));
        assert!(logs_contain("partition"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_cancel_is_logged() {
        let dispatcher = echo_dispatcher();

        let err = dispatcher
            .dispatch_with_cancel("getThing", id(1), std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
        assert!(logs_contain("dispatch cancelled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config_sweeps_expired_entries() {
        let config = ClientConfig {
            cache: CacheConfig {
                default_ttl_ms: 3_000,
                cleanup_interval_ms: 10,
            },
            ..ClientConfig::default()
        };
        let dispatcher = Dispatcher::from_config(Arc::new(Registry::new()), &config).unwrap();
        assert!(dispatcher.cache().is_sweeping());

        for n in 0..50 {
            dispatcher
                .cache()
                .set(cache_key("getThing", &id(n)), json!(n), Some(Duration::from_millis(1)));
        }
        dispatcher.cache().set("getThing:pinned", json!("kept"), None);
        assert_eq!(dispatcher.cache().len(), 51);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(dispatcher.cache().len(), 1);
        assert_eq!(dispatcher.cache().get("getThing:pinned"), Some(json!("kept")));
    }
}
