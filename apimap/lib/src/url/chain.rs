use std::collections::BTreeMap;

use serde_json::Value;

use super::builder::{UrlBuilder, UrlPreset};
use super::resource::ResourceDefinition;
use crate::error::UrlError;
use crate::method::RestMethod;
use crate::params::ParamSet;

/// Entry point of the URL chain: a preset plus named resources.
///
/// Each stage of the chain is its own type, so `build()` is only callable
/// once a method has been chosen, and `with_params` only before any query
/// has been added. Every step borrows the previous stage and returns a new
/// one.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::url::{ResourceDefinition, UrlChain, UrlPreset};
/// use serde_json::json;
///
/// let chain = UrlChain::new(
///     UrlPreset::new("https://api.example.com").version(1),
///     [(
///         "user",
///         ResourceDefinition::crud("/users/:id").params(["id"]).query_params(["expand"]).build().unwrap(),
///     )],
/// );
///
/// let url = chain
///     .resource("user").unwrap()
///     .get().unwrap()
///     .with_params(json!({"id": 5}).as_object().cloned().unwrap()).unwrap()
///     .with_query(json!({"expand": "posts"}).as_object().cloned().unwrap()).unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(url, "https://api.example.com/v1/users/5?expand=posts");
/// ```
#[derive(Debug, Clone)]
pub struct UrlChain {
    preset: UrlPreset,
    resources: BTreeMap<String, ResourceDefinition>,
}

impl UrlChain {
    pub fn new<I, S>(preset: UrlPreset, resources: I) -> Self
    where
        I: IntoIterator<Item = (S, ResourceDefinition)>,
        S: Into<String>,
    {
        Self {
            preset,
            resources: resources.into_iter().map(|(name, def)| (name.into(), def)).collect(),
        }
    }

    pub fn preset(&self) -> &UrlPreset {
        &self.preset
    }

    /// Selects a resource by name.
    ///
    /// ## Errors
    ///
    /// Returns [`UrlError::UnknownResource`] if no resource has that name.
    pub fn resource(&self, name: &str) -> Result<ResourceSelected<'_>, UrlError> {
        let resource = self
            .resources
            .get(name)
            .ok_or_else(|| UrlError::UnknownResource(name.to_string()))?;
        Ok(ResourceSelected { chain: self, resource })
    }
}

/// A resource has been selected; choose a method next.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSelected<'a> {
    chain: &'a UrlChain,
    resource: &'a ResourceDefinition,
}

impl<'a> ResourceSelected<'a> {
    /// Selects `method`.
    ///
    /// ## Errors
    ///
    /// Returns [`UrlError::MethodNotAllowed`] if the resource does not accept it.
    pub fn method(&self, method: RestMethod) -> Result<MethodSelected<'a>, UrlError> {
        validate_method(method, self.resource)?;
        Ok(MethodSelected {
            state: ChainState {
                chain: self.chain,
                resource: self.resource,
                method,
                params: ParamSet::new(),
                query: ParamSet::new(),
            },
        })
    }

    pub fn get(&self) -> Result<MethodSelected<'a>, UrlError> {
        self.method(RestMethod::Get)
    }

    pub fn post(&self) -> Result<MethodSelected<'a>, UrlError> {
        self.method(RestMethod::Post)
    }

    pub fn put(&self) -> Result<MethodSelected<'a>, UrlError> {
        self.method(RestMethod::Put)
    }

    pub fn delete(&self) -> Result<MethodSelected<'a>, UrlError> {
        self.method(RestMethod::Delete)
    }

    pub fn patch(&self) -> Result<MethodSelected<'a>, UrlError> {
        self.method(RestMethod::Patch)
    }
}

#[derive(Debug, Clone)]
struct ChainState<'a> {
    chain: &'a UrlChain,
    resource: &'a ResourceDefinition,
    method: RestMethod,
    params: ParamSet,
    query: ParamSet,
}

impl ChainState<'_> {
    fn with_params(&self, params: ParamSet) -> Result<Self, UrlError> {
        validate_params(&params, self.resource)?;
        Ok(Self {
            params,
            ..self.clone()
        })
    }

    fn with_query(&self, query: ParamSet) -> Result<Self, UrlError> {
        validate_query(&query, self.resource)?;
        let mut next = self.clone();
        next.query.extend(query);
        Ok(next)
    }

    fn build(&self) -> Result<String, UrlError> {
        validate_method(self.method, self.resource)?;
        validate_params(&self.params, self.resource)?;
        validate_query(&self.query, self.resource)?;

        Ok(UrlBuilder::new(self.chain.preset.clone())
            .segments(self.resource.path().split('/').filter(|s| !s.is_empty()))
            .params(self.params.clone())
            .queries(self.query.clone())
            .build())
    }
}

/// A method has been chosen; parameters, a query, or `build()` may follow.
#[derive(Debug, Clone)]
pub struct MethodSelected<'a> {
    state: ChainState<'a>,
}

impl<'a> MethodSelected<'a> {
    pub fn method(&self) -> RestMethod {
        self.state.method
    }

    /// Sets the path parameters.
    ///
    /// ## Errors
    ///
    /// Fails on missing required, disallowed, null or empty parameters.
    pub fn with_params(&self, params: ParamSet) -> Result<ParamsSelected<'a>, UrlError> {
        Ok(ParamsSelected {
            state: self.state.with_params(params)?,
        })
    }

    /// Adds query parameters.
    ///
    /// ## Errors
    ///
    /// Fails if the resource takes no query, on disallowed names, or on empty arrays.
    pub fn with_query(&self, query: ParamSet) -> Result<QuerySelected<'a>, UrlError> {
        Ok(QuerySelected {
            state: self.state.with_query(query)?,
        })
    }

    /// Renders the URL.
    ///
    /// ## Errors
    ///
    /// Fails if the resource path has placeholders, since none were supplied.
    pub fn build(&self) -> Result<String, UrlError> {
        self.state.build()
    }
}

/// Path parameters are set; a query or `build()` may follow.
#[derive(Debug, Clone)]
pub struct ParamsSelected<'a> {
    state: ChainState<'a>,
}

impl<'a> ParamsSelected<'a> {
    pub fn with_query(&self, query: ParamSet) -> Result<QuerySelected<'a>, UrlError> {
        Ok(QuerySelected {
            state: self.state.with_query(query)?,
        })
    }

    pub fn build(&self) -> Result<String, UrlError> {
        self.state.build()
    }
}

/// A query has been added; more query or `build()` may follow.
#[derive(Debug, Clone)]
pub struct QuerySelected<'a> {
    state: ChainState<'a>,
}

impl<'a> QuerySelected<'a> {
    /// Merges more query parameters; later values win.
    pub fn with_query(&self, query: ParamSet) -> Result<QuerySelected<'a>, UrlError> {
        Ok(QuerySelected {
            state: self.state.with_query(query)?,
        })
    }

    pub fn build(&self) -> Result<String, UrlError> {
        self.state.build()
    }
}

fn validate_method(method: RestMethod, resource: &ResourceDefinition) -> Result<(), UrlError> {
    if resource.allows(method) {
        return Ok(());
    }
    Err(UrlError::MethodNotAllowed {
        method,
        allowed: resource
            .methods()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn validate_params(params: &ParamSet, resource: &ResourceDefinition) -> Result<(), UrlError> {
    let missing: Vec<String> = resource
        .required_params()
        .into_iter()
        .filter(|name| !params.contains_key(*name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(UrlError::MissingParams(missing));
    }

    if let Some(allowed) = resource.params() {
        let invalid: Vec<String> = params
            .keys()
            .filter(|name| !allowed.contains(*name))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(UrlError::InvalidParams {
                invalid,
                allowed: allowed.to_vec(),
            });
        }
    }

    for (name, value) in params {
        if value.is_null() || value.as_str().is_some_and(str::is_empty) {
            return Err(UrlError::EmptyParam(name.clone()));
        }
    }

    Ok(())
}

fn validate_query(query: &ParamSet, resource: &ResourceDefinition) -> Result<(), UrlError> {
    let Some(allowed) = resource.query_params() else {
        return if query.is_empty() {
            Ok(())
        } else {
            Err(UrlError::QueryNotAllowed)
        };
    };

    let invalid: Vec<String> = query
        .keys()
        .filter(|name| !allowed.contains(*name))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(UrlError::InvalidQuery {
            invalid,
            allowed: allowed.to_vec(),
        });
    }

    for (name, value) in query {
        if matches!(value, Value::Array(items) if items.is_empty()) {
            return Err(UrlError::EmptyQueryArray(name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ParamSet {
        value.as_object().cloned().unwrap()
    }

    fn chain() -> UrlChain {
        UrlChain::new(
            UrlPreset::new("https://api.example.com/").version(1).prefix("api"),
            [
                (
                    "users",
                    ResourceDefinition::builder()
                        .path("users")
                        .methods([RestMethod::Get, RestMethod::Post])
                        .query_params(["page", "role", "ids"])
                        .build()
                        .unwrap(),
                ),
                (
                    "post",
                    ResourceDefinition::builder()
                        .path("/users/:userId/posts/:postId")
                        .methods([RestMethod::Get, RestMethod::Delete])
                        .params(["userId", "postId"])
                        .build()
                        .unwrap(),
                ),
            ],
        )
    }

    #[test]
    fn test_simple_get() {
        let url = chain().resource("users").unwrap().get().unwrap().build().unwrap();
        assert_eq!(url, "https://api.example.com/v1/api/users");
    }

    #[test]
    fn test_params_substituted() {
        let chain = chain();
        let url = chain
            .resource("post")
            .unwrap()
            .delete()
            .unwrap()
            .with_params(map(json!({"userId": 1, "postId": "a b"})))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(url, "https://api.example.com/v1/api/users/1/posts/a%20b");
    }

    #[test]
    fn test_query_merges_across_calls() {
        let chain = chain();
        let url = chain
            .resource("users")
            .unwrap()
            .get()
            .unwrap()
            .with_query(map(json!({"page": 1})))
            .unwrap()
            .with_query(map(json!({"page": 2, "ids": [3, 4]})))
            .unwrap()
            .build()
            .unwrap();

        let (_, query) = url.split_once('?').unwrap();
        let mut pairs: Vec<&str> = query.split('&').collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec!["ids[]=3", "ids[]=4", "page=2"]);
    }

    #[test]
    fn test_steps_do_not_mutate_previous_stage() {
        let chain = chain();
        let get = chain.resource("users").unwrap().get().unwrap();
        let _with_query = get.with_query(map(json!({"page": 9}))).unwrap();
        assert_eq!(get.build().unwrap(), "https://api.example.com/v1/api/users");
    }

    #[test]
    fn test_unknown_resource() {
        assert_eq!(
            chain().resource("nope").unwrap_err(),
            UrlError::UnknownResource("nope".into())
        );
    }

    #[test]
    fn test_method_not_allowed() {
        let chain = chain();
        let err = chain.resource("users").unwrap().put().unwrap_err();
        assert_eq!(
            err,
            UrlError::MethodNotAllowed {
                method: RestMethod::Put,
                allowed: "GET, POST".into()
            }
        );
    }

    #[test]
    fn test_build_without_required_params_fails() {
        let chain = chain();
        let err = chain.resource("post").unwrap().get().unwrap().build().unwrap_err();
        assert_eq!(err, UrlError::MissingParams(vec!["userId".into(), "postId".into()]));
    }

    #[test]
    fn test_invalid_and_empty_params() {
        let chain = chain();
        let get = chain.resource("post").unwrap().get().unwrap();

        let err = get
            .with_params(map(json!({"userId": 1, "postId": 2, "extra": 3})))
            .unwrap_err();
        assert!(matches!(err, UrlError::InvalidParams { ref invalid, .. } if invalid == &vec!["extra".to_string()]));

        let err = get.with_params(map(json!({"userId": "", "postId": 2}))).unwrap_err();
        assert_eq!(err, UrlError::EmptyParam("userId".into()));

        let err = get.with_params(map(json!({"userId": null, "postId": 2}))).unwrap_err();
        assert_eq!(err, UrlError::EmptyParam("userId".into()));
    }

    #[test]
    fn test_query_rules() {
        let chain = chain();

        let err = chain
            .resource("post")
            .unwrap()
            .get()
            .unwrap()
            .with_query(map(json!({"page": 1})))
            .unwrap_err();
        assert_eq!(err, UrlError::QueryNotAllowed);

        let users = chain.resource("users").unwrap().get().unwrap();
        let err = users.with_query(map(json!({"sort": "name"}))).unwrap_err();
        assert!(matches!(err, UrlError::InvalidQuery { .. }));

        let err = users.with_query(map(json!({"ids": []}))).unwrap_err();
        assert_eq!(err, UrlError::EmptyQueryArray("ids".into()));
    }
}
