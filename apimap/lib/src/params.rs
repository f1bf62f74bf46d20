//! Parameter partitioning.
//!
//! Callers pass one flat JSON object per call. Before dispatch it is split
//! into three disjoint maps: path parameters (the template's placeholders),
//! query parameters, and body parameters.
//!
//! Routing rules:
//!
//! 1. Keys naming a placeholder go to the path map. Every placeholder must be
//!    present with a non-null, non-empty value; the leftmost missing one is
//!    reported.
//! 2. A key named exactly `query` or `body` whose value is a JSON object is
//!    merged verbatim into that partition, whatever the method. Its entries win
//!    over same-named flat keys.
//! 3. Every other key goes to the query map for GET and DELETE, and to the
//!    body map for POST, PUT and PATCH. This includes `query` / `body` keys
//!    whose value is not an object.

use serde_json::{Map, Value};

use crate::error::DispatchError;
use crate::method::RestMethod;
use crate::path::{param_text, placeholders};

/// A flat parameter object supplied per call.
pub type ParamSet = Map<String, Value>;

/// Reserved key whose object value is merged into the query partition.
pub const QUERY_KEY: &str = "query";

/// Reserved key whose object value is merged into the body partition.
pub const BODY_KEY: &str = "body";

/// A parameter set split by destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedParams {
    pub path: ParamSet,
    pub query: ParamSet,
    pub body: ParamSet,
}

/// Splits `params` for an endpoint with the given method and path template.
///
/// ## Errors
///
/// Returns [`DispatchError::MissingPathParam`] naming the leftmost placeholder
/// without a usable value.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::params::partition;
/// use apimap_lib::RestMethod;
/// use serde_json::json;
///
/// let params = json!({"id": 1, "expand": "posts"}).as_object().cloned().unwrap();
/// let parts = partition(RestMethod::Get, "/users/:id", &params).unwrap();
///
/// assert_eq!(parts.path["id"], json!(1));
/// assert_eq!(parts.query["expand"], json!("posts"));
/// assert!(parts.body.is_empty());
/// ```
pub fn partition(
    method: RestMethod,
    template: &str,
    params: &ParamSet,
) -> Result<PartitionedParams, DispatchError> {
    let names = placeholders(template);

    if let Some(missing) = names
        .iter()
        .find(|name| params.get(**name).and_then(param_text).is_none())
    {
        return Err(DispatchError::missing_path_param(*missing));
    }

    let mut parts = PartitionedParams::default();
    let mut explicit_query = None;
    let mut explicit_body = None;

    for (key, value) in params {
        if names.contains(&key.as_str()) {
            parts.path.insert(key.clone(), value.clone());
            continue;
        }

        match (key.as_str(), value) {
            (QUERY_KEY, Value::Object(map)) => explicit_query = Some(map),
            (BODY_KEY, Value::Object(map)) => explicit_body = Some(map),
            _ if method.has_body() => {
                parts.body.insert(key.clone(), value.clone());
            }
            _ => {
                parts.query.insert(key.clone(), value.clone());
            }
        }
    }

    if let Some(map) = explicit_query {
        parts.query.extend(map.clone());
    }
    if let Some(map) = explicit_body {
        parts.body.extend(map.clone());
    }

    Ok(parts)
}
