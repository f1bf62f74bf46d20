//! Deterministic cache keys.

use serde_json::Value;

use crate::params::ParamSet;

/// Builds the cache key for a call: `"{endpoint}:{canonical-json}"`.
///
/// Object keys are sorted at every depth, so two parameter sets holding the
/// same pairs in a different insertion order map to the same key.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::cache::cache_key;
/// use serde_json::json;
///
/// let a = json!({"page": 1, "role": "admin"}).as_object().cloned().unwrap();
/// assert_eq!(cache_key("getUsers", &a), r#"getUsers:{"page":1,"role":"admin"}"#);
/// ```
pub fn cache_key(endpoint: &str, params: &ParamSet) -> String {
    let mut key = String::with_capacity(endpoint.len() + 64);
    key.push_str(endpoint);
    key.push(':');
    write_object(params, &mut key);
    key
}

/// Prefix shared by every key of one endpoint.
pub(crate) fn endpoint_prefix(endpoint: &str) -> String {
    format!("{endpoint}:")
}

fn write_object(map: &ParamSet, out: &mut String) {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (name, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(name.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
