use serde_json::Value;

use crate::params::ParamSet;
use crate::path::{encode_segment, fill};

/// Fixed URL prefix shared by every resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPreset {
    base_url: String,
    version: Option<String>,
    prefix: Option<String>,
}

impl UrlPreset {
    /// Creates a preset; a trailing `/` on the base URL is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.strip_suffix('/').unwrap_or(&base_url).to_string(),
            version: None,
            prefix: None,
        }
    }

    /// API version, rendered as `/v{version}`.
    pub fn version(mut self, version: impl ToString) -> Self {
        self.version = Some(version.to_string()).filter(|v| !v.is_empty());
        self
    }

    /// Path prefix placed after the version, e.g. `api`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Assembles a URL from a preset, path segments, parameters and a query.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::url::{UrlBuilder, UrlPreset};
/// use serde_json::json;
///
/// let url = UrlBuilder::new(UrlPreset::new("https://api.example.com/").version(1))
///     .segments(["users", ":id"])
///     .param("id", json!(7))
///     .query("tags", json!(["a", "b"]))
///     .build();
///
/// assert_eq!(url, "https://api.example.com/v1/users/7?tags[]=a&tags[]=b");
/// ```
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    preset: UrlPreset,
    segments: Vec<String>,
    params: ParamSet,
    query: ParamSet,
    trailing_slash: bool,
}

impl UrlBuilder {
    pub fn new(preset: UrlPreset) -> Self {
        Self {
            preset,
            segments: Vec::new(),
            params: ParamSet::new(),
            query: ParamSet::new(),
            trailing_slash: false,
        }
    }

    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn segments<S: ToString>(mut self, segments: impl IntoIterator<Item = S>) -> Self {
        self.segments.extend(segments.into_iter().map(|s| s.to_string()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn params(mut self, params: ParamSet) -> Self {
        self.params.extend(params);
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: Value) -> Self {
        self.query.insert(name.into(), value);
        self
    }

    pub fn queries(mut self, query: ParamSet) -> Self {
        self.query.extend(query);
        self
    }

    pub fn trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash = enabled;
        self
    }

    /// Renders the URL.
    ///
    /// Placeholders with no matching parameter are left in place.
    pub fn build(&self) -> String {
        let mut url = self.preset.base_url.clone();

        if let Some(version) = &self.preset.version {
            url.push_str("/v");
            url.push_str(version);
        }
        if let Some(prefix) = &self.preset.prefix {
            url.push('/');
            url.push_str(prefix);
        }
        if !self.segments.is_empty() {
            url.push('/');
            url.push_str(&fill(&self.segments.join("/"), &self.params));
        }

        if self.trailing_slash && !url.ends_with('/') {
            url.push('/');
        }

        let query = query_string(&self.query);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        url
    }
}

/// Encodes a query map; nulls are skipped and arrays become `key[]=v` pairs.
fn query_string(query: &ParamSet) -> String {
    let mut parts = Vec::new();

    for (name, value) in query {
        let name = encode_segment(name);
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    parts.push(format!("{name}[]={}", encode_segment(&text(item))));
                }
            }
            other => parts.push(format!("{name}={}", encode_segment(&text(other)))),
        }
    }

    parts.join("&")
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
