use crate::error::UrlError;
use crate::method::RestMethod;
use crate::path::placeholders;

/// A named URL resource: a path, the methods it accepts, and the parameter
/// names it allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    path: String,
    methods: Vec<RestMethod>,
    params: Option<Vec<String>>,
    query_params: Option<Vec<String>>,
}

impl ResourceDefinition {
    pub fn builder() -> ResourceBuilder {
        ResourceBuilder::default()
    }

    /// A GET-only resource.
    pub fn get(path: impl Into<String>) -> ResourceBuilder {
        Self::builder().path(path).methods([RestMethod::Get])
    }

    /// A POST-only resource.
    pub fn post(path: impl Into<String>) -> ResourceBuilder {
        Self::builder().path(path).methods([RestMethod::Post])
    }

    /// A resource accepting GET, POST, PUT and DELETE.
    pub fn crud(path: impl Into<String>) -> ResourceBuilder {
        Self::builder().path(path).methods([
            RestMethod::Get,
            RestMethod::Post,
            RestMethod::Put,
            RestMethod::Delete,
        ])
    }

    /// Path with a leading `/`, e.g. `/users/:id`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> &[RestMethod] {
        &self.methods
    }

    pub fn allows(&self, method: RestMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Allowed path parameter names; `None` allows any.
    pub fn params(&self) -> Option<&[String]> {
        self.params.as_deref()
    }

    /// Allowed query parameter names; `None` forbids query parameters.
    pub fn query_params(&self) -> Option<&[String]> {
        self.query_params.as_deref()
    }

    /// Placeholders of the path, all of which must be supplied.
    pub fn required_params(&self) -> Vec<&str> {
        placeholders(&self.path)
    }
}

/// Builder for [`ResourceDefinition`].
///
/// Duplicate methods and parameter names are dropped, keeping first
/// occurrences.
#[derive(Debug, Clone, Default)]
pub struct ResourceBuilder {
    path: String,
    methods: Vec<RestMethod>,
    params: Vec<String>,
    query_params: Vec<String>,
}

impl ResourceBuilder {
    /// Sets the path; a leading `/` is added if missing.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.is_empty() || path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = RestMethod>) -> Self {
        self.methods = dedup(methods);
        self
    }

    pub fn params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.params = dedup(params.into_iter().map(Into::into));
        self
    }

    pub fn query_params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.query_params = dedup(params.into_iter().map(Into::into));
        self
    }

    /// ## Errors
    ///
    /// Returns [`UrlError::MissingPath`] or [`UrlError::NoMethods`].
    pub fn build(self) -> Result<ResourceDefinition, UrlError> {
        if self.path.is_empty() {
            return Err(UrlError::MissingPath);
        }
        if self.methods.is_empty() {
            return Err(UrlError::NoMethods);
        }

        Ok(ResourceDefinition {
            path: self.path,
            methods: self.methods,
            params: (!self.params.is_empty()).then_some(self.params),
            query_params: (!self.query_params.is_empty()).then_some(self.query_params),
        })
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
