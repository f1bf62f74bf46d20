//! Request and response validation.
//!
//! Schema semantics are delegated to a [`Schema`] implementation. The crate
//! ships [`JsonSchema`] (JSON Schema documents compiled with the `jsonschema`
//! crate) and [`FnSchema`] (hand-written closures). Both report failures as a
//! list of field-level [`Issue`]s rather than a flat string.

mod json_schema;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::DispatchError;
use crate::params::ParamSet;

pub use json_schema::JsonSchema;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Dotted path to the offending field (`address.city`, `items.0.id`).
    /// Empty for the root value.
    pub path: String,
    /// What was wrong.
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// An issue about the value as a whole.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// The issues reported by one failed validation, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the issue reported for `path`, if any.
    pub fn at(&self, path: &str) -> Option<&Issue> {
        self.0.iter().find(|issue| issue.path == path)
    }

    pub fn into_vec(self) -> Vec<Issue> {
        self.0
    }
}

impl From<Vec<Issue>> for Issues {
    fn from(issues: Vec<Issue>) -> Self {
        Self(issues)
    }
}

impl FromIterator<Issue> for Issues {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Capability to validate a JSON value.
///
/// On success the validated value is returned; implementations may normalise
/// it (fill defaults, coerce), but must not change its shape otherwise.
/// The dispatcher partitions and sends a normalised request object, and
/// caches and returns a normalised response.
pub trait Schema: Send + Sync {
    fn validate(&self, value: &Value) -> Result<Value, Issues>;
}

/// A [`Schema`] backed by a closure.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::schema::{FnSchema, Issue, Issues, Schema};
/// use serde_json::json;
///
/// let positive = FnSchema::new(|value: &serde_json::Value| match value.as_i64() {
///     Some(n) if n > 0 => Ok(value.clone()),
///     _ => Err(Issues::from(vec![Issue::root("expected a positive integer")])),
/// });
///
/// assert!(positive.validate(&json!(3)).is_ok());
/// assert!(positive.validate(&json!(-1)).is_err());
/// ```
pub struct FnSchema<F>(F);

impl<F> FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, Issues> + Send + Sync,
{
    pub fn new(validate: F) -> Self {
        Self(validate)
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, Issues> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<Value, Issues> {
        (self.0)(value)
    }
}

/// Validates the full incoming parameter set against a request schema.
///
/// A missing schema is a pass-through.
///
/// ## Errors
///
/// Returns [`DispatchError::RequestValidation`] carrying the schema's issues.
pub fn validate_request(schema: Option<&dyn Schema>, params: &ParamSet) -> Result<Value, DispatchError> {
    let params = Value::Object(params.clone());
    let Some(schema) = schema else {
        return Ok(params);
    };

    match schema.validate(&params) {
        Ok(value) => Ok(value),
        Err(issues) => {
            warn!(issue_count = issues.len(), "request failed schema validation");
            Err(DispatchError::RequestValidation { issues })
        }
    }
}

/// Validates a response payload against a response schema.
///
/// A missing schema passes the raw payload through unchanged.
///
/// ## Errors
///
/// Returns [`DispatchError::ResponseValidation`] carrying the schema's issues
/// and the raw payload.
pub fn validate_response(
    endpoint: &str,
    schema: Option<&dyn Schema>,
    payload: Value,
) -> Result<Value, DispatchError> {
    let Some(schema) = schema else {
        return Ok(payload);
    };

    match schema.validate(&payload) {
        Ok(value) => Ok(value),
        Err(issues) => {
            warn!(
                api.endpoint = endpoint,
                issue_count = issues.len(),
                "response failed schema validation"
            );
            Err(DispatchError::ResponseValidation {
                endpoint: endpoint.to_string(),
                issues,
                payload,
            })
        }
    }
}
