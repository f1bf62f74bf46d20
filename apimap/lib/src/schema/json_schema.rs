use std::fmt;

use serde_json::Value;

use super::{Issue, Issues, Schema};
use crate::error::ConfigError;

/// A compiled JSON Schema document.
///
/// The document is compiled once at construction and shared read-only by
/// every dispatch that validates against it. Format keywords (`email`,
/// `date-time`, ...) are enforced.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::schema::{JsonSchema, Schema};
/// use serde_json::json;
///
/// let schema = JsonSchema::new(json!({
///     "type": "object",
///     "properties": { "id": { "type": "number" } },
///     "required": ["id"]
/// })).unwrap();
///
/// assert!(schema.validate(&json!({"id": 1})).is_ok());
///
/// let issues = schema.validate(&json!({"id": "x"})).unwrap_err();
/// assert_eq!(issues.iter().next().unwrap().path, "id");
/// ```
pub struct JsonSchema {
    document: Value,
    validator: jsonschema::Validator,
}

impl JsonSchema {
    /// Compiles a JSON Schema document.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidSchema`] if the document is not a valid schema.
    pub fn new(document: Value) -> Result<Self, ConfigError> {
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&document)
            .map_err(|e| ConfigError::InvalidSchema(e.to_string()))?;

        Ok(Self {
            document,
            validator,
        })
    }

    /// Returns the source document.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: &Value) -> Result<Value, Issues> {
        let issues: Issues = self
            .validator
            .iter_errors(value)
            .map(|error| Issue::new(pointer_to_path(&error.instance_path.to_string()), error.to_string()))
            .collect();

        if issues.is_empty() {
            Ok(value.clone())
        } else {
            Err(issues)
        }
    }
}

/// Converts a JSON pointer (`/items/0/id`) into a dotted path (`items.0.id`).
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> JsonSchema {
        JsonSchema::new(json!({
            "type": "object",
            "properties": {
                "id": { "type": "number" },
                "name": { "type": "string" },
                "email": { "type": "string", "format": "email" },
                "address": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } }
                }
            },
            "required": ["id", "name", "email"]
        }))
        .unwrap()
    }

    #[test]
    fn test_pointer_to_path() {
        assert_eq!(pointer_to_path(""), "");
        assert_eq!(pointer_to_path("/name"), "name");
        assert_eq!(pointer_to_path("/items/0/id"), "items.0.id");
        assert_eq!(pointer_to_path("/a~1b/c~0d"), "a/b.c~d");
    }

    #[test]
    fn test_valid_value_is_returned_unchanged() {
        let value = json!({"id": 1, "name": "John", "email": "john@example.com"});
        assert_eq!(user_schema().validate(&value).unwrap(), value);
    }

    #[test]
    fn test_nested_issue_path() {
        let value = json!({
            "id": 1,
            "name": "John",
            "email": "john@example.com",
            "address": { "city": 7 }
        });
        let issues = user_schema().validate(&value).unwrap_err();
        assert!(issues.at("address.city").is_some());
    }

    #[test]
    fn test_missing_required_reported_at_root() {
        let issues = user_schema().validate(&json!({"id": 1})).unwrap_err();
        assert!(issues.iter().all(|issue| issue.path.is_empty()));
        assert!(issues.to_string().contains("name"));
    }

    #[test]
    fn test_every_issue_is_collected() {
        let issues = user_schema()
            .validate(&json!({"id": "x", "name": 5, "email": "john@example.com"}))
            .unwrap_err();
        assert!(issues.at("id").is_some());
        assert!(issues.at("name").is_some());
    }

    #[test]
    fn test_email_format_is_enforced() {
        let issues = user_schema()
            .validate(&json!({"id": 1, "name": "John", "email": "not-an-email"}))
            .unwrap_err();
        assert!(issues.at("email").is_some());
    }

    #[test]
    fn test_invalid_document_is_config_error() {
        let err = JsonSchema::new(json!({"type": 12})).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSchema(_)));
    }
}
