//! Built-in user API table.
//!
//! Five endpoints over a `/users` resource, with JSON Schema documents for
//! both sides. The CLI uses this table when no definitions file is given.
//!
//! | Key          | Method | Path         |
//! |--------------|--------|--------------|
//! | `getUsers`   | GET    | `/users`     |
//! | `getUser`    | GET    | `/users/:id` |
//! | `createUser` | POST   | `/users`     |
//! | `updateUser` | PUT    | `/users/:id` |
//! | `deleteUser` | DELETE | `/users/:id` |

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};

use crate::endpoint::EndpointSpec;
use crate::error::ConfigError;
use crate::method::RestMethod;
use crate::registry::Registry;
use crate::schema::JsonSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

/// A user as returned by the user endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Page of users returned by `getUsers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: u64,
}

/// Result of `deleteUser`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub success: bool,
}

/// JSON Schema of a single user.
pub fn user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "number" },
            "name": { "type": "string" },
            "email": { "type": "string", "format": "email" },
            "role": { "enum": ["admin", "user"] },
            "createdAt": { "type": "string" }
        },
        "required": ["id", "name", "email"]
    })
}

fn id_only() -> Value {
    json!({
        "type": "object",
        "properties": { "id": { "type": "number" } },
        "required": ["id"]
    })
}

/// Specifications of the user API.
///
/// ## Errors
///
/// Only fails if a built-in schema does not compile.
pub fn user_endpoints() -> Result<Vec<EndpointSpec>, ConfigError> {
    Ok(vec![
        EndpointSpec::builder()
            .key("getUsers")
            .method(RestMethod::Get)
            .path("/users")
            .description("List users")
            .allowed_params(["page", "limit", "role"])
            .request_schema(JsonSchema::new(json!({
                "type": "object",
                "properties": {
                    "page": { "type": "number" },
                    "limit": { "type": "number" },
                    "role": { "enum": ["admin", "user"] }
                }
            }))?)
            .response_schema(JsonSchema::new(json!({
                "type": "object",
                "properties": {
                    "items": { "type": "array", "items": user_schema() },
                    "total": { "type": "number" }
                },
                "required": ["items", "total"]
            }))?)
            .build()?,
        EndpointSpec::builder()
            .key("getUser")
            .method(RestMethod::Get)
            .path("/users/:id")
            .description("Fetch a user")
            .allowed_params(["id"])
            .request_schema(JsonSchema::new(id_only())?)
            .response_schema(JsonSchema::new(user_schema())?)
            .build()?,
        EndpointSpec::builder()
            .key("createUser")
            .method(RestMethod::Post)
            .path("/users")
            .description("Create a user")
            .allowed_params(["name", "email", "role"])
            .request_schema(JsonSchema::new(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "minLength": 2 },
                    "email": { "type": "string", "format": "email" },
                    "role": { "enum": ["admin", "user"] }
                },
                "required": ["name", "email", "role"]
            }))?)
            .response_schema(JsonSchema::new(user_schema())?)
            .build()?,
        EndpointSpec::builder()
            .key("updateUser")
            .method(RestMethod::Put)
            .path("/users/:id")
            .description("Update a user")
            .allowed_params(["id", "name", "email", "role"])
            .request_schema(JsonSchema::new(json!({
                "type": "object",
                "properties": {
                    "id": { "type": "number" },
                    "name": { "type": "string", "minLength": 2 },
                    "email": { "type": "string", "format": "email" },
                    "role": { "enum": ["admin", "user"] }
                },
                "required": ["id"]
            }))?)
            .response_schema(JsonSchema::new(user_schema())?)
            .build()?,
        EndpointSpec::builder()
            .key("deleteUser")
            .method(RestMethod::Delete)
            .path("/users/:id")
            .description("Delete a user")
            .allowed_params(["id"])
            .request_schema(JsonSchema::new(id_only())?)
            .response_schema(JsonSchema::new(json!({
                "type": "object",
                "properties": { "success": { "type": "boolean" } },
                "required": ["success"]
            }))?)
            .build()?,
    ])
}

/// A registry holding the user API.
pub fn user_registry() -> Result<Registry, ConfigError> {
    Registry::from_table(user_endpoints()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn test_registry_has_all_endpoints() {
        let registry = user_registry().unwrap();
        let keys: Vec<&str> = registry.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["createUser", "deleteUser", "getUser", "getUsers", "updateUser"]);
    }

    #[test]
    fn test_create_user_request_rules() {
        let registry = user_registry().unwrap();
        let spec = registry.lookup("createUser").unwrap();
        let schema = spec.request_schema().unwrap();

        assert!(
            schema
                .validate(&json!({"name": "Ann", "email": "ann@example.com", "role": "admin"}))
                .is_ok()
        );

        let issues = schema
            .validate(&json!({"name": "A", "email": "ann@example.com", "role": "owner"}))
            .unwrap_err();
        assert!(issues.at("name").is_some());
        assert!(issues.at("role").is_some());
    }

    #[test]
    fn test_user_roundtrips_camel_case() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "name": "John",
            "email": "john@example.com",
            "role": "admin",
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(user.role, Some(UserRole::Admin));
        assert_eq!(user.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(JsonSchema::new(user_schema()).unwrap().validate(&serde_json::to_value(&user).unwrap()).is_ok());
    }

    #[test]
    fn test_role_parses() {
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::User);
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }
}
