//! End-to-end tests: definitions file, config and HTTP transport against a
//! mock server.

use std::io::Write;
use std::sync::Arc;

use apimap_lib::definitions::user_registry;
use apimap_lib::{ClientConfig, DispatchError, Dispatcher, ParamSet, Registry};
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEFINITIONS: &str = r#"
endpoints:
  - key: getArticle
    method: GET
    path: /articles/:slug
    allowed_params: [slug, lang]
    request_schema:
      type: object
      required: [slug]
      properties:
        slug: { type: string }
    response_schema:
      type: object
      required: [title]
      properties:
        title: { type: string }
  - key: publish
    method: POST
    path: /articles
    cache: disabled
"#;

fn params(value: Value) -> ParamSet {
    value.as_object().cloned().unwrap()
}

fn definitions_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(DEFINITIONS.as_bytes()).unwrap();
    file
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: format!("{}/api", server.uri()),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn test_definitions_file_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles/hello-world"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Hello"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = definitions_file();
    let registry = Registry::from_definitions_file(file.path()).unwrap();
    let dispatcher = Dispatcher::from_config(Arc::new(registry), &config_for(&server)).unwrap();

    let call = params(json!({"slug": "hello-world", "lang": "en"}));
    let first = dispatcher.dispatch("getArticle", call.clone()).await.unwrap();
    let second = dispatcher.dispatch("getArticle", call).await.unwrap();

    assert_eq!(first, json!({"title": "Hello"}));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_post_body_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(body_json(json!({"title": "Draft"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
        .expect(2)
        .mount(&server)
        .await;

    let file = definitions_file();
    let registry = Registry::from_definitions_file(file.path()).unwrap();
    let dispatcher = Dispatcher::from_config(Arc::new(registry), &config_for(&server)).unwrap();

    for _ in 0..2 {
        let result = dispatcher
            .dispatch("publish", params(json!({"title": "Draft"})))
            .await
            .unwrap();
        assert_eq!(result, json!({"id": 5}));
    }
}

#[tokio::test]
async fn test_user_not_found_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "User not found"})))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::from_config(Arc::new(user_registry().unwrap()), &config_for(&server)).unwrap();

    let err = dispatcher.dispatch("getUser", params(json!({"id": 42}))).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.to_string(), "User not found");
    assert!(!err.is_caller_error());
}

#[tokio::test]
async fn test_invalid_server_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "John"})))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::from_config(Arc::new(user_registry().unwrap()), &config_for(&server)).unwrap();

    let err = dispatcher.dispatch("getUser", params(json!({"id": 1}))).await.unwrap_err();
    match err {
        DispatchError::ResponseValidation { issues, payload, .. } => {
            assert!(!issues.is_empty());
            assert_eq!(payload, json!({"id": 1, "name": "John"}));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_request_validation_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::from_config(Arc::new(user_registry().unwrap()), &config_for(&server)).unwrap();

    let err = dispatcher
        .dispatch("createUser", params(json!({"name": "J", "email": "not-an-email", "role": "admin"})))
        .await
        .unwrap_err();
    match err {
        DispatchError::RequestValidation { issues } => {
            assert!(issues.at("name").is_some());
            assert!(issues.at("email").is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_user() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::from_config(Arc::new(user_registry().unwrap()), &config_for(&server)).unwrap();

    let deleted: apimap_lib::definitions::Deleted = dispatcher
        .dispatch_as("deleteUser", params(json!({"id": 3})))
        .await
        .unwrap();
    assert!(deleted.success);
}
