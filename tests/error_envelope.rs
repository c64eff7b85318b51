//! Error classification, redaction and correlation over the wire.

use axum::routing::get;
use axum::Router;
use chrono::DateTime;
use service_core::config::schema::Environment;
use service_core::http::server::AppState;
use service_core::ServiceError;

mod common;

async fn panicking_handler() -> &'static str {
    panic!("handler blew up")
}

fn failing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/unauthorized",
            get(|| async { ServiceError::Unauthorized("token expired".to_string()) }),
        )
        .route(
            "/invalid",
            get(|| async {
                ServiceError::Validation {
                    message: "email is invalid".to_string(),
                    details: Some(serde_json::json!({ "field": "email" })),
                }
            }),
        )
        .route(
            "/broken",
            get(|| async { ServiceError::Internal("db connection lost".to_string()) }),
        )
        .route("/panic", get(panicking_handler))
}

#[tokio::test]
async fn operational_error_is_verbose_everywhere() {
    let instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Production), failing_routes())
            .await;
    let client = common::http_client();

    let response = client
        .get(instance.url("/unauthorized"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    // Operational messages survive production untouched.
    assert_eq!(body["error"]["message"], "token expired");
    assert!(DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn internal_fault_is_redacted_in_production() {
    let instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Production), failing_routes())
            .await;
    let client = common::http_client();

    let response = client.get(instance.url("/broken")).send().await.unwrap();
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["error"]["message"], "Internal server error");
    assert!(!body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("db connection lost"));
}

#[tokio::test]
async fn internal_fault_is_verbatim_outside_production() {
    let instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Test), failing_routes())
            .await;
    let client = common::http_client();

    let response = client.get(instance.url("/broken")).send().await.unwrap();
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "db connection lost");
}

#[tokio::test]
async fn panic_payload_reaches_the_classifier() {
    let instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Test), failing_routes())
            .await;
    let client = common::http_client();

    let response = client.get(instance.url("/panic")).send().await.unwrap();
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["error"]["message"], "handler blew up");
}

#[tokio::test]
async fn panic_is_redacted_in_production() {
    let instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Production), failing_routes())
            .await;
    let client = common::http_client();

    let response = client.get(instance.url("/panic")).send().await.unwrap();
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn validation_details_only_outside_production() {
    let client = common::http_client();

    let test_instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Test), failing_routes())
            .await;
    let response = client
        .get(test_instance.url("/invalid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["details"]["field"], "email");

    let prod_instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Production), failing_routes())
            .await;
    let response = client
        .get(prod_instance.url("/invalid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].get("details").is_none());
    assert_eq!(body["error"]["message"], "email is invalid");
}

#[tokio::test]
async fn correlation_id_ties_header_and_envelope() {
    let instance =
        common::spawn_instance_with_routes(common::test_config(Environment::Test), failing_routes())
            .await;
    let client = common::http_client();

    let response = client
        .get(instance.url("/unauthorized"))
        .send()
        .await
        .unwrap();
    let header_id = response
        .headers()
        .get("x-correlation-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(!header_id.is_empty());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["correlation_id"], header_id.as_str());

    // A second request gets a different id.
    let response = client
        .get(instance.url("/unauthorized"))
        .send()
        .await
        .unwrap();
    let second_id = response
        .headers()
        .get("x-correlation-id")
        .unwrap()
        .to_str()
        .unwrap();
    assert_ne!(second_id, header_id);
}
