//! Shared helpers for Secret Manager integration tests

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sakit_core::StaticToken;
use sakit_secrets::SecretManagerClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT: &str = "my-project-dev";
pub const TOKEN: &str = "ya29.test-token";

/// Client pointed at the mock server with a static bearer token
pub fn client(server: &MockServer) -> SecretManagerClient {
    SecretManagerClient::with_options(
        PROJECT,
        Arc::new(StaticToken::new(TOKEN)),
        &server.uri(),
        Duration::from_secs(5),
    )
    .expect("client should build")
}

/// Path of the access endpoint for a secret version
pub fn access_path(secret: &str, version: &str) -> String {
    format!(
        "/v1/projects/{}/secrets/{}/versions/{}:access",
        PROJECT, secret, version
    )
}

/// Mount a successful access response carrying `payload`
pub async fn mock_access(server: &MockServer, secret: &str, version: &str, payload: &str) {
    Mock::given(method("GET"))
        .and(path(access_path(secret, version)))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("projects/123456/secrets/{}/versions/1", secret),
            "payload": { "data": STANDARD.encode(payload) }
        })))
        .mount(server)
        .await;
}

/// Mount a Google-style error envelope for any request to `route`
pub async fn mock_error(server: &MockServer, route: &str, status: u16, google_status: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "error": {
                "code": status,
                "message": format!("{} from mock", google_status),
                "status": google_status
            }
        })))
        .mount(server)
        .await;
}
