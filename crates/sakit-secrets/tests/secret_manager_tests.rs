//! Secret Manager client tests against a mock REST server

mod common;

use common::*;
use sakit_core::{ErrorKind, StaticToken};
use sakit_secrets::{
    CachedSecretClient, SecretCache, SecretError, SecretManagerClient, SecretRef, SecretVersion,
    VersionState,
};
use std::sync::Arc;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_access_latest_decodes_payload() {
    let server = MockServer::start().await;
    mock_access(&server, "demo-app-api-key", "latest", "sk_live_abcdef123456").await;

    let value = client(&server)
        .access_secret_version(&SecretRef::parse("demo-app-api-key").unwrap())
        .await
        .unwrap();

    assert_eq!(value.as_str(), Some("sk_live_abcdef123456"));
    assert_eq!(value.preview(), "sk_live_...");
}

#[tokio::test]
async fn test_access_pinned_version() {
    let server = MockServer::start().await;
    mock_access(&server, "demo-app-api-key", "1", "first-key").await;

    let secret = SecretRef::new("demo-app-api-key", SecretVersion::Number(1)).unwrap();
    let value = client(&server).access_secret_version(&secret).await.unwrap();
    assert_eq!(value.as_str(), Some("first-key"));
}

#[tokio::test]
async fn test_json_payload() {
    let server = MockServer::start().await;
    let key = json!({
        "type": "service_account",
        "client_email": "demo-app@my-project-dev.iam.gserviceaccount.com"
    });
    mock_access(&server, "demo-app-sa-key", "latest", &key.to_string()).await;

    let value = client(&server)
        .access_secret_version(&SecretRef::parse("demo-app-sa-key").unwrap())
        .await
        .unwrap();
    assert_eq!(value.to_json().unwrap(), key);
}

#[tokio::test]
async fn test_not_found_is_classified() {
    let server = MockServer::start().await;
    mock_error(&server, &access_path("missing", "latest"), 404, "NOT_FOUND").await;

    let err = client(&server)
        .access_secret_version(&SecretRef::parse("missing").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "Secret 'missing' version 'latest' not found in project 'my-project-dev'"
    );
    assert!(err.hints()[0].contains("gcloud secrets list --project=my-project-dev"));
}

#[tokio::test]
async fn test_permission_denied_is_classified() {
    let server = MockServer::start().await;
    mock_error(&server, &access_path("locked", "latest"), 403, "PERMISSION_DENIED").await;

    let err = client(&server)
        .access_secret_version(&SecretRef::parse("locked").unwrap())
        .await
        .unwrap_err();

    match &err {
        SecretError::PermissionDenied { message, .. } => {
            assert_eq!(message, "PERMISSION_DENIED from mock")
        }
        other => panic!("Expected PermissionDenied, got {:?}", other),
    }
    assert!(err
        .hints()
        .iter()
        .any(|h| h.contains("add-iam-policy-binding locked")));
}

#[tokio::test]
async fn test_unauthenticated_and_server_errors() {
    let server = MockServer::start().await;
    mock_error(&server, &access_path("a", "latest"), 401, "UNAUTHENTICATED").await;
    mock_error(&server, &access_path("b", "latest"), 503, "UNAVAILABLE").await;

    let client = client(&server);
    let unauth = client
        .access_secret_version(&SecretRef::parse("a").unwrap())
        .await
        .unwrap_err();
    assert_eq!(unauth.kind(), ErrorKind::Unauthenticated);

    let unavailable = client
        .access_secret_version(&SecretRef::parse("b").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(unavailable, SecretError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_invalid_base64_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(access_path("broken", "latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": { "data": "%%% not base64 %%%" }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .access_secret_version(&SecretRef::parse("broken").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::InvalidPayload { .. }));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport() {
    let client = SecretManagerClient::with_options(
        PROJECT,
        Arc::new(StaticToken::new(TOKEN)),
        "http://127.0.0.1:1",
        Duration::from_secs(2),
    )
    .unwrap();

    let err = client
        .access_secret_version(&SecretRef::parse("any").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_list_secrets_follows_pagination() {
    let server = MockServer::start().await;
    let route = format!("/v1/projects/{}/secrets", PROJECT);

    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secrets": [{
                "name": "projects/123456/secrets/demo-app-api-key",
                "labels": { "app": "demo", "env": "dev" },
                "createTime": "2024-01-15T10:30:00.123456Z"
            }],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secrets": [{ "name": "projects/123456/secrets/demo-app-db-url" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secrets = client(&server).list_secrets().await.unwrap();
    let names: Vec<_> = secrets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["demo-app-api-key", "demo-app-db-url"]);
    assert_eq!(secrets[0].labels.get("env").map(String::as_str), Some("dev"));
    assert!(secrets[0].create_time.is_some());
    assert!(secrets[1].labels.is_empty());
}

#[tokio::test]
async fn test_list_secrets_empty_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{}/secrets", PROJECT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(client(&server).list_secrets().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_secrets_forbidden_hint() {
    let server = MockServer::start().await;
    mock_error(
        &server,
        &format!("/v1/projects/{}/secrets", PROJECT),
        403,
        "PERMISSION_DENIED",
    )
    .await;

    let err = client(&server).list_secrets().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(err.hints()[0].contains("not list all secrets"));
}

#[tokio::test]
async fn test_list_versions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/projects/{}/secrets/demo-app-api-key/versions",
            PROJECT
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "versions": [
                {
                    "name": "projects/123456/secrets/demo-app-api-key/versions/2",
                    "state": "ENABLED",
                    "createTime": "2024-02-01T08:00:00Z"
                },
                {
                    "name": "projects/123456/secrets/demo-app-api-key/versions/1",
                    "state": "DISABLED",
                    "createTime": "2024-01-15T10:30:00Z"
                }
            ],
            "totalSize": 2
        })))
        .mount(&server)
        .await;

    let versions = client(&server)
        .list_secret_versions("demo-app-api-key")
        .await
        .unwrap();

    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version, "2");
    assert_eq!(versions[0].state, VersionState::Enabled);
    assert_eq!(versions[1].state, VersionState::Disabled);
}

#[tokio::test]
async fn test_list_versions_missing_secret() {
    let server = MockServer::start().await;
    mock_error(
        &server,
        &format!("/v1/projects/{}/secrets/ghost/versions", PROJECT),
        404,
        "NOT_FOUND",
    )
    .await;

    let err = client(&server)
        .list_secret_versions("ghost")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Secret 'ghost' not found in project 'my-project-dev'"
    );
}

#[tokio::test]
async fn test_cached_client_hits_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(access_path("demo-app-api-key", "latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": { "data": "c2tfbGl2ZV9hYmNkZWY=" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cached = CachedSecretClient::new(client(&server), SecretCache::new(Duration::from_secs(60)));
    let secret = SecretRef::parse("demo-app-api-key").unwrap();

    let first = cached.fetch(&secret).await.unwrap();
    let second = cached.fetch(&secret).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_str(), Some("sk_live_abcdef"));

    let stats = cached.stats().await;
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[tokio::test]
async fn test_cached_client_does_not_cache_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(access_path("flaky", "latest")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mock_access(&server, "flaky", "latest", "recovered").await;

    let cached = CachedSecretClient::new(client(&server), SecretCache::new(Duration::from_secs(60)));
    let secret = SecretRef::parse("flaky").unwrap();

    assert!(cached.fetch(&secret).await.is_err());
    assert_eq!(
        cached.fetch(&secret).await.unwrap().as_str(),
        Some("recovered")
    );
}
