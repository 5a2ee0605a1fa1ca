mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::TestHarness;
use http_body_util::BodyExt;
use inventory_api::{
    auth::{consts as perm, AuthService},
    config::AppConfig,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const ORG: &str = "org-acme";
const USER: &str = "ops@acme.io";
const TEST_SECRET: &str =
    "a-test-only-secret-that-is-long-enough-to-sign-hs256-tokens-0123456789";

struct TestApp {
    router: Router,
    auth: Arc<AuthService>,
    _harness: TestHarness,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 3600,
        auth_issuer: "inventory-api".to_string(),
        auth_audience: "beeja-platform".to_string(),
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        accounts_base_url: "http://localhost:0".to_string(),
        accounts_timeout_secs: 2,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
        event_channel_capacity: 64,
    }
}

impl TestApp {
    async fn new() -> Self {
        let harness = TestHarness::new().await;
        harness.mount_no_pattern().await;

        let auth = Arc::new(AuthService::new(
            TEST_SECRET,
            "inventory-api".to_string(),
            "beeja-platform".to_string(),
            Duration::from_secs(3600),
        ));

        let state = AppState {
            db: harness.db.clone(),
            config: test_config(),
            event_sender: harness.event_sender.clone(),
            inventory_service: harness.service.clone(),
        };

        let router = Router::new()
            .nest("/api/v1", inventory_api::api_v1_routes())
            .layer(axum::Extension(auth.clone()))
            .with_state(state);

        Self {
            router,
            auth,
            _harness: harness,
        }
    }

    fn token(&self, permissions: &[&str]) -> String {
        self.auth
            .generate_token(
                USER,
                ORG,
                permissions.iter().map(|p| p.to_string()).collect(),
            )
            .expect("token generation should succeed")
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should complete");

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }
}

fn add_device_body(product_id: Option<&str>) -> Value {
    json!({
        "device": "ThinkPad X1 Carbon",
        "provider": "Lenovo",
        "model": "Gen 11",
        "type": "laptop",
        "os": "Linux",
        "ram": "32GB",
        "availability": "AVAILABLE",
        "product_id": product_id,
        "price": "1549.00",
    })
}

#[tokio::test]
async fn add_then_list_round_trip() {
    let app = TestApp::new().await;
    let token = app.token(&[perm::CREATE_DEVICE, perm::READ_DEVICE]);

    let (status, created) = app
        .request(
            Method::POST,
            "/api/v1/devices",
            Some(&token),
            Some(add_device_body(Some("P-100"))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["device_number"], "1");
    assert_eq!(created["organization_id"], ORG);
    assert_eq!(created["created_by"], USER);

    let (status, listed) = app
        .request(Method::GET, "/api/v1/devices", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["items"][0]["product_id"], "P-100");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/v1/devices", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let app = TestApp::new().await;
    let token = app.token(&[perm::READ_DEVICE]);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/devices",
            Some(&token),
            Some(add_device_body(None)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn sparse_update_preserves_product_id() {
    let app = TestApp::new().await;
    let token = app.token(&[perm::CREATE_DEVICE, perm::UPDATE_DEVICE]);

    let (_, created) = app
        .request(
            Method::POST,
            "/api/v1/devices",
            Some(&token),
            Some(add_device_body(Some("P-100"))),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .request(
            Method::PUT,
            &format!("/api/v1/devices/{}", id),
            Some(&token),
            Some(json!({ "comments": "handed to QA", "product_id": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["comments"], "handed to QA");
    assert_eq!(updated["product_id"], "P-100");
}

#[tokio::test]
async fn duplicate_product_id_maps_to_conflict() {
    let app = TestApp::new().await;
    let token = app.token(&[perm::CREATE_DEVICE]);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/devices",
            Some(&token),
            Some(add_device_body(Some("P-100"))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/devices",
            Some(&token),
            Some(add_device_body(Some("P-100"))),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn deleting_an_unknown_device_is_not_found() {
    let app = TestApp::new().await;
    let token = app.token(&[perm::DELETE_DEVICE]);

    let (status, body) = app
        .request(
            Method::DELETE,
            "/api/v1/devices/4f8e8c1e-4a2e-4a02-9a6a-2f8d9f6f1234",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let app = TestApp::new().await;
    let token = app.token(&[perm::CREATE_DEVICE]);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/devices",
            Some(&token),
            Some(json!({ "device": "", "availability": "AVAILABLE" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
