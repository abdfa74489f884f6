use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use uuid::Uuid;

use comply_auth::domain::lockout::LockoutPolicy;
use comply_auth::router::build_router;
use comply_auth::state::AppState;
use comply_domain::id::TenantId;
use comply_domain::role::Role;
use comply_testing::auth::MockIdentity;

use crate::helpers::TEST_JWT_SECRET;

/// Router over storage that is never reached: every request below is settled
/// by extractors, token validation or authorization before touching it.
fn server() -> TestServer {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:1")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        redis,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        lockout: LockoutPolicy::default(),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn with_identity(mut request: TestRequest, identity: &MockIdentity) -> TestRequest {
    for (name, value) in identity.headers().iter() {
        request = request.add_header(name.clone(), value.clone());
    }
    request
}

#[tokio::test]
async fn should_serve_health_with_request_id() {
    let server = server();
    let response = server
        .get("/healthz")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "req-42");
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let server = server();
    let response = server.get("/readyz").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_require_tenant_header_on_login() {
    let server = server();
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "a@b.test", "password": "whatever" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "TENANT_NOT_FOUND");
    assert_eq!(body["message"], "tenant context not found");
}

#[tokio::test]
async fn should_require_identity_on_profile() {
    let server = server();
    let response = server.get("/api/v1/auth/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn should_reject_garbage_refresh_token() {
    let server = server();
    let response = server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": "not-a-jwt" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn should_forbid_unlock_for_agent() {
    let identity = MockIdentity::in_tenant(TenantId(Uuid::new_v4()), vec![Role::Agent]);
    let path = format!("/api/v1/users/{}/unlock", Uuid::new_v4());
    let server = server();
    let response = with_identity(server.post(&path), &identity).await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");
    assert_eq!(body["message"], "requires role level 3 or higher");
}

#[tokio::test]
async fn should_reject_unknown_mfa_method() {
    let identity = MockIdentity::in_tenant(TenantId(Uuid::new_v4()), vec![Role::Client]);
    let server = server();
    let request = server
        .post("/api/v1/auth/mfa/setup")
        .json(&json!({ "method": "carrier_pigeon" }));
    let response = with_identity(request, &identity).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}
