//! Router-level tests covering status-code mapping and response envelopes.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use keygate::api::AppState;
use keygate::config::Config;
use keygate::services::NewUser;

async fn spawn_app() -> (Arc<AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("keygate-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.jwt.secret = "api-test-secret".to_string();

    let state = keygate::api::create_app_state(config)
        .await
        .expect("failed to create app state");

    state
        .auth
        .create_user(NewUser {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            is_admin: false,
        })
        .await
        .expect("failed to seed account");

    let router = keygate::api::router(state.clone());
    (state, router)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({"username": "alice", "password": "hunter2"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({"username": "alice", "password": "hunter2"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "alice");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({"username": "alice", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn token_routes_require_a_session() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/tokens")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/tokens")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_lifecycle_over_http() {
    let (_, app) = spawn_app().await;
    let session = login(&app).await;

    // Create.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/tokens")
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {session}"))
                .body(Body::from(
                    serde_json::json!({"name": "ci", "description": "deploy key"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = response_json(response).await;
    let token_id = created["id"].as_i64().unwrap();
    assert!(created["token"].as_str().unwrap().starts_with("user:alice:"));

    // List.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/tokens")
                .header("Authorization", format!("Bearer {session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = response_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Revoke.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/auth/tokens/{token_id}"))
                .header("Authorization", format!("Bearer {session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Revoking again is a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/auth/tokens/{token_id}"))
                .header("Authorization", format!("Bearer {session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validate_endpoints_answer_200_either_way() {
    let (_, app) = spawn_app().await;
    let session = login(&app).await;

    // Mint an opaque token over HTTP.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/tokens")
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {session}"))
                .body(Body::from(serde_json::json!({"name": "ci"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let opaque = response_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Valid opaque token.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/validate",
            serde_json::json!({"token": opaque}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["username"], "alice");

    // Bogus opaque token: still 200, valid=false, generic error.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/validate",
            serde_json::json!({"token": "user:alice:ffffffffffff"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
    assert!(body["user"].is_null());

    // Session token through the JWT endpoint.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/validate-jwt",
            serde_json::json!({"token": session}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], true);

    // Garbage through the JWT endpoint.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/validate-jwt",
            serde_json::json!({"token": "garbage"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn store_failure_during_session_check_is_a_500_not_a_401() {
    use sea_orm::ConnectionTrait;

    let (state, app) = spawn_app().await;
    let session = login(&app).await;

    state
        .store
        .conn
        .execute_unprepared("DROP TABLE users")
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/tokens")
                .header("Authorization", format!("Bearer {session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_store_status() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
}
