//! Router tests for every path that resolves before the database is touched.
//!
//! The pool connects lazily and is never used, so no server is needed.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use numtree_server::auth::SessionSettings;
use numtree_server::{build_router, AppState, ServerConfig};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

fn app_with(config: ServerConfig) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/numtree_unused")
        .unwrap();
    let state = AppState {
        pool,
        session: SessionSettings::default(),
    };
    build_router(state, &config).unwrap()
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint() {
    let (status, body) = send(app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn me_requires_session() {
    let (status, body) = send(app(), get("/api/auth/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn logout_requires_session() {
    let (status, _) = send(app(), post_json("/api/auth/logout", "{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_is_checked_before_body() {
    let (status, body) = send(app(), post_json("/api/posts", "not json")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(
        app(),
        post_json("/api/posts/not-a-uuid/reply", r#"{"operation":"nope"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_post_id_is_not_found() {
    let (status, body) = send(app(), get("/api/posts/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");

    let (status, _) = send(app(), get("/api/posts/12345/tree")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(), get("/api/posts/xyz/chain")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signup_rejects_malformed_body() {
    let (status, body) = send(app(), post_json("/api/auth/signup", r#"{"username":"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn signup_validates_credentials() {
    let (status, body) = send(
        app(),
        post_json("/api/auth/signup", r#"{"username":"alice","password":"abc"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "password");

    let (status, body) = send(
        app(),
        post_json("/api/auth/signup", r#"{"username":"a b","password":"secret1"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "username");
}

#[tokio::test]
async fn malformed_query_is_json_validation_error() {
    let (status, body) = send(app(), get("/api/posts?limit=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "query");

    let id = "6f1c2d7e-1b9a-4c3e-8f2d-0a1b2c3d4e5f";
    let (status, body) = send(app(), get(&format!("/api/posts/{}/tree?depth=abc", id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "query");
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let (status, body) = send(app(), get("/api/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn static_dir_serves_spa_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>numtree</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

    let config = ServerConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..ServerConfig::default()
    };

    let response = app_with(config.clone())
        .oneshot(get("/posts/some-client-route"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>numtree</html>");

    let response = app_with(config.clone()).oneshot(get("/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(app_with(config), get("/api/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn cors_allows_configured_origin_with_credentials() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/posts")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(req).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn cors_ignores_unknown_origin() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/posts")
        .header(header::ORIGIN, "http://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(req).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
