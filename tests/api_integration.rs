//! HTTP integration tests.
//!
//! These verify the full request flow through the axum router using
//! `tower::ServiceExt::oneshot`.

use std::fs;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use mvc_dispatch::routing::DEFAULT_SESSION_COOKIE;
use mvc_dispatch::server::{create_router, create_router_with_limit};
use mvc_dispatch::{ActionResult, Controller, DispatchConfig, RouteManager};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper to build a manager with a `home` default controller and a site root.
fn app() -> (TempDir, Arc<RouteManager>) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("style.css"), "body { margin: 0 }").unwrap();

    let manager = RouteManager::new(DispatchConfig {
        app_root: dir.path().to_path_buf(),
        default_controller: Some("home".to_string()),
        ..DispatchConfig::default()
    });

    manager.register_controller("home", |request| {
        let mut controller = Controller::new(request);
        controller.register_action(Method::GET, "Index", |_, _| {
            Ok(Some(ActionResult::html("<h1>Home</h1>")))
        });
        controller.register_action(Method::GET, "About", |_, params| {
            ActionResult::json(&serde_json::json!({ "params": params })).map(Some)
        });
        controller.register_action(Method::POST, "Echo", |c, _| {
            Ok(Some(ActionResult::new(c.request().body().to_vec())))
        });
        controller
    });
    manager.register_controller("admin", |request| {
        let mut controller = Controller::new(request);
        controller.on_before(|c| {
            c.continue_pipeline = c.request().query_param("token") == Some("letmein");
            Ok(())
        });
        controller.register_action(Method::GET, "Index", |_, _| {
            Ok(Some(ActionResult::text("admin area")))
        });
        controller
    });

    (dir, Arc::new(manager))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to extract body as string.
async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

// ============================================================================
// Dispatch Tests
// ============================================================================

#[tokio::test]
async fn test_root_hits_default_index() {
    let (_dir, manager) = app();
    let response = create_router(manager).oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with(&format!("{}=", DEFAULT_SESSION_COOKIE)));
    assert_eq!(response_text(response).await, "<h1>Home</h1>");
}

#[tokio::test]
async fn test_params_reach_action() {
    let (_dir, manager) = app();
    let response = create_router(manager)
        .oneshot(get("/home/about/a/b?ignored=1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&response_text(response).await).unwrap();
    assert_eq!(json["params"], serde_json::json!(["a", "b"]));
}

#[tokio::test]
async fn test_post_body_is_forwarded() {
    let (_dir, manager) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/home/Echo")
        .body(Body::from("hello"))
        .unwrap();

    let response = create_router(manager).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "hello");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let (_dir, manager) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/home/Echo")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();

    let response = create_router_with_limit(manager, 16)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_before_hook_gates_action() {
    let (_dir, manager) = app();

    let response = create_router(Arc::clone(&manager))
        .oneshot(get("/admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = create_router(manager)
        .oneshot(get("/admin/Index?token=letmein"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "admin area");
}

#[tokio::test]
async fn test_static_file_through_router() {
    let (_dir, manager) = app();
    let response = create_router(manager)
        .oneshot(get("/style.css"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(response_text(response).await, "body { margin: 0 }");
}

#[tokio::test]
async fn test_reserved_path_is_500() {
    let (_dir, manager) = app();
    let response = create_router(manager)
        .oneshot(get("/models/user"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_session_cookie_round_trip() {
    let (_dir, manager) = app();
    let router = create_router(Arc::clone(&manager));

    let first = router.clone().oneshot(get("/")).await.unwrap();
    let set_cookie = first.headers()[header::SET_COOKIE].to_str().unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/home")
        .header(header::COOKIE, format!("theme=dark; {}", pair))
        .body(Body::empty())
        .unwrap();
    let second = router.oneshot(request).await.unwrap();

    assert_eq!(second.status(), StatusCode::OK);
    assert!(second.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(manager.sessions().count(), 1);
}
