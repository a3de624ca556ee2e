mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use branchdesk::services::token::TokenCodec;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing_test::traced_test;

use common::{TestApp, TEST_SECRET};

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));

    let (status, body) = app.call(Method::GET, "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/companies/{id}/branches").is_some());
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/api/companies", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "status": 401, "message": "Authorization header is required" })
    );

    let request = Request::builder()
        .uri("/api/companies")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authorization header format");

    let (status, body) = app.get("/api/companies", "garbage.token.here").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn expired_and_foreign_tokens_are_rejected() {
    let app = TestApp::new();

    let codec = TokenCodec::new(TEST_SECRET);
    let stale = codec
        .issue_at("u-1", &[], Utc::now() - Duration::hours(25))
        .unwrap();
    let (status, body) = app.get("/api/companies", &stale).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let foreign = TokenCodec::new("some-other-secret").issue("u-1", &[]).unwrap();
    let (status, _) = app.get("/api/companies", &foreign).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_for_unknown_user_passes_the_guard() {
    // O guard não consulta o banco; só a busca do perfil falha
    let app = TestApp::new();
    let token = TokenCodec::new(TEST_SECRET).issue("ghost", &[]).unwrap();

    let (status, _) = app.get("/api/companies", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/users/profile", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn rate_limit_runs_before_authentication() {
    let app = TestApp::with_rate_limit(1, 2);

    for _ in 0..2 {
        let (status, _) = app.call(Method::GET, "/api/companies", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app.call(Method::GET, "/api/companies", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({ "error": "Too many requests" }));
}

fn forwarded_for(ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/health")
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn rate_limit_is_per_client_address_behind_proxy() {
    let app = TestApp::behind_proxy(1, 1);

    assert_eq!(app.send(forwarded_for("203.0.113.1")).await.0, StatusCode::OK);
    assert_eq!(
        app.send(forwarded_for("203.0.113.1")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.send(forwarded_for("203.0.113.2")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn forged_forwarded_for_does_not_reset_the_limit() {
    let app = TestApp::with_rate_limit(1, 1);

    assert_eq!(app.send(forwarded_for("203.0.113.1")).await.0, StatusCode::OK);
    for i in 2..20 {
        let (status, _) = app.send(forwarded_for(&format!("203.0.113.{i}"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
    assert_eq!(app.state.rate_limiter.tracked_clients(), 1);
}

#[tokio::test]
#[traced_test]
async fn throttled_requests_never_reach_the_logger() {
    let app = TestApp::with_rate_limit(1, 1);

    assert_eq!(app.call(Method::GET, "/api/health", None, None).await.0, StatusCode::OK);
    assert_eq!(
        app.call(Method::GET, "/api/health", None, None).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );

    assert!(logs_contain("Rate limit excedido"));
    logs_assert(|lines: &[&str]| {
        let logged: Vec<_> = lines
            .iter()
            .filter(|line| line.contains("Requisição processada"))
            .collect();
        match logged.as_slice() {
            [only] if only.contains("status=200") => Ok(()),
            other => Err(format!("esperava uma linha com status=200, veio {other:?}")),
        }
    });
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/companies")
        .header(header::ORIGIN, "https://app.example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}
