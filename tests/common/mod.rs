#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use branchdesk::{
    app::build_router,
    config::{AppState, Config},
    db::Repositories,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(100_000, 100_000)
    }

    pub fn with_rate_limit(per_minute: u32, burst: u32) -> Self {
        Self::build(per_minute, burst, false)
    }

    /// Limitador que confia em `X-Forwarded-For`, como atrás de um proxy.
    pub fn behind_proxy(per_minute: u32, burst: u32) -> Self {
        Self::build(per_minute, burst, true)
    }

    fn build(per_minute: u32, burst: u32, trust_proxy_headers: bool) -> Self {
        let vars: HashMap<&str, String> = HashMap::from([
            ("JWT_SECRET", TEST_SECRET.to_string()),
            ("BCRYPT_COST", "4".to_string()),
            ("RATE_LIMIT_PER_MINUTE", per_minute.to_string()),
            ("RATE_LIMIT_BURST", burst.to_string()),
            ("TRUST_PROXY_HEADERS", trust_proxy_headers.to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let state = AppState::with_repositories(config, Repositories::in_memory());
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Registra e devolve (token, user_id).
    pub async fn register(&self, username: &str, roles: &[&str]) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "username": username, "password": "secret1", "roles": roles }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        token_and_id(&body)
    }

    pub async fn register_staff(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/auth/staff/register",
                None,
                json!({ "username": username, "password": "secret1" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        token_and_id(&body)
    }

    pub async fn create_company(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/companies",
                Some(token),
                json!({
                    "name": name,
                    "address": "1 Main St",
                    "phone": "555-0100",
                    "email": "ops@example.test",
                    "tax_id": "12-3456789",
                    "business_type": "llc"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_branch(&self, token: &str, company_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/companies/{company_id}/branches"),
                Some(token),
                json!({
                    "name": name,
                    "address": "2 Side St",
                    "phone": "555-0101",
                    "email": "branch@example.test"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

pub fn token_and_id(body: &Value) -> (String, String) {
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}
