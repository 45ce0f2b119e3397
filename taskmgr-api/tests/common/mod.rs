//! Common test utilities for integration tests
//!
//! Builds the full router over a fresh `MemoryStore` and provides helpers
//! to drive it with JSON requests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskmgr_api::app::{build_router, AppState};
use taskmgr_api::config::Config;
use taskmgr_shared::store::MemoryStore;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const TEST_PASSWORD: &str = "secret123";

/// Test context containing the router and its backing store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

/// Parsed response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            "STORE_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config));

        Self { app, store }
    }

    /// Sends a request, optionally with a JSON body and bearer token
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_request(request).await
    }

    /// Sends a prebuilt request
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers a user and returns the session token
    pub async fn register(&self, username: &str, email: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": TEST_PASSWORD,
                })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "register failed: {}",
            response.body
        );

        response.body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    /// Creates a task for `token` and returns its id
    pub async fn create_task(&self, token: &str, title: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/task",
                Some(token),
                Some(serde_json::json!({
                    "title": title,
                    "description": "created by test helper",
                })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "create failed: {}",
            response.body
        );

        response.body["data"]["id"]
            .as_str()
            .expect("task id in create response")
            .to_string()
    }
}
