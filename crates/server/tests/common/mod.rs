//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock call provider and a temporary SQLite store, so the HTTP
//! surface can be exercised without reaching a real voice provider.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ringback_core::{
    testing::MockCallProvider, CallProvider, CallService, CallsConfig, SqliteUserStore, UserStore,
};
use ringback_server::state::AppState;

/// Re-export fixtures for test convenience
pub use ringback_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_call() {
///     let fixture = TestFixture::new().await;
///     fixture.provider.push_status("completed", Some("hi")).await;
///
///     let response = fixture.post("/api/phone/number", json!({
///         "phone-number": "+15551234567"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock call provider - script execution statuses and failures
    pub provider: Arc<MockCallProvider>,
    /// User store backing the router
    pub store: Arc<SqliteUserStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body text (for non-JSON responses)
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture polling at most 30 times with no delay.
    pub async fn new() -> Self {
        Self::with_calls_config(fixtures::fast_calls_config(30)).await
    }

    /// Create a test fixture with custom call settings.
    pub async fn with_calls_config(calls: CallsConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let provider = Arc::new(MockCallProvider::new());
        let store = Arc::new(SqliteUserStore::new(&db_path).expect("Failed to create user store"));

        let mut config = fixtures::config(calls.clone());
        config.database.path = db_path;

        let service = Arc::new(CallService::new(
            Arc::clone(&provider) as Arc<dyn CallProvider>,
            Arc::clone(&store) as Arc<dyn UserStore>,
            &calls,
        ));

        let state = Arc::new(AppState::new(config, service));
        let router = ringback_server::api::create_router(state);

        Self {
            router,
            provider,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let request_builder = Request::builder().method(method).uri(path);

        let request = if let Some(json_body) = body {
            request_builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&json_body).unwrap()))
                .unwrap()
        } else {
            request_builder.body(Body::empty()).unwrap()
        };

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
