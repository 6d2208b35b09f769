//! In-process application harness for router tests.
//!
//! Builds the full router over a call-counting in-memory store and the stub
//! pricing source, with one manual clock shared by the cache and the
//! identity verifier.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use costwise_api::{
    create_api_router, ApiConfig, AppState, AuthConfig, Environment, IdentityVerifier, JwtSecret,
    StateOptions,
};
use costwise_core::ManualClock;
use costwise_storage::CacheConfig;
use costwise_test_utils::{fixtures, CountingStore, StubPricingSource};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "costwise-router-tests-secret-0123456789";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub source: Arc<StubPricingSource>,
    pub clock: Arc<ManualClock>,
    pub verifier: IdentityVerifier,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

impl TestResponse {
    /// The `code` of an error envelope, or an empty string.
    pub fn error_code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development)
    }

    pub fn with_environment(environment: Environment) -> Self {
        let clock = Arc::new(ManualClock::new(fixtures::reference_time()));
        let auth = AuthConfig::default()
            .with_secret(JwtSecret::new(TEST_SECRET).expect("test secret"))
            .with_clock(clock.clone());
        let verifier = IdentityVerifier::new(auth);

        let store = Arc::new(CountingStore::new());
        let source = Arc::new(fixtures::stub_source());
        let state = AppState::new(
            store.clone(),
            source.clone(),
            verifier.clone(),
            StateOptions {
                cache: CacheConfig::new(),
                environment,
                clock: clock.clone(),
            },
        );

        let config = ApiConfig {
            environment,
            cors_origins: vec!["https://costwise.test".to_string()],
            ..Default::default()
        };
        let router = create_api_router(state, &config).expect("router");

        Self {
            router,
            store,
            source,
            clock,
            verifier,
        }
    }

    /// A bearer token for `subject`, valid at the current test clock.
    pub fn token(&self, subject: &str) -> String {
        self.verifier.issue(subject, None).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> TestResponse {
        self.send(request(method, uri, token, Some(body))).await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}
