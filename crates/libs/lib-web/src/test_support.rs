//! Shared fixtures for router-level tests: an in-memory database, an
//! in-memory cache and a worker without delays behind the real router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use lib_core::dto::TokenResponse;
use lib_core::{create_memory_pool, CacheService, Config, FeatureFlags, MemoryCache};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::server::{create_router, AppState};
use crate::worker::{spawn_worker, WorkerDelays, WorkerHandle};

pub const PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> Config {
    Config {
        app_name: "Wire Management API".to_string(),
        environment: "test".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        redis_url: "redis://127.0.0.1:1/0".to_string(),
        jwt_secret: "test-secret-key-must-be-at-least-32-characters-long!".to_string(),
        jwt_algorithm: "HS256".to_string(),
        access_token_expire_minutes: 15,
        refresh_token_expire_days: 7,
        cors_origins: vec!["http://localhost:3000".to_string()],
        features: FeatureFlags::default(),
        rate_limit_max_requests: 1000,
        rate_limit_window_secs: 60,
        worker_process_delay_ms: 0,
        worker_notify_delay_ms: 0,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryCache>,
    _worker: WorkerHandle,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let db = create_memory_pool().await.unwrap();
        let store = Arc::new(MemoryCache::new());
        let cache = CacheService::new(store.clone());
        let (tasks, worker) = spawn_worker(
            WorkerDelays {
                process: Duration::ZERO,
                notify: Duration::ZERO,
            },
            None,
        );

        let state = AppState::new(db, config, cache, tasks);
        Self {
            router: create_router(state.clone()),
            state,
            store,
            _worker: worker,
        }
    }

    /// Send one request through the full middleware stack.
    pub async fn request(
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
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let res = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register and log in, returning the token pair.
    pub async fn sign_in(&self, email: &str) -> TokenResponse {
        let (status, _) = self.register(email, PASSWORD).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_value(body).unwrap()
    }

    pub async fn create_wire(&self, token: &str, sender: &str, amount: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/wires",
                Some(token),
                Some(json!({
                    "sender_name": sender,
                    "recipient_name": "Bob",
                    "amount": amount,
                    "currency": "USD",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    /// Serve the router on an ephemeral port.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }
}
