//! # Server Setup
//!
//! Tracing initialization, application state, router assembly and the
//! serve/shutdown lifecycle.
//!
//! Startup order: tracing, config, SQLite pool and migrations, Redis cache
//! (degraded when unreachable), worker, router, listener. Shutdown runs in
//! reverse once the listener has drained.

// region: --- Imports
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use axum::http::{header, HeaderValue, Method, Request, Response};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use lib_core::{
    create_pool, run_migrations, AppError, CacheService, CacheStore, Config, DbPool, RedisCache,
};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Span};

use crate::handlers;
use crate::middleware::{handle_panic, log_requests, map_res, rate_limit, require_auth, stamp_req, RequestStamp};
use crate::services::{AuthService, WireService};
use crate::worker::{spawn_worker, TaskQueue, WorkerDelays};
use crate::ws::ConnectionRegistry;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub cache: CacheService,
    pub registry: Arc<ConnectionRegistry>,
    pub tasks: TaskQueue,
}

impl AppState {
    pub fn new(db: DbPool, config: Config, cache: CacheService, tasks: TaskQueue) -> Self {
        Self {
            db,
            config,
            cache,
            registry: Arc::new(ConnectionRegistry::new()),
            tasks,
        }
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for CacheService {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}

impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        AuthService::new(state.db.clone(), state.config.clone())
    }
}

impl FromRef<AppState> for WireService {
    fn from_ref(state: &AppState) -> Self {
        WireService::new(
            state.db.clone(),
            state.cache.clone(),
            state.registry.clone(),
            state.tasks.clone(),
            state.config.features.audit_log,
        )
    }
}
// endregion: --- AppState

// region: --- Tracing
/// Install the global fmt subscriber. `LOG_LEVEL` picks the level, default info.
pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {
            tracing_subscriber::EnvFilter::new(log_level.as_str())
        }
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}
// endregion: --- Tracing

// region: --- Server Setup
/// Initialize and run the HTTP server until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Fails when configuration is invalid, the database cannot be opened or
/// migrated, or the listener cannot bind.
pub async fn start_server() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    info!(
        app = %config.app_name,
        environment = %config.environment,
        "[STARTUP] Configuration loaded"
    );

    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;
    info!("[STARTUP] Database ready");

    let store: Arc<dyn CacheStore> = match RedisCache::connect(&config.redis_url).await {
        Ok(redis) => {
            info!("[STARTUP] Redis cache connected");
            Arc::new(redis)
        }
        Err(e) => {
            warn!(error = %e, "[STARTUP] Redis unavailable, running without cache");
            Arc::new(RedisCache::disconnected())
        }
    };
    let cache = CacheService::new(store);

    let (tasks, worker) = spawn_worker(WorkerDelays::from_config(&config), None);

    let state = AppState::new(db.clone(), config.clone(), cache.clone(), tasks);
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("[STARTUP] Listening on http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("[SHUTDOWN] Listener closed");
    worker.shutdown().await;
    cache.close().await;
    db.close().await;
    info!("[SHUTDOWN] Complete");

    Ok(())
}

/// Build the full router with every route and middleware layer.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let wire_routes = Router::new()
        .route(
            "/api/wires",
            post(handlers::wires::create_wire).get(handlers::wires::list_wires),
        )
        .route(
            "/api/wires/{id}",
            get(handlers::wires::get_wire)
                .put(handlers::wires::update_wire)
                .delete(handlers::wires::delete_wire),
        )
        // Layers run outermost-last: authenticate, then count the request
        .route_layer(from_fn_with_state(state.clone(), rate_limit))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/auth/me",
            get(handlers::auth::me).route_layer(from_fn_with_state(state.clone(), require_auth)),
        )
        .route("/ws", get(handlers::websocket::ws_handler))
        .merge(wire_routes)
        .fallback(|| async { AppError::NotFound("Not Found".to_string()) })
        .with_state(state)
        .layer(from_fn(log_requests))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {
                    // Detailed logging is handled by log_requests
                })
                .on_response(|_response: &Response<_>, _latency: Duration, _span: &Span| {})
                .on_failure(
                    |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] {:?}",
                            error
                        );
                    },
                ),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        // Request stamping wraps tracing so the span can carry the request ID
        .layer(from_fn(stamp_req))
        .layer(from_fn(map_res))
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "[CORS] Ignoring invalid origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "[SHUTDOWN] Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "[SHUTDOWN] SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("[SHUTDOWN] Signal received, draining connections");
}

/// Log the route table
fn log_server_info() {
    info!(" AUTH:");
    info!("   • POST   /api/auth/register");
    info!("   • POST   /api/auth/login");
    info!("   • POST   /api/auth/refresh");
    info!("   • GET    /api/auth/me");
    info!(" WIRES:");
    info!("   • POST   /api/wires");
    info!("   • GET    /api/wires?page=1&page_size=20&status=pending");
    info!("   • GET    /api/wires/{{id}}");
    info!("   • PUT    /api/wires/{{id}}");
    info!("   • DELETE /api/wires/{{id}}");
    info!(" REALTIME:");
    info!("   • WS     /ws");
    info!(" HEALTH:");
    info!("   • GET    /");
    info!("   • GET    /health");
}
// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_root_and_health() {
        let app = TestApp::new().await;

        let (status, body) = app.request(Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Wire Management API");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["environment"], "test");

        let (status, body) = app.request(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404_with_path() {
        let app = TestApp::new().await;

        let (status, body) = app.request(Method::GET, "/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status_code"], 404);
        assert_eq!(body["path"], "/nope");
    }
}
