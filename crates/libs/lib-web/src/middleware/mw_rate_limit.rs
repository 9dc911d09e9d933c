//! # Rate Limiting Middleware
//!
//! Fixed-window limiter keyed by user and endpoint, backed by the cache.
//! The endpoint is the method plus the matched route template, so
//! `GET /api/wires/1` and `GET /api/wires/2` share one window.
//!
//! Must run after [`require_auth`](super::require_auth). When the cache is
//! unavailable every request is allowed.

use std::time::Duration;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use lib_core::AppError;
use tracing::warn;

use super::mw_auth::CurrentUser;
use crate::server::AppState;

pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user_id) = req.extensions().get::<CurrentUser>().map(|u| u.0.id) else {
        return Ok(next.run(req).await);
    };

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let endpoint = format!("{}:{}", req.method(), route);

    let allowed = state
        .cache
        .check_rate_limit(
            user_id,
            &endpoint,
            state.config.rate_limit_max_requests,
            Duration::from_secs(state.config.rate_limit_window_secs),
        )
        .await;

    if !allowed {
        warn!(user_id, endpoint = %endpoint, "[RATE LIMIT] Request refused");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(req).await)
}
