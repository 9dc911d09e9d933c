//! # Authentication Middleware
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! authenticated account as [`CurrentUser`] into the request extensions.
//!
//! | Situation | Response |
//! |---|---|
//! | no `Authorization` header, or not a bearer scheme | 403 "Not authenticated" |
//! | bad signature, expired, refresh token, unknown user | 401 "Could not validate credentials" |
//! | inactive user | 403 "Inactive user" |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/api/auth/me", get(me))
//!     .route_layer(from_fn_with_state(state.clone(), require_auth));
//!
//! async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
//!     Json(user.into())
//! }
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use lib_core::model::User;
use lib_core::AppError;
use tracing::{debug, warn};

use crate::server::AppState;
use crate::services::AuthService;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// The account that owns the current request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Forbidden(NOT_AUTHENTICATED.to_string()))
    }
}

/// Authentication middleware for protected routes.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;

    let auth = AuthService::new(state.db.clone(), state.config.clone());
    let user = auth.authenticate(token).await.inspect_err(|e| {
        warn!(error = %e, "[AUTH] Request rejected");
    })?;

    debug!(user_id = user.id, "[AUTH] Authenticated");
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Pull the token out of a bearer `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let not_authenticated = || AppError::Forbidden(NOT_AUTHENTICATED.to_string());

    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(not_authenticated)?;

    let (scheme, token) = value.split_once(' ').ok_or_else(not_authenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(not_authenticated());
    }
    Ok(token.trim())
}
