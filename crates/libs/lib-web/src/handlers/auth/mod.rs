//! # Authentication Handlers
//!
//! HTTP request handlers for account endpoints.
//!
//! ## Overview
//!
//! - Registration with email/password
//! - Login issuing an access/refresh token pair
//! - Refresh exchanging a refresh token for a new pair
//! - `me` returning the authenticated account
//!
//! ```text
//! POST /api/auth/register {email, password}  -> 201 UserResponse
//! POST /api/auth/login    {email, password}  -> 200 TokenResponse
//! POST /api/auth/refresh  {refresh_token}    -> 200 TokenResponse
//! GET  /api/auth/me       Bearer <access>    -> 200 UserResponse
//! ```

use axum::{extract::State, http::StatusCode, Json};
use lib_core::dto::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserResponse};
use lib_core::Result;
use tracing::{info, instrument};

use crate::extract::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::services::AuthService;

/// Register a new account.
///
/// 400 when the email is already registered, 422 when the email or the
/// password length is invalid.
#[instrument(skip_all)]
pub async fn register(
    State(auth): State<AuthService>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    info!("[REGISTER] New registration request");
    let user = auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in with email and password.
///
/// Wrong email and wrong password are indistinguishable (401). A correct
/// password on a deactivated account yields 403.
#[instrument(skip_all)]
pub async fn login(
    State(auth): State<AuthService>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    Ok(Json(auth.login(req).await?))
}

pub async fn refresh(
    State(auth): State<AuthService>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    Ok(Json(auth.refresh(req).await?))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

#[cfg(test)]
mod tests;
