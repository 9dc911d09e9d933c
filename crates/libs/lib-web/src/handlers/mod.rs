//! # HTTP Request Handlers
//!
//! Axum request handlers organized by feature domain. Handlers only extract,
//! delegate to a service in [`crate::services`] and pick the status code.
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: account endpoints
//!   - `POST /api/auth/register` - Create an account
//!   - `POST /api/auth/login` - Exchange credentials for a token pair
//!   - `POST /api/auth/refresh` - Exchange a refresh token for a new pair
//!   - `GET /api/auth/me` - Current account
//!
//! - **[`wires`]**: wire transfer CRUD, all authenticated and rate limited
//!   - `POST /api/wires`, `GET /api/wires`
//!   - `GET|PUT|DELETE /api/wires/{id}`
//!
//! - **[`websocket`]**: `GET /ws`, acks and status broadcasts
//!
//! - **[`health`]**: `GET /` and `GET /health`
//!
//! ## Handler Architecture
//!
//! ```rust,ignore
//! async fn handler(
//!     State(wires): State<WireService>,          // service built from AppState
//!     CurrentUser(user): CurrentUser,            // set by require_auth
//!     ValidatedJson(req): ValidatedJson<Body>,   // 422 on bad input
//! ) -> Result<Json<Response>, AppError> {
//!     Ok(Json(wires.do_something(&user, req).await?))
//! }
//! ```
//!
//! Errors are returned as [`AppError`](lib_core::AppError), which renders the
//! shared JSON error body.

pub mod auth;
pub mod health;
pub mod websocket;
pub mod wires;
