//! # Services Layer
//!
//! Business logic between the HTTP handlers and the store:
//!
//! ```text
//! Handlers (HTTP) -> Services -> Repository / Cache / Registry / Worker
//! ```
//!
//! Services hold their dependencies by value (pool, cache handle, queue) and
//! are built from [`AppState`](crate::server::AppState) through `FromRef`, so a
//! handler only asks for `State<WireService>` or `State<AuthService>`.
//!
//! All methods return `lib_core::Result<T>`; lower-level failures are already
//! mapped onto [`AppError`](lib_core::AppError) variants.

pub mod auth;
pub mod wire;

pub use auth::AuthService;
pub use wire::WireService;
