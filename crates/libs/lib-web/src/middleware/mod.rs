//! # Middleware
//!
//! Axum middleware for authentication, rate limiting, request stamping,
//! request logging and error response mapping.
//!
//! ## Modules
//!
//! - **[`mw_auth`]**: bearer token authentication, injects [`CurrentUser`]
//! - **[`mw_rate_limit`]**: fixed-window limiter per user and endpoint
//! - **[`mw_req_stamp`]**: request ID and timestamp stamping
//! - **[`mw_logging`]**: request/response logging with redaction
//! - **[`mw_res_map`]**: error body path injection and panic conversion

// region: --- Modules
pub mod mw_auth;
pub mod mw_logging;
pub mod mw_rate_limit;
pub mod mw_req_stamp;
pub mod mw_res_map;
// endregion: --- Modules

// region: --- Re-exports
pub use mw_auth::{require_auth, CurrentUser};
pub use mw_logging::log_requests;
pub use mw_rate_limit::rate_limit;
pub use mw_req_stamp::{stamp_req, RequestStamp};
pub use mw_res_map::{handle_panic, map_res};
// endregion: --- Re-exports
