//! # Web Library
//!
//! HTTP surface of the wire service: router, middleware, handlers, services,
//! the WebSocket registry and the background worker.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod worker;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support;

pub use server::{create_router, init_tracing, start_server, AppState};
