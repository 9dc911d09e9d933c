//! # WebSocket Fan-out
//!
//! Connection registry shared by the `/ws` handler and the wire service.

pub mod registry;

pub use registry::{Connection, ConnectionId, ConnectionRegistry};
