//! # Model Layer
//!
//! Domain records and their SQLite-backed store.

pub mod store;

pub use store::models::{User, Wire, WirePage, WireStatus};
