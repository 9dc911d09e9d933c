//! # Wire Handler Tests
//!
//! Router-level tests with an in-memory store and cache.

mod cache;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::test_support::TestApp;

fn wire_uri(id: &Value) -> String {
    format!("/api/wires/{}", id.as_i64().unwrap())
}
