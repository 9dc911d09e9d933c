//! # Auth Handler Tests
//!
//! Router-level tests for registration, login, refresh and the bearer guard.

mod refresh;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::test_support::{TestApp, PASSWORD};
