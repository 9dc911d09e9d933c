//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures used for communication between
//! clients and the backend via the REST API and the WebSocket channel.

pub mod auth;
pub mod wire;
pub mod ws;

pub use auth::*;
pub use wire::*;
pub use ws::*;

pub use crate::error::{ErrorResponse, FieldError};

/// Field-level validation of a request payload.
///
/// Runs before anything touches the store. All failing fields are reported
/// together.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Collect field errors from a list of checks.
pub(crate) fn collect(checks: Vec<(&str, Result<(), String>)>) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = checks
        .into_iter()
        .filter_map(|(field, result)| result.err().map(|message| FieldError::new(field, message)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
