//! # Authentication Data Transfer Objects
//!
//! Request and response structures for the `/api/auth` endpoints.
//!
//! - `POST /api/auth/register` - [`RegisterRequest`] -> [`UserResponse`]
//! - `POST /api/auth/login` - [`LoginRequest`] -> [`TokenResponse`]
//! - `POST /api/auth/refresh` - [`RefreshRequest`] -> [`TokenResponse`]
//! - `GET /api/auth/me` -> [`UserResponse`]
//!
//! ```text
//! POST /api/auth/login
//! {"email": "alice@example.com", "password": "MyPassword123!"}
//!
//! {"access_token": "eyJ...", "refresh_token": "eyJ...", "token_type": "bearer"}
//! ```

use chrono::{DateTime, Utc};
use lib_utils::validation::{validate_email, validate_length};
use serde::{Deserialize, Serialize};

use super::{collect, Validate};
use crate::error::FieldError;
use crate::model::User;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect(vec![
            ("email", validate_email(&self.email)),
            (
                "password",
                validate_length(&self.password, PASSWORD_MIN_LEN, PASSWORD_MAX_LEN, "password"),
            ),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect(vec![("email", validate_email(&self.email))])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Ok(())
    }
}

/// Access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation_reports_all_fields() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = req.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn test_register_password_bounds() {
        let ok = RegisterRequest {
            email: "a@x.com".to_string(),
            password: "x".repeat(100),
        };
        assert!(ok.validate().is_ok());

        let long = RegisterRequest {
            password: "x".repeat(101),
            ..ok
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_token_response_is_bearer() {
        let tokens = TokenResponse::bearer("a".into(), "r".into());
        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json["token_type"], "bearer");
    }
}
