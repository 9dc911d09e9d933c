use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    #[error("Failed to encode token: {0}")]
    TokenEncode(String),

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
