//! # JWT Token Management
//!
//! Short-lived access tokens and long-lived refresh tokens. Both carry the
//! user id as `sub` and a `type` claim so one can never stand in for the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure containing user authentication information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email, present on access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| Error::TokenInvalid("subject is not a user id".to_string()))
    }
}

/// Map a configured algorithm name onto the HMAC family.
pub fn parse_algorithm(name: &str) -> Result<Algorithm> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(Error::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Encode a JWT token with user claims.
pub fn encode_token(
    user_id: i64,
    email: Option<&str>,
    kind: TokenKind,
    secret: &str,
    algorithm: Algorithm,
    ttl: Duration,
) -> Result<String> {
    let now = Utc::now();
    let exp = now + ttl;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        kind,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::TokenEncode(e.to_string()))
}

/// Decode and validate a JWT token, requiring the expected kind.
pub fn decode_token(
    token: &str,
    secret: &str,
    algorithm: Algorithm,
    expected: TokenKind,
) -> Result<Claims> {
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::TokenInvalid(e.to_string()),
    })?;

    if token_data.claims.kind != expected {
        return Err(Error::TokenInvalid("wrong token type".to_string()));
    }

    Ok(token_data.claims)
}
