//! # Auth Service
//!
//! Registration, credential checks and token issuance.
//!
//! Access and refresh tokens are signed with the configured secret and
//! algorithm. A refresh token is only accepted by [`AuthService::refresh`],
//! an access token only by [`AuthService::authenticate`].

use chrono::Duration;
use lib_auth::{
    decode_token, encode_token, hash_password, parse_algorithm, verify_password, Algorithm,
    TokenKind,
};
use lib_core::dto::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse};
use lib_core::model::store::UserRepository;
use lib_core::model::User;
use lib_core::{AppError, Config, DbPool, Result};
use tracing::{debug, info, instrument, warn};

pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";
pub const BAD_LOGIN: &str = "Incorrect email or password";
pub const INACTIVE_USER: &str = "Inactive user";

#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    config: Config,
}

impl AuthService {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self { db, config }
    }

    /// Create an active account. The email must not be registered yet.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let hash = hash_password(&req.password).map_err(|e| match e {
            lib_auth::Error::PasswordTooShort => AppError::validation("password", e.to_string()),
            other => AppError::Internal(other.to_string()),
        })?;

        let user = UserRepository::create(&self.db, &req.email, &hash).await?;
        info!(user_id = user.id, "[AUTH] User registered");
        Ok(user)
    }

    /// Check credentials, then the account state, then issue a token pair.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse> {
        let user = UserRepository::find_by_email(&self.db, &req.email)
            .await?
            .filter(|user| verify_password(&req.password, &user.password_hash))
            .ok_or_else(|| {
                warn!("[AUTH] Login rejected");
                AppError::Unauthorized(BAD_LOGIN.to_string())
            })?;

        if !user.is_active {
            warn!(user_id = user.id, "[AUTH] Login by inactive user");
            return Err(AppError::Forbidden(INACTIVE_USER.to_string()));
        }

        info!(user_id = user.id, "[AUTH] Login successful");
        self.issue_tokens(&user)
    }

    /// Trade a refresh token for a fresh pair.
    pub async fn refresh(&self, req: RefreshRequest) -> Result<TokenResponse> {
        let user = self.resolve(&req.refresh_token, TokenKind::Refresh).await?;
        debug!(user_id = user.id, "[AUTH] Tokens refreshed");
        self.issue_tokens(&user)
    }

    /// Resolve a bearer access token to an active user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        self.resolve(token, TokenKind::Access).await
    }

    pub fn issue_tokens(&self, user: &User) -> Result<TokenResponse> {
        let alg = self.algorithm()?;
        let secret = self.config.jwt_secret.as_str();

        let access = encode_token(
            user.id,
            Some(&user.email),
            TokenKind::Access,
            secret,
            alg,
            Duration::minutes(self.config.access_token_expire_minutes),
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let refresh = encode_token(
            user.id,
            None,
            TokenKind::Refresh,
            secret,
            alg,
            Duration::days(self.config.refresh_token_expire_days),
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(TokenResponse::bearer(access, refresh))
    }

    async fn resolve(&self, token: &str, kind: TokenKind) -> Result<User> {
        let alg = self.algorithm()?;
        let claims = decode_token(token, &self.config.jwt_secret, alg, kind)
            .map_err(|e| {
                debug!(error = %e, "[AUTH] Token rejected");
                invalid_credentials()
            })?;
        let user_id = claims.user_id().map_err(|_| invalid_credentials())?;

        let user = UserRepository::find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !user.is_active {
            return Err(AppError::Forbidden(INACTIVE_USER.to_string()));
        }
        Ok(user)
    }

    fn algorithm(&self) -> Result<Algorithm> {
        parse_algorithm(&self.config.jwt_algorithm).map_err(|e| AppError::Config(e.to_string()))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
}
