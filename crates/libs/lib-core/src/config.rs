//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! The validated [`Config`] is carried in the web layer's application state and
//! handed to whatever needs it. Nothing reads it from a global.
//!
//! ```rust,no_run
//! use lib_core::Config;
//!
//! let config = Config::load()?;
//! println!("{} listening on {}", config.app_name, config.bind_address);
//! # Ok::<(), lib_core::AppError>(())
//! ```

use lib_utils::envs::{self, get_env, get_env_bool, get_env_list, get_env_or, get_env_parse_or};

use crate::error::{AppError, Result};

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

const SUPPORTED_JWT_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Feature toggles read from `FEATURE_*` variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureFlags {
    pub csv_export: bool,
    pub advanced_filters: bool,
    /// Emit `audit` target events for wire mutations.
    pub audit_log: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            csv_export: false,
            advanced_filters: true,
            audit_log: false,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub app_name: String,
    pub environment: String,
    /// Address the HTTP listener binds to
    pub bind_address: String,

    /// SQLite database connection URL
    pub database_url: String,
    /// Redis connection URL for the cache layer
    pub redis_url: String,

    /// Secret key for JWT token signing and verification
    ///
    /// **Must be at least 32 characters long** for security.
    pub jwt_secret: String,
    /// One of HS256, HS384, HS512
    pub jwt_algorithm: String,
    /// Valid range: 1-1440 minutes
    pub access_token_expire_minutes: i64,
    /// Valid range: 1-90 days
    pub refresh_token_expire_days: i64,

    pub cors_origins: Vec<String>,
    pub features: FeatureFlags,

    /// Requests allowed per user and endpoint inside one window
    pub rate_limit_max_requests: u64,
    pub rate_limit_window_secs: u64,

    /// Simulated latency of the background jobs
    pub worker_process_delay_ms: u64,
    pub worker_notify_delay_ms: u64,
}

impl Config {
    /// Read the process environment, then validate. Loading `.env` is the
    /// binary's job.
    pub fn load() -> Result<Self> {
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = get_env("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set in environment".to_string()))?;

        Ok(Self {
            app_name: get_env_or("APP_NAME", "Wire Management API"),
            environment: get_env_or("ENVIRONMENT", "development"),
            bind_address: get_env_or("BIND_ADDRESS", "127.0.0.1:8000"),
            database_url: get_env_or("DATABASE_URL", "sqlite:data/wires.db"),
            redis_url: get_env_or("REDIS_URL", "redis://localhost:6379/0"),
            jwt_secret,
            jwt_algorithm: get_env_or("JWT_ALGORITHM", "HS256"),
            access_token_expire_minutes: get_env_parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 15)
                .map_err(env_err)?,
            refresh_token_expire_days: get_env_parse_or("REFRESH_TOKEN_EXPIRE_DAYS", 7)
                .map_err(env_err)?,
            cors_origins: get_env_list("CORS_ORIGINS", DEFAULT_CORS_ORIGINS),
            features: FeatureFlags {
                csv_export: get_env_bool("FEATURE_CSV_EXPORT", false).map_err(env_err)?,
                advanced_filters: get_env_bool("FEATURE_ADVANCED_FILTERS", true)
                    .map_err(env_err)?,
                audit_log: get_env_bool("FEATURE_AUDIT_LOG", false).map_err(env_err)?,
            },
            rate_limit_max_requests: get_env_parse_or("RATE_LIMIT_MAX_REQUESTS", 100)
                .map_err(env_err)?,
            rate_limit_window_secs: get_env_parse_or("RATE_LIMIT_WINDOW_SECS", 60)
                .map_err(env_err)?,
            worker_process_delay_ms: get_env_parse_or("WORKER_PROCESS_DELAY_MS", 5000)
                .map_err(env_err)?,
            worker_notify_delay_ms: get_env_parse_or("WORKER_NOTIFY_DELAY_MS", 2000)
                .map_err(env_err)?,
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 32 {
            return Err(AppError::Config(
                "JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }

        if !SUPPORTED_JWT_ALGORITHMS.contains(&self.jwt_algorithm.as_str()) {
            return Err(AppError::Config(format!(
                "JWT_ALGORITHM must be one of {}",
                SUPPORTED_JWT_ALGORITHMS.join(", ")
            )));
        }

        if !(1..=1440).contains(&self.access_token_expire_minutes) {
            return Err(AppError::Config(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and 1440".to_string(),
            ));
        }

        if !(1..=90).contains(&self.refresh_token_expire_days) {
            return Err(AppError::Config(
                "REFRESH_TOKEN_EXPIRE_DAYS must be between 1 and 90".to_string(),
            ));
        }

        if self.rate_limit_max_requests == 0 || self.rate_limit_window_secs == 0 {
            return Err(AppError::Config(
                "RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_SECS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn env_err(err: envs::Error) -> AppError {
    match err {
        envs::Error::MissingEnv(name) => AppError::Config(format!("{name} must be set")),
        envs::Error::WrongFormat(name) => AppError::Config(format!("{name} has an invalid value")),
    }
}
