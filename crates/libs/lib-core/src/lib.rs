//! # Core Library
//!
//! Configuration, errors, DTOs, the SQLite store and the cache layer.

pub mod cache;
pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use cache::{CacheService, CacheStore, MemoryCache, RedisCache};
pub use config::{Config, FeatureFlags};
pub use error::{AppError, ErrorResponse, FieldError, Result};
pub use model::store::{create_memory_pool, create_pool, run_migrations, DbPool};
