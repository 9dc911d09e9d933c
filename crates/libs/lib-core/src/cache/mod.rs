//! # Cache Layer
//!
//! Key/value store with per-key TTLs behind the [`CacheStore`] port, with two
//! adapters:
//!
//! - [`MemoryCache`]: in-process map, used by tests
//! - [`RedisCache`]: `bb8` pooled Redis connection
//!
//! [`CacheService`] layers the application's key scheme on top and turns every
//! backend failure into a miss or a no-op, so an unreachable cache never fails
//! a request.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis;
pub mod service;

pub use memory::MemoryCache;
pub use redis::RedisCache;
pub use service::CacheService;

/// Errors surfaced by cache adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// No connection has been established, or it was closed.
    #[error("cache backend unavailable")]
    Unavailable,
    /// Backend is reachable but the command failed.
    #[error("cache backend failure: {message}")]
    Backend { message: String },
    /// Stored value could not be used (e.g. INCR on a non-integer).
    #[error("cache value invalid: {message}")]
    InvalidValue { message: String },
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }
}

/// Port implemented by cache backends. Values are opaque strings.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key matching a glob pattern (`*` and `?` wildcards).
    async fn delete_pattern(&self, pattern: &str) -> Result<(), CacheError>;

    /// Atomically add one and return the new count. A key that has no expiry
    /// after the increment (a fresh counter) gets `ttl`; a live TTL is kept.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// Release backend resources. Later calls report [`CacheError::Unavailable`].
    async fn close(&self) {}
}

/// Glob match supporting `*` (any run) and `?` (one character).
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, k));
                p += 1;
            }
            Some(&c) if c == '?' || c == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match star {
                Some((star_p, star_k)) => {
                    p = star_p + 1;
                    k = star_k + 1;
                    star = Some((star_p, star_k + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("wires:user:1:*", "wires:user:1:page:1:size:20:status:all"));
        assert!(!glob_match("wires:user:1:*", "wires:user:12:page:1"));
        assert!(!glob_match("wires:user:1:*", "wires:user:1"));
        assert!(glob_match("wire:?", "wire:7"));
        assert!(!glob_match("wire:?", "wire:77"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
    }
}
