//! Redis-backed [`CacheStore`] over a `bb8` connection pool.
//!
//! The pool is created once at startup with [`RedisCache::connect`] and torn
//! down once at shutdown with [`CacheStore::close`]. A cache built with
//! [`RedisCache::disconnected`] answers every call with
//! [`CacheError::Unavailable`].

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::{Pool, RunError};
use bb8_redis::redis::{self, AsyncCommands, RedisError};
use bb8_redis::RedisConnectionManager;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CacheError, CacheStore};

const POOL_MAX_SIZE: u32 = 16;
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(2);

type RedisPool = Pool<RedisConnectionManager>;

/// INCR and EXPIRE as one server-side step. Every counter leaves the script
/// with a TTL.
const INCR_WITH_TTL: &str = r#"
local count = redis.call('INCR', KEYS[1])
if redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

pub struct RedisCache {
    pool: RwLock<Option<RedisPool>>,
}

impl RedisCache {
    /// Build the pool and check the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let manager = RedisConnectionManager::new(url).map_err(backend)?;
        let pool = Pool::builder()
            .max_size(POOL_MAX_SIZE)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .await
            .map_err(backend)?;

        {
            let mut conn = pool.get().await.map_err(run_error)?;
            let _: String = redis::cmd("PING")
                .query_async(&mut *conn)
                .await
                .map_err(backend)?;
        }

        info!("Connected to Redis cache");
        Ok(Self {
            pool: RwLock::new(Some(pool)),
        })
    }

    /// A cache with no backend.
    pub fn disconnected() -> Self {
        Self {
            pool: RwLock::new(None),
        }
    }

    async fn pool(&self) -> Result<RedisPool, CacheError> {
        self.pool.read().await.clone().ok_or(CacheError::Unavailable)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(run_error)?;
        conn.get(key).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(run_error)?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(backend)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(run_error)?;
        conn.del::<_, ()>(key).await.map_err(backend)
    }

    // TODO: switch to SCAN once keyspaces grow past a few thousand keys; KEYS blocks the server.
    async fn delete_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(run_error)?;
        let keys: Vec<String> = conn.keys(pattern).await.map_err(backend)?;
        if keys.is_empty() {
            return Ok(());
        }
        debug!(count = keys.len(), "Deleting keys matching {}", pattern);
        conn.del::<_, ()>(keys).await.map_err(backend)
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let pool = self.pool().await?;
        let mut conn = pool.get().await.map_err(run_error)?;
        redis::Script::new(INCR_WITH_TTL)
            .key(key)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut *conn)
            .await
            .map_err(backend)
    }

    async fn close(&self) {
        if self.pool.write().await.take().is_some() {
            info!("Redis cache disconnected");
        }
    }
}

fn backend(err: RedisError) -> CacheError {
    CacheError::backend(err.to_string())
}

fn run_error(err: RunError<RedisError>) -> CacheError {
    CacheError::backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnected_reports_unavailable() {
        let cache = RedisCache::disconnected();
        assert_eq!(cache.get("k").await, Err(CacheError::Unavailable));
        assert_eq!(
            cache.set("k", "v", Duration::from_secs(1)).await,
            Err(CacheError::Unavailable)
        );
        assert_eq!(
            cache.incr_with_ttl("k", Duration::from_secs(1)).await,
            Err(CacheError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let result = RedisCache::connect("redis://127.0.0.1:1/0").await;
        assert!(result.is_err());
    }
}
