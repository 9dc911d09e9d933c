//! # Cache Service
//!
//! Application key scheme and TTL policy over a [`CacheStore`].
//!
//! | Key | Value | TTL |
//! |---|---|---|
//! | `wires:user:{id}:page:{p}:size:{s}:status:{status\|all}` | one list page | 300 s |
//! | `wire:{id}` | one wire | 600 s |
//! | `ratelimit:{user}:{endpoint}` | request counter | window |
//!
//! Any write to a user's wires drops `wires:user:{id}` and everything under
//! `wires:user:{id}:*`. Invalidation runs after the database commit, so a
//! concurrent reader can repopulate a stale page; staleness is bounded by the TTL.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{CacheError, CacheStore};
use crate::model::store::WireQuery;
use crate::model::{Wire, WirePage};

pub const USER_WIRES_TTL: Duration = Duration::from_secs(300);
pub const WIRE_TTL: Duration = Duration::from_secs(600);

pub fn user_wires_key(user_id: i64) -> String {
    format!("wires:user:{user_id}")
}

pub fn user_wires_page_key(user_id: i64, query: &WireQuery) -> String {
    format!(
        "{}:page:{}:size:{}:status:{}",
        user_wires_key(user_id),
        query.page(),
        query.page_size(),
        query.status_label()
    )
}

pub fn wire_key(wire_id: i64) -> String {
    format!("wire:{wire_id}")
}

pub fn rate_limit_key(user_id: i64, endpoint: &str) -> String {
    format!("ratelimit:{user_id}:{endpoint}")
}

/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    // region:    --- Wire lists

    pub async fn get_user_wires(&self, user_id: i64, query: &WireQuery) -> Option<WirePage> {
        self.get_json(&user_wires_page_key(user_id, query)).await
    }

    pub async fn set_user_wires(&self, user_id: i64, query: &WireQuery, page: &WirePage) {
        self.set_json(&user_wires_page_key(user_id, query), page, USER_WIRES_TTL)
            .await;
    }

    pub async fn invalidate_user_wires(&self, user_id: i64) {
        let key = user_wires_key(user_id);
        degrade("delete", &key, self.store.delete(&key).await);

        let pattern = format!("{key}:*");
        degrade("delete_pattern", &pattern, self.store.delete_pattern(&pattern).await);
    }

    // endregion: --- Wire lists

    // region:    --- Single wire

    /// Cached wire, served only when `owner` created it.
    pub async fn get_wire(&self, wire_id: i64, owner: i64) -> Option<Wire> {
        self.get_json::<Wire>(&wire_key(wire_id))
            .await
            .filter(|wire| wire.created_by == owner)
    }

    pub async fn set_wire(&self, wire: &Wire) {
        self.set_json(&wire_key(wire.id), wire, WIRE_TTL).await;
    }

    pub async fn invalidate_wire(&self, wire_id: i64) {
        let key = wire_key(wire_id);
        degrade("delete", &key, self.store.delete(&key).await);
    }

    // endregion: --- Single wire

    // region:    --- Rate limiting

    /// Fixed-window limiter. The first request opens a window of `window`
    /// seconds; once `max_requests` have been counted, later requests are
    /// refused until the key expires. A failing backend lets everything through.
    pub async fn check_rate_limit(
        &self,
        user_id: i64,
        endpoint: &str,
        max_requests: u64,
        window: Duration,
    ) -> bool {
        let key = rate_limit_key(user_id, endpoint);

        let count = match self.store.incr_with_ttl(&key, window).await {
            Ok(count) => count,
            Err(err) => {
                warn!(key = %key, error = %err, "Rate limiter degraded, allowing request");
                return true;
            }
        };

        if count > 0 && count as u64 > max_requests {
            debug!(key = %key, count, "Rate limit reached");
            return false;
        }
        true
    }

    // endregion: --- Rate limiting

    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key = %key, error = %err, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %key, error = %err, "Dropping undecodable cache entry");
                degrade("delete", key, self.store.delete(key).await);
                None
            }
        }
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => degrade("set", key, self.store.set(key, &raw, ttl).await),
            Err(err) => warn!(key = %key, error = %err, "Cache value not serializable"),
        }
    }
}

fn degrade(op: &str, key: &str, result: Result<(), CacheError>) {
    if let Err(err) = result {
        warn!(op, key = %key, error = %err, "Cache write skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, RedisCache};
    use crate::model::WireStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn service() -> (CacheService, Arc<MemoryCache>) {
        let store = Arc::new(MemoryCache::new());
        (CacheService::new(store.clone()), store)
    }

    fn wire(id: i64, owner: i64) -> Wire {
        Wire {
            id,
            sender_name: "Alice".into(),
            recipient_name: "Bob".into(),
            amount: Decimal::new(50000, 2),
            currency: "USD".into(),
            status: WireStatus::Pending,
            reference_number: "WIRE-ABCDEF123456".into(),
            created_by: owner,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_key_scheme() {
        let query = WireQuery::new(Some(2), Some(10), Some("failed")).unwrap();
        assert_eq!(
            user_wires_page_key(4, &query),
            "wires:user:4:page:2:size:10:status:failed"
        );
        assert_eq!(
            user_wires_page_key(4, &WireQuery::default()),
            "wires:user:4:page:1:size:20:status:all"
        );
        assert_eq!(wire_key(9), "wire:9");
        assert_eq!(rate_limit_key(1, "GET:/api/wires"), "ratelimit:1:GET:/api/wires");
    }

    #[tokio::test]
    async fn test_user_wires_round_trip_and_invalidation() {
        let (cache, store) = service();
        let page = WirePage {
            wires: vec![wire(1, 4)],
            total: 1,
        };
        let first = WireQuery::default();
        let second = WireQuery::new(Some(2), None, None).unwrap();

        cache.set_user_wires(4, &first, &page).await;
        cache.set_user_wires(4, &second, &page).await;
        cache.set_user_wires(5, &first, &page).await;
        assert_eq!(cache.get_user_wires(4, &first).await, Some(page.clone()));

        cache.invalidate_user_wires(4).await;

        assert_eq!(cache.get_user_wires(4, &first).await, None);
        assert_eq!(cache.get_user_wires(4, &second).await, None);
        assert!(store.keys().await.iter().all(|k| !k.starts_with("wires:user:4")));
        assert_eq!(cache.get_user_wires(5, &first).await, Some(page));
    }

    #[tokio::test]
    async fn test_cached_wire_only_served_to_owner() {
        let (cache, _) = service();
        let wire = wire(7, 1);
        cache.set_wire(&wire).await;

        assert_eq!(cache.get_wire(7, 1).await, Some(wire));
        assert_eq!(cache.get_wire(7, 2).await, None);

        cache.invalidate_wire(7).await;
        assert_eq!(cache.get_wire(7, 1).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_fixed_window() {
        let (cache, _) = service();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            assert!(cache.check_rate_limit(1, "GET:/api/wires", 3, window).await);
        }
        assert!(!cache.check_rate_limit(1, "GET:/api/wires", 3, window).await);

        // Other users and endpoints have their own counters.
        assert!(cache.check_rate_limit(2, "GET:/api/wires", 3, window).await);
        assert!(cache.check_rate_limit(1, "POST:/api/wires", 3, window).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.check_rate_limit(1, "GET:/api/wires", 3, window).await);
    }

    /// Store whose every reply arrives `lag` after the call.
    struct LaggingStore {
        inner: MemoryCache,
        lag: Duration,
    }

    #[async_trait::async_trait]
    impl CacheStore for LaggingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            tokio::time::sleep(self.lag).await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            tokio::time::sleep(self.lag).await;
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.inner.delete(key).await
        }

        async fn delete_pattern(&self, pattern: &str) -> Result<(), CacheError> {
            self.inner.delete_pattern(pattern).await
        }

        async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
            tokio::time::sleep(self.lag).await;
            self.inner.incr_with_ttl(key, ttl).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_window_resets_when_key_expires_mid_check() {
        let store = Arc::new(LaggingStore {
            inner: MemoryCache::new(),
            lag: Duration::from_millis(200),
        });
        let cache = CacheService::new(store.clone());
        let window = Duration::from_secs(60);
        let key = rate_limit_key(1, "GET:/api/wires");

        store
            .inner
            .set(&key, "1", Duration::from_millis(100))
            .await
            .unwrap();

        for _ in 0..3 {
            assert!(cache.check_rate_limit(1, "GET:/api/wires", 3, window).await);
        }
        assert!(!cache.check_rate_limit(1, "GET:/api/wires", 3, window).await);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(store.inner.keys().await.is_empty());
        assert!(cache.check_rate_limit(1, "GET:/api/wires", 3, window).await);
    }

    #[tokio::test]
    async fn test_rate_limit_counts_concurrent_requests() {
        let (cache, _) = service();
        let window = Duration::from_secs(60);

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                cache.check_rate_limit(1, "POST:/api/wires", 3, window).await
            }));
        }

        let mut allowed = 0;
        for task in tasks {
            if task.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 3);
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades() {
        let cache = CacheService::new(Arc::new(RedisCache::disconnected()));

        cache.set_wire(&wire(1, 1)).await;
        assert_eq!(cache.get_wire(1, 1).await, None);
        assert_eq!(cache.get_user_wires(1, &WireQuery::default()).await, None);
        cache.invalidate_user_wires(1).await;
        for _ in 0..10 {
            assert!(cache.check_rate_limit(1, "GET:/api/wires", 1, Duration::from_secs(60)).await);
        }
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (cache, store) = service();
        store.set("wire:3", "{not json", WIRE_TTL).await.unwrap();

        assert_eq!(cache.get_wire(3, 1).await, None);
        assert!(store.get("wire:3").await.unwrap().is_none());
    }
}
