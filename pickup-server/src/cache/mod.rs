//! In-process PIN shadow cache
//!
//! Entries expire after their TTL. Expired entries read as a miss and are
//! removed lazily on access and periodically by [`MemoryPinCache::purge_expired`].

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::orders::error::CacheError;
use crate::orders::ports::PinCache;

/// Cache entry for one order's PIN
struct PinCacheEntry {
    pin: String,
    expires_at: Instant,
}

/// PIN cache shared across requests
#[derive(Clone, Default)]
pub struct MemoryPinCache {
    entries: Arc<DashMap<Uuid, PinCacheEntry>>,
}

impl MemoryPinCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl PinCache for MemoryPinCache {
    async fn set(&self, order_id: Uuid, pin: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            order_id,
            PinCacheEntry {
                pin: pin.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(&order_id)
            && entry.expires_at > now
        {
            return Ok(Some(entry.pin.clone()));
        }
        // expired or absent; the guard above is released before removing
        self.entries
            .remove_if(&order_id, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn delete(&self, order_id: Uuid) -> Result<(), CacheError> {
        self.entries.remove(&order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryPinCache::new();
        let id = Uuid::new_v4();
        cache.set(id, "123456", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(id).await.unwrap().as_deref(), Some("123456"));
        assert_eq!(cache.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = MemoryPinCache::new();
        let id = Uuid::new_v4();
        cache.set(id, "123456", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get(id).await.unwrap(), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = MemoryPinCache::new();
        let id = Uuid::new_v4();
        cache.set(id, "000001", Duration::from_secs(60)).await.unwrap();
        cache.delete(id).await.unwrap();
        assert_eq!(cache.get(id).await.unwrap(), None);
        // deleting a missing key is fine
        cache.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let cache = MemoryPinCache::new();
        cache
            .set(Uuid::new_v4(), "111111", Duration::from_millis(10))
            .await
            .unwrap();
        cache
            .set(Uuid::new_v4(), "222222", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
