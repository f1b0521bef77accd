use crate::models::{CandidateFilter, Profile, ProfileId};
use redis::aio::ConnectionManager;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalidation error: {0}")]
    InvalidationError(String),
}

/// Two-tier cache of candidate lists
///
/// L1 is a per-instance moka cache holding decoded lists; L2 is redis,
/// shared across instances and holding JSON. Entries are keyed per viewer
/// and filter so one viewer's decision only drops that viewer's lists.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Arc<Vec<Profile>>>,
    ttl_secs: u64,
}

impl CacheManager {
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .support_invalidation_closures()
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Cached candidates for `viewer` under `filter`, `None` on a miss
    pub async fn candidates(
        &self,
        viewer_id: &ProfileId,
        filter: &CandidateFilter,
        limit: usize,
    ) -> Result<Option<Vec<Profile>>, CacheError> {
        let key = CacheKey::candidates(viewer_id, filter, limit);

        if let Some(list) = self.l1_cache.get(&key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(Some(list.as_ref().clone()));
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        let Some(json) = value else {
            tracing::trace!("Cache miss: {}", key);
            return Ok(None);
        };

        tracing::trace!("L2 cache hit: {}", key);
        let list: Vec<Profile> = serde_json::from_str(&json)?;
        self.l1_cache.insert(key, Arc::new(list.clone())).await;
        Ok(Some(list))
    }

    /// Store a freshly fetched candidate list in both tiers
    pub async fn store_candidates(
        &self,
        viewer_id: &ProfileId,
        filter: &CandidateFilter,
        limit: usize,
        candidates: &[Profile],
    ) -> Result<(), CacheError> {
        let key = CacheKey::candidates(viewer_id, filter, limit);
        let json = serde_json::to_string(candidates)?;

        self.l1_cache
            .insert(key.clone(), Arc::new(candidates.to_vec()))
            .await;

        let mut conn = self.redis.lock().await;
        redis::cmd("SETEX")
            .arg(&key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<()>(&mut *conn)
            .await?;

        tracing::trace!("Cached {} candidates under {}", candidates.len(), key);
        Ok(())
    }

    /// Drop every candidate list cached for `viewer`
    pub async fn invalidate_viewer(&self, viewer_id: &ProfileId) -> Result<(), CacheError> {
        let prefix = CacheKey::viewer_prefix(viewer_id);

        let l1_prefix = prefix.clone();
        self.l1_cache
            .invalidate_entries_if(move |key, _| key.starts_with(&l1_prefix))
            .map_err(|e| CacheError::InvalidationError(e.to_string()))?;

        // SCAN rather than KEYS so a large keyspace never blocks redis
        let pattern = format!("{}*", prefix);
        let mut conn = self.redis.lock().await;
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                redis::cmd("DEL")
                    .arg(keys)
                    .query_async::<()>(&mut *conn)
                    .await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!("Invalidated candidate cache for {} ({} redis keys)", viewer_id, removed);
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a viewer's candidate list under a filter and page size
    pub fn candidates(viewer_id: &ProfileId, filter: &CandidateFilter, limit: usize) -> String {
        let mut hasher = DefaultHasher::new();
        filter.age_from.hash(&mut hasher);
        filter.age_to.hash(&mut hasher);
        filter.city.hash(&mut hasher);
        filter.exclude_gender_matching.hash(&mut hasher);
        filter.search.hash(&mut hasher);
        limit.hash(&mut hasher);

        format!("{}{:016x}", Self::viewer_prefix(viewer_id), hasher.finish())
    }

    /// Prefix shared by every candidate key of a viewer
    pub fn viewer_prefix(viewer_id: &ProfileId) -> String {
        format!("candidates:{}:", viewer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> Profile {
        Profile {
            id: ProfileId::from(id),
            name: "Mia".to_string(),
            age: 30,
            gender: None,
            city: Some("Pula".to_string()),
            bio: None,
            interests: vec![],
            is_online: false,
            last_seen: None,
            photo_ids: vec![],
        }
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_store_and_invalidate() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let viewer = ProfileId::new(format!("viewer-{}", uuid::Uuid::new_v4()));
        let other = ProfileId::new(format!("other-{}", uuid::Uuid::new_v4()));
        let filter = CandidateFilter::default();
        let list = vec![profile("a"), profile("b")];

        cache.store_candidates(&viewer, &filter, 20, &list).await.unwrap();
        cache.store_candidates(&other, &filter, 20, &list).await.unwrap();
        assert_eq!(cache.candidates(&viewer, &filter, 20).await.unwrap(), Some(list.clone()));
        assert_eq!(cache.candidates(&viewer, &filter, 10).await.unwrap(), None);

        cache.invalidate_viewer(&viewer).await.unwrap();
        assert_eq!(cache.candidates(&viewer, &filter, 20).await.unwrap(), None);
        assert_eq!(cache.candidates(&other, &filter, 20).await.unwrap(), Some(list));
    }

    #[test]
    fn test_candidate_keys_depend_on_filter() {
        let viewer = ProfileId::from("user123");
        let plain = CacheKey::candidates(&viewer, &CandidateFilter::default(), 20);
        let filtered = CacheKey::candidates(
            &viewer,
            &CandidateFilter {
                city: Some("Pula".to_string()),
                ..CandidateFilter::default()
            },
            20,
        );

        assert!(plain.starts_with("candidates:user123:"));
        assert_ne!(plain, filtered);
        assert_eq!(plain, CacheKey::candidates(&viewer, &CandidateFilter::default(), 20));
        assert_eq!(CacheKey::viewer_prefix(&viewer), "candidates:user123:");
    }
}
