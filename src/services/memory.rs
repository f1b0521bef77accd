use async_trait::async_trait;
use crate::core::filters::matches_filter;
use crate::models::{CandidateFilter, LikeRecord, MatchPair, MatchRecord, Profile, ProfileId};
use crate::services::{FeedError, Insert, LikeMatchStore, ProfileFeed, StoreError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    likes: HashMap<(ProfileId, ProfileId), LikeRecord>,
    matches: BTreeMap<MatchPair, MatchRecord>,
    passes: BTreeSet<(ProfileId, ProfileId)>,
}

/// In-process like/match store
///
/// Keys mirror the unique constraints of the SQL schema, so every operation
/// is atomic under the table lock. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    latency_ms: AtomicU64,
    calls: AtomicU64,
    // Absolute call number that fails once; 0 disables
    fail_at: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `StoreError::Unavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make only the `nth` store call from now fail, once (1 is the next call)
    pub fn fail_call(&self, nth: u64) {
        let base = self.calls.load(Ordering::SeqCst);
        self.fail_at.store(base + nth.max(1), Ordering::SeqCst);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn like_count(&self) -> usize {
        self.tables.lock().await.likes.len()
    }

    pub async fn match_count(&self) -> usize {
        self.tables.lock().await.matches.len()
    }

    async fn enter(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at.load(Ordering::SeqCst) == call {
            self.fail_at.store(0, Ordering::SeqCst);
            return Err(StoreError::Unavailable(format!("memory store call {} set to fail", call)));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LikeMatchStore for MemoryStore {
    async fn insert_like(
        &self,
        liker_id: &ProfileId,
        liked_id: &ProfileId,
        is_super: bool,
    ) -> Result<Insert<LikeRecord>, StoreError> {
        self.enter().await?;
        let mut tables = self.tables.lock().await;

        let key = (liker_id.clone(), liked_id.clone());
        if tables.likes.contains_key(&key) {
            return Ok(Insert::AlreadyExists);
        }

        let record = LikeRecord {
            liker_id: liker_id.clone(),
            liked_id: liked_id.clone(),
            is_super,
            created_at: chrono::Utc::now(),
        };
        tables.likes.insert(key, record.clone());
        Ok(Insert::Created(record))
    }

    async fn find_like(
        &self,
        a_id: &ProfileId,
        b_id: &ProfileId,
    ) -> Result<Option<LikeRecord>, StoreError> {
        self.enter().await?;
        let tables = self.tables.lock().await;
        Ok(tables.likes.get(&(a_id.clone(), b_id.clone())).cloned())
    }

    async fn insert_match(&self, pair: &MatchPair) -> Result<Insert<MatchRecord>, StoreError> {
        self.enter().await?;
        let mut tables = self.tables.lock().await;

        if tables.matches.contains_key(pair) {
            return Ok(Insert::AlreadyExists);
        }

        let record = MatchRecord {
            pair: pair.clone(),
            created_at: chrono::Utc::now(),
        };
        tables.matches.insert(pair.clone(), record.clone());
        Ok(Insert::Created(record))
    }

    async fn record_pass(
        &self,
        viewer_id: &ProfileId,
        target_id: &ProfileId,
    ) -> Result<(), StoreError> {
        self.enter().await?;
        let mut tables = self.tables.lock().await;
        tables.passes.insert((viewer_id.clone(), target_id.clone()));
        Ok(())
    }

    async fn decided_targets(&self, viewer_id: &ProfileId) -> Result<Vec<ProfileId>, StoreError> {
        self.enter().await?;
        let tables = self.tables.lock().await;

        let liked = tables
            .likes
            .keys()
            .filter(|(liker, _)| liker == viewer_id)
            .map(|(_, liked)| liked.clone());
        let passed = tables
            .passes
            .iter()
            .filter(|(viewer, _)| viewer == viewer_id)
            .map(|(_, target)| target.clone());

        let ids: BTreeSet<ProfileId> = liked.chain(passed).collect();
        Ok(ids.into_iter().collect())
    }

    async fn matches_for(&self, profile_id: &ProfileId) -> Result<Vec<MatchRecord>, StoreError> {
        self.enter().await?;
        let tables = self.tables.lock().await;

        let mut matches: Vec<MatchRecord> = tables
            .matches
            .values()
            .filter(|m| m.pair.contains(profile_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }
}

/// Fixed list of profiles served as a feed
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    profiles: Vec<Profile>,
}

impl StaticFeed {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl ProfileFeed for StaticFeed {
    async fn fetch_candidates(
        &self,
        viewer_id: &ProfileId,
        filter: &CandidateFilter,
        exclude_ids: &[ProfileId],
        limit: usize,
    ) -> Result<Vec<Profile>, FeedError> {
        let viewer_gender = self
            .profiles
            .iter()
            .find(|p| &p.id == viewer_id)
            .and_then(|p| p.gender.clone());

        let candidates = self
            .profiles
            .iter()
            .filter(|p| &p.id != viewer_id && !exclude_ids.contains(&p.id))
            .filter(|p| matches_filter(p, filter, viewer_gender.as_deref()))
            .take(limit)
            .cloned()
            .collect();

        Ok(candidates)
    }
}
