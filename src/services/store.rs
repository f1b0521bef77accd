use async_trait::async_trait;
use crate::models::{LikeRecord, MatchPair, MatchRecord, ProfileId};
use thiserror::Error;

/// Errors that can occur when talking to the like/match store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of an insert guarded by a uniqueness constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Insert<T> {
    Created(T),
    AlreadyExists,
}

/// Durable like and match records
///
/// Uniqueness of the ordered like pair and of the canonical match pair is
/// enforced here, never by callers.
#[async_trait]
pub trait LikeMatchStore: Send + Sync {
    /// Insert a like for `liker -> liked`
    async fn insert_like(
        &self,
        liker_id: &ProfileId,
        liked_id: &ProfileId,
        is_super: bool,
    ) -> Result<Insert<LikeRecord>, StoreError>;

    /// Look up the like `a -> b`
    async fn find_like(
        &self,
        a_id: &ProfileId,
        b_id: &ProfileId,
    ) -> Result<Option<LikeRecord>, StoreError>;

    /// Insert a match for the canonical pair
    async fn insert_match(&self, pair: &MatchPair) -> Result<Insert<MatchRecord>, StoreError>;

    /// Remember a pass so the profile is not shown again
    async fn record_pass(
        &self,
        viewer_id: &ProfileId,
        target_id: &ProfileId,
    ) -> Result<(), StoreError>;

    /// Profiles the viewer has liked or passed
    async fn decided_targets(&self, viewer_id: &ProfileId) -> Result<Vec<ProfileId>, StoreError>;

    /// Matches the profile is part of, newest first
    async fn matches_for(&self, profile_id: &ProfileId) -> Result<Vec<MatchRecord>, StoreError>;

    /// Health check for the backing store
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
