use async_trait::async_trait;
use crate::models::{CandidateFilter, Profile, ProfileId};
use thiserror::Error;

/// Errors that can occur when fetching candidates
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Source of candidate profiles
///
/// Implementations exclude matched and blocked profiles upstream; the
/// engine does not re-filter for those.
#[async_trait]
pub trait ProfileFeed: Send + Sync {
    /// Fetch candidates for `viewer_id`, never including the viewer or any id in `exclude_ids`
    async fn fetch_candidates(
        &self,
        viewer_id: &ProfileId,
        filter: &CandidateFilter,
        exclude_ids: &[ProfileId],
        limit: usize,
    ) -> Result<Vec<Profile>, FeedError>;
}
