use crate::models::{Decision, MatchEvent, MatchPair, MatchRecord, ProfileId};
use crate::services::{Insert, LikeMatchStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors surfaced by the coordinator
///
/// Every variant except `SelfDecision` is recoverable by retrying the same
/// decision.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Store call failed: {0}")]
    Transport(#[from] StoreError),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Profile {0} cannot decide on itself")]
    SelfDecision(ProfileId),
}

impl CoordinatorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoordinatorError::Transport(_) | CoordinatorError::Timeout(_))
    }
}

/// Result of recording a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Pass recorded; no match logic applies
    Passed,
    /// Like recorded. `is_match` is set when this like completed a mutual pair.
    Liked { is_match: bool },
    /// The viewer had already liked this target
    AlreadyLiked,
}

impl DecisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOutcome::Passed => "passed",
            DecisionOutcome::Liked { .. } => "liked",
            DecisionOutcome::AlreadyLiked => "already_liked",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, DecisionOutcome::Liked { is_match: true })
    }
}

/// Publishes one event per newly created match record
#[derive(Debug, Clone)]
pub struct MatchNotifier {
    sender: broadcast::Sender<MatchEvent>,
}

impl MatchNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the event
    pub fn publish(&self, record: &MatchRecord) -> usize {
        // No subscribers is not an error
        self.sender.send(MatchEvent::from(record)).unwrap_or(0)
    }
}

impl Default for MatchNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Records decisions and detects mutual matches
///
/// Correctness under concurrent reciprocal likes rests on the store's
/// uniqueness constraints; the coordinator holds no locks.
#[derive(Clone)]
pub struct LikeMatchCoordinator {
    store: Arc<dyn LikeMatchStore>,
    notifier: MatchNotifier,
    call_timeout: Duration,
}

impl LikeMatchCoordinator {
    pub fn new(store: Arc<dyn LikeMatchStore>, notifier: MatchNotifier, call_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            call_timeout,
        }
    }

    pub fn notifier(&self) -> &MatchNotifier {
        &self.notifier
    }

    /// Record `viewer`'s decision on `target`
    ///
    /// Bounded by the configured call timeout; expiry is reported as
    /// [`CoordinatorError::Timeout`].
    pub async fn record_decision(
        &self,
        viewer_id: &ProfileId,
        target_id: &ProfileId,
        decision: Decision,
    ) -> Result<DecisionOutcome, CoordinatorError> {
        if viewer_id == target_id {
            return Err(CoordinatorError::SelfDecision(viewer_id.clone()));
        }

        let work = async {
            if decision.is_like() {
                self.record_like(viewer_id, target_id, decision.is_super()).await
            } else {
                self.record_pass(viewer_id, target_id).await
            }
        };

        match tokio::time::timeout(self.call_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Decision {} -> {} ({}) timed out after {:?}",
                    viewer_id,
                    target_id,
                    decision,
                    self.call_timeout
                );
                Err(CoordinatorError::Timeout(self.call_timeout))
            }
        }
    }

    async fn record_pass(
        &self,
        viewer_id: &ProfileId,
        target_id: &ProfileId,
    ) -> Result<DecisionOutcome, CoordinatorError> {
        self.store.record_pass(viewer_id, target_id).await?;
        tracing::debug!("Recorded pass: {} -> {}", viewer_id, target_id);
        Ok(DecisionOutcome::Passed)
    }

    async fn record_like(
        &self,
        viewer_id: &ProfileId,
        target_id: &ProfileId,
        is_super: bool,
    ) -> Result<DecisionOutcome, CoordinatorError> {
        // Short-circuit repeats before touching the insert path
        let already_liked = if self.store.find_like(viewer_id, target_id).await?.is_some() {
            true
        } else {
            // AlreadyExists means a double submit won the race
            matches!(
                self.store.insert_like(viewer_id, target_id, is_super).await?,
                Insert::AlreadyExists
            )
        };

        // A repeat still checks the pair: an earlier attempt may have stored
        // the like and then failed before the match was written
        if self.store.find_like(target_id, viewer_id).await?.is_none() {
            if already_liked {
                tracing::debug!("{} already liked {}", viewer_id, target_id);
                return Ok(DecisionOutcome::AlreadyLiked);
            }
            tracing::debug!("Recorded like: {} -> {} (super: {})", viewer_id, target_id, is_super);
            return Ok(DecisionOutcome::Liked { is_match: false });
        }

        let pair = MatchPair::new(viewer_id.clone(), target_id.clone());
        let created = match self.store.insert_match(&pair).await? {
            Insert::Created(record) => {
                let delivered = self.notifier.publish(&record);
                tracing::info!(
                    "New match: {} <-> {} (notified {} subscribers)",
                    pair.profile_a(),
                    pair.profile_b(),
                    delivered
                );
                true
            }
            Insert::AlreadyExists => {
                // The other side created it first
                tracing::debug!("Match {} <-> {} already exists", pair.profile_a(), pair.profile_b());
                false
            }
        };

        // A repeat only celebrates when it was the call that wrote the match
        if already_liked && !created {
            return Ok(DecisionOutcome::AlreadyLiked);
        }
        Ok(DecisionOutcome::Liked { is_match: true })
    }
}
