use crate::models::{Decision, Profile, ProfileId};
use std::collections::HashSet;
use thiserror::Error;

/// Contract violations on the session queue. These point at a caller bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("No decision available to undo")]
    NoUndoAvailable,

    #[error("Profile {0} is not available for a decision")]
    NotAvailable(ProfileId),

    #[error("Profile {0} has not been decided")]
    NotDecided(ProfileId),
}

/// Ordered candidates for one browsing session
///
/// Decided ids are keyed by profile id, so they stay filtered out across
/// wraparound and candidate refreshes until `reset()`.
#[derive(Debug, Clone, Default)]
pub struct SessionQueue {
    candidates: Vec<Profile>,
    liked: HashSet<ProfileId>,
    passed: HashSet<ProfileId>,
    last_decision: Option<(ProfileId, Decision)>,
    // Index into `available()`
    cursor: usize,
}

impl SessionQueue {
    pub fn new(candidates: Vec<Profile>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    /// Candidates not yet decided, in original order
    pub fn available(&self) -> Vec<&Profile> {
        self.candidates
            .iter()
            .filter(|p| !self.is_decided(&p.id))
            .collect()
    }

    /// Profile under the cursor
    pub fn current(&self) -> Option<&Profile> {
        self.available().get(self.cursor).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.available().is_empty()
    }

    pub fn is_decided(&self, id: &ProfileId) -> bool {
        self.liked.contains(id) || self.passed.contains(id)
    }

    pub fn liked(&self) -> &HashSet<ProfileId> {
        &self.liked
    }

    pub fn passed(&self) -> &HashSet<ProfileId> {
        &self.passed
    }

    pub fn last_decision(&self) -> Option<&(ProfileId, Decision)> {
        self.last_decision.as_ref()
    }

    /// Mark a profile as decided and advance to the next undecided one
    pub fn decide(&mut self, id: &ProfileId, decision: Decision) -> Result<(), QueueError> {
        let position = self
            .available()
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| QueueError::NotAvailable(id.clone()))?;

        match decision {
            Decision::Like | Decision::SuperLike => self.liked.insert(id.clone()),
            Decision::Pass => self.passed.insert(id.clone()),
        };
        self.last_decision = Some((id.clone(), decision));

        // The decided profile drops out of the view, so the next one slides
        // into its slot
        let remaining = self.available().len();
        self.cursor = if position < remaining { position } else { 0 };

        tracing::debug!("Decided {} as {} ({} remaining)", id, decision, remaining);
        Ok(())
    }

    /// Reverse the most recent decision; one level only
    pub fn undo(&mut self) -> Result<ProfileId, QueueError> {
        let (id, _) = self.last_decision.take().ok_or(QueueError::NoUndoAvailable)?;
        self.restore(&id);
        Ok(id)
    }

    /// Reverse the decision for a specific profile
    ///
    /// Used when a decision other than the last one fails. Clears the undo
    /// register only if it pointed at this profile.
    pub fn rollback(&mut self, id: &ProfileId) -> Result<(), QueueError> {
        if !self.is_decided(id) {
            return Err(QueueError::NotDecided(id.clone()));
        }
        if matches!(&self.last_decision, Some((last, _)) if last == id) {
            self.last_decision = None;
        }
        self.restore(id);
        Ok(())
    }

    /// Start the session over with the same candidates
    pub fn reset(&mut self) {
        self.liked.clear();
        self.passed.clear();
        self.last_decision = None;
        self.cursor = 0;
    }

    /// Start the session over with a freshly fetched list
    pub fn reset_with(&mut self, candidates: Vec<Profile>) {
        self.candidates = candidates;
        self.reset();
    }

    /// Replace the candidate list, keeping what has been decided
    pub fn refresh(&mut self, candidates: Vec<Profile>) {
        let current = self.current().map(|p| p.id.clone());
        self.candidates = candidates;

        self.cursor = current
            .and_then(|id| self.available().iter().position(|p| p.id == id))
            .unwrap_or(0);
    }

    fn restore(&mut self, id: &ProfileId) {
        self.liked.remove(id);
        self.passed.remove(id);

        // Profile may have disappeared in a refresh
        self.cursor = self
            .available()
            .iter()
            .position(|p| &p.id == id)
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> Profile {
        Profile {
            id: ProfileId::from(id),
            name: format!("User {}", id),
            age: 30,
            gender: None,
            city: None,
            bio: None,
            interests: vec![],
            is_online: false,
            last_seen: None,
            photo_ids: vec![],
        }
    }

    fn queue(ids: &[&str]) -> SessionQueue {
        SessionQueue::new(ids.iter().map(|id| profile(id)).collect())
    }

    fn current_id(queue: &SessionQueue) -> Option<String> {
        queue.current().map(|p| p.id.to_string())
    }

    #[test]
    fn test_empty_queue_has_no_current() {
        let queue = queue(&[]);
        assert!(queue.current().is_none());
        assert!(queue.is_exhausted());
    }

    #[test]
    fn test_decide_advances() {
        let mut queue = queue(&["a", "b", "c"]);
        queue.decide(&"a".into(), Decision::Like).unwrap();

        assert_eq!(current_id(&queue).as_deref(), Some("b"));
        assert!(queue.liked().contains(&"a".into()));
        assert_eq!(queue.available().len(), 2);
    }

    #[test]
    fn test_decide_wraps_to_start() {
        let mut queue = queue(&["a", "b", "c"]);
        queue.decide(&"a".into(), Decision::Pass).unwrap();
        queue.decide(&"b".into(), Decision::Pass).unwrap();
        queue.undo().unwrap();
        // Skip "b" and decide the tail first
        queue.decide(&"c".into(), Decision::Like).unwrap();

        assert_eq!(current_id(&queue).as_deref(), Some("b"));
    }

    #[test]
    fn test_decide_unknown_profile_fails() {
        let mut queue = queue(&["a"]);
        let err = queue.decide(&"zzz".into(), Decision::Like).unwrap_err();
        assert_eq!(err, QueueError::NotAvailable("zzz".into()));
    }

    #[test]
    fn test_decide_twice_fails() {
        let mut queue = queue(&["a", "b"]);
        queue.decide(&"a".into(), Decision::Like).unwrap();
        assert!(queue.decide(&"a".into(), Decision::Pass).is_err());
        assert!(!queue.passed().contains(&"a".into()));
    }

    #[test]
    fn test_undo_round_trip() {
        let mut queue = queue(&["a", "b", "c"]);
        queue.decide(&"a".into(), Decision::Like).unwrap();
        let liked_before = queue.liked().clone();
        let passed_before = queue.passed().clone();

        queue.decide(&"b".into(), Decision::Pass).unwrap();
        assert_eq!(queue.undo().unwrap(), ProfileId::from("b"));

        assert_eq!(current_id(&queue).as_deref(), Some("b"));
        assert_eq!(queue.liked(), &liked_before);
        assert_eq!(queue.passed(), &passed_before);
    }

    #[test]
    fn test_undo_is_one_shot() {
        let mut queue = queue(&["a", "b"]);
        queue.decide(&"a".into(), Decision::Like).unwrap();
        queue.decide(&"b".into(), Decision::Like).unwrap();

        queue.undo().unwrap();
        assert_eq!(queue.undo(), Err(QueueError::NoUndoAvailable));
        assert!(queue.liked().contains(&"a".into()));
    }

    #[test]
    fn test_undo_on_fresh_queue_fails() {
        let mut queue = queue(&["a"]);
        assert_eq!(queue.undo(), Err(QueueError::NoUndoAvailable));
    }

    #[test]
    fn test_exhaustion_and_reset() {
        let mut queue = queue(&["a", "b", "c"]);
        for id in ["a", "b", "c"] {
            queue.decide(&id.into(), Decision::Pass).unwrap();
        }

        assert!(queue.current().is_none());
        assert!(queue.is_exhausted());

        queue.reset();
        assert_eq!(current_id(&queue).as_deref(), Some("a"));
        assert!(queue.liked().is_empty());
        assert!(queue.passed().is_empty());
        assert!(queue.last_decision().is_none());
    }

    #[test]
    fn test_rollback_out_of_order() {
        let mut queue = queue(&["a", "b", "c"]);
        queue.decide(&"a".into(), Decision::Like).unwrap();
        queue.decide(&"b".into(), Decision::Like).unwrap();

        // Earlier decision fails after a later one was made
        queue.rollback(&"a".into()).unwrap();

        assert_eq!(current_id(&queue).as_deref(), Some("a"));
        assert!(!queue.is_decided(&"a".into()));
        assert!(queue.is_decided(&"b".into()));
        // Undo register still refers to "b"
        assert_eq!(queue.last_decision().map(|(id, _)| id.as_str()), Some("b"));
    }

    #[test]
    fn test_rollback_undecided_fails() {
        let mut queue = queue(&["a"]);
        assert_eq!(queue.rollback(&"a".into()), Err(QueueError::NotDecided("a".into())));
    }

    #[test]
    fn test_refresh_keeps_decided_filtered() {
        let mut queue = queue(&["a", "b"]);
        queue.decide(&"a".into(), Decision::Pass).unwrap();

        queue.refresh(vec![profile("c"), profile("a"), profile("b")]);

        let ids: Vec<_> = queue.available().iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        // Cursor follows the profile that was showing
        assert_eq!(current_id(&queue).as_deref(), Some("b"));
    }

    #[test]
    fn test_reset_with_new_candidates() {
        let mut queue = queue(&["a"]);
        queue.decide(&"a".into(), Decision::Like).unwrap();
        queue.reset_with(vec![profile("x"), profile("y")]);

        assert_eq!(current_id(&queue).as_deref(), Some("x"));
        assert!(queue.liked().is_empty());
    }
}
