use crate::core::card::{CardConfig, CardInteraction, PointerTarget, Release};
use crate::core::coordinator::{CoordinatorError, DecisionOutcome, LikeMatchCoordinator};
use crate::core::gesture::DragVector;
use crate::core::queue::{QueueError, SessionQueue};
use crate::models::{Decision, Profile, ProfileId};
use std::collections::HashMap;

/// A decision applied optimistically, awaiting its coordinator result
///
/// Stamped with the controller generation so results arriving after
/// teardown can be recognised and dropped, and with a sequence number so a
/// result can tell whether its decision is still the live one for the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTicket {
    pub viewer_id: ProfileId,
    pub profile_id: ProfileId,
    pub decision: Decision,
    generation: u64,
    sequence: u64,
}

impl DecisionTicket {
    /// Send this decision to the coordinator
    pub async fn dispatch(
        &self,
        coordinator: &LikeMatchCoordinator,
    ) -> Result<DecisionOutcome, CoordinatorError> {
        coordinator
            .record_decision(&self.viewer_id, &self.profile_id, self.decision)
            .await
    }
}

/// What the screen should show as the main content
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'a> {
    Browsing(&'a Profile),
    /// Every candidate decided; offer a reset
    Exhausted,
    Unmounted,
}

/// Decision that failed and can be retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableError {
    pub profile_id: ProfileId,
    pub decision: Decision,
    pub message: String,
}

/// How a completed decision was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Controller was torn down; nothing changed
    Stale,
    Recorded,
    Matched(ProfileId),
    AlreadyLiked(ProfileId),
    RolledBack(RetryableError),
    /// Call failed but a later decision (or undo/reset) already replaced it;
    /// the queue is left alone
    Failed(RetryableError),
}

/// Discovery screen orchestration
///
/// Decisions advance the queue immediately. The coordinator call runs
/// elsewhere and its result is fed back through [`DiscoveryController::complete`],
/// matched to its own profile id so out-of-order results are safe.
#[derive(Debug)]
pub struct DiscoveryController {
    viewer_id: ProfileId,
    queue: SessionQueue,
    card_config: CardConfig,
    active: Option<CardInteraction>,
    exiting: Vec<CardInteraction>,
    celebration: Option<ProfileId>,
    notice: Option<ProfileId>,
    error: Option<RetryableError>,
    mounted: bool,
    generation: u64,
    next_sequence: u64,
    // Ticket sequence currently responsible for each optimistically decided id
    owners: HashMap<ProfileId, u64>,
}

impl DiscoveryController {
    pub fn new(viewer_id: ProfileId, candidates: Vec<Profile>, card_config: CardConfig) -> Self {
        let mut controller = Self {
            viewer_id,
            queue: SessionQueue::new(candidates),
            card_config,
            active: None,
            exiting: Vec::new(),
            celebration: None,
            notice: None,
            error: None,
            mounted: true,
            generation: 0,
            next_sequence: 0,
            owners: HashMap::new(),
        };
        controller.sync_card();
        controller
    }

    pub fn screen(&self) -> Screen<'_> {
        if !self.mounted {
            return Screen::Unmounted;
        }
        match self.queue.current() {
            Some(profile) => Screen::Browsing(profile),
            None => Screen::Exhausted,
        }
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn active_card(&self) -> Option<&CardInteraction> {
        self.active.as_ref()
    }

    /// Cards still playing their exit animation
    pub fn exiting_cards(&self) -> &[CardInteraction] {
        &self.exiting
    }

    /// Profile to celebrate a new match with
    pub fn celebration(&self) -> Option<&ProfileId> {
        self.celebration.as_ref()
    }

    /// Profile the viewer had already liked
    pub fn already_liked_notice(&self) -> Option<&ProfileId> {
        self.notice.as_ref()
    }

    pub fn error(&self) -> Option<&RetryableError> {
        self.error.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, target: PointerTarget) -> bool {
        self.active
            .as_mut()
            .is_some_and(|card| card.pointer_down(x, y, target))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<DragVector> {
        self.active.as_mut()?.pointer_move(x, y)
    }

    /// Release the pointer; returns a ticket when a decision fired
    pub fn pointer_up(&mut self) -> Result<Option<DecisionTicket>, QueueError> {
        let Some(mut card) = self.active.take() else {
            return Ok(None);
        };

        match card.pointer_up() {
            Release::Decided(decision) => self.begin(card, decision).map(Some),
            Release::SnappedBack | Release::Ignored => {
                self.active = Some(card);
                Ok(None)
            }
        }
    }

    /// Like / pass / super-like button or keyboard shortcut
    pub fn press(&mut self, decision: Decision) -> Result<Option<DecisionTicket>, QueueError> {
        let Some(mut card) = self.active.take() else {
            return Ok(None);
        };

        match card.press(decision) {
            Some(decision) => self.begin(card, decision).map(Some),
            None => {
                self.active = Some(card);
                Ok(None)
            }
        }
    }

    /// Exit animation for `profile_id` finished; drop its card
    pub fn finish_exit(&mut self, profile_id: &ProfileId) -> bool {
        let Some(index) = self.exiting.iter().position(|c| c.profile_id() == profile_id) else {
            return false;
        };
        let mut card = self.exiting.remove(index);
        card.finish_exit()
    }

    /// Apply the coordinator's answer for `ticket`
    pub fn complete(
        &mut self,
        ticket: &DecisionTicket,
        result: Result<DecisionOutcome, CoordinatorError>,
    ) -> Feedback {
        if !self.mounted || ticket.generation != self.generation {
            tracing::debug!("Dropping result for {} after teardown", ticket.profile_id);
            return Feedback::Stale;
        }

        let owns_profile = self.owners.get(&ticket.profile_id) == Some(&ticket.sequence);

        let err = match result {
            Ok(outcome) => {
                if owns_profile {
                    self.owners.remove(&ticket.profile_id);
                }
                return self.apply_outcome(ticket, outcome);
            }
            Err(err) => err,
        };

        let error = RetryableError {
            profile_id: ticket.profile_id.clone(),
            decision: ticket.decision,
            message: err.to_string(),
        };
        self.error = Some(error.clone());

        // Undo, reset or a newer decision on the same profile took over
        if !owns_profile {
            tracing::warn!(
                "{} on {} failed after being superseded: {}",
                ticket.decision,
                ticket.profile_id,
                err
            );
            return Feedback::Failed(error);
        }

        tracing::warn!("Rolling back {} on {}: {}", ticket.decision, ticket.profile_id, err);
        self.owners.remove(&ticket.profile_id);
        if let Err(e) = self.queue.rollback(&ticket.profile_id) {
            tracing::warn!("Rollback of {} failed: {}", ticket.profile_id, e);
        }
        self.exiting.retain(|c| c.profile_id() != &ticket.profile_id);
        self.sync_card();

        Feedback::RolledBack(error)
    }

    pub fn dismiss_celebration(&mut self) {
        self.celebration = None;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Bring back the most recently decided profile
    pub fn undo(&mut self) -> Result<ProfileId, QueueError> {
        let id = self.queue.undo()?;
        self.owners.remove(&id);
        self.exiting.retain(|c| c.profile_id() != &id);
        self.sync_card();
        Ok(id)
    }

    /// Start over, optionally with a fresh candidate list
    pub fn reset(&mut self, candidates: Option<Vec<Profile>>) {
        match candidates {
            Some(candidates) => self.queue.reset_with(candidates),
            None => self.queue.reset(),
        }
        self.exiting.clear();
        self.owners.clear();
        self.error = None;
        self.sync_card();
        tracing::info!("Discovery session reset for {}", self.viewer_id);
    }

    /// Swap in newly fetched candidates without forgetting decisions
    pub fn refresh(&mut self, candidates: Vec<Profile>) {
        self.queue.refresh(candidates);
        self.sync_card();
    }

    /// Tear down; results for outstanding tickets become no-ops
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.generation += 1;
        self.owners.clear();
        self.active = None;
        self.exiting.clear();
        self.celebration = None;
        self.notice = None;
        self.error = None;
    }

    fn begin(&mut self, card: CardInteraction, decision: Decision) -> Result<DecisionTicket, QueueError> {
        let profile_id = card.profile_id().clone();

        if let Err(e) = self.queue.decide(&profile_id, decision) {
            // Card and queue disagree; put the card back at rest
            self.sync_card();
            return Err(e);
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.owners.insert(profile_id.clone(), sequence);

        self.exiting.push(card);
        self.error = None;
        self.notice = None;
        self.sync_card();

        Ok(DecisionTicket {
            viewer_id: self.viewer_id.clone(),
            profile_id,
            decision,
            generation: self.generation,
            sequence,
        })
    }

    fn apply_outcome(&mut self, ticket: &DecisionTicket, outcome: DecisionOutcome) -> Feedback {
        match outcome {
            DecisionOutcome::Liked { is_match: true } => {
                tracing::info!("{} matched with {}", self.viewer_id, ticket.profile_id);
                self.celebration = Some(ticket.profile_id.clone());
                Feedback::Matched(ticket.profile_id.clone())
            }
            DecisionOutcome::AlreadyLiked => {
                self.notice = Some(ticket.profile_id.clone());
                Feedback::AlreadyLiked(ticket.profile_id.clone())
            }
            DecisionOutcome::Liked { is_match: false } | DecisionOutcome::Passed => Feedback::Recorded,
        }
    }

    // Keep the active card in step with the queue cursor
    fn sync_card(&mut self) {
        let current = self.queue.current();
        let unchanged = match (&self.active, current) {
            (Some(card), Some(profile)) => card.profile_id() == &profile.id,
            _ => false,
        };
        if !unchanged {
            self.active = current.map(|profile| CardInteraction::new(profile, self.card_config));
        }
    }
}
