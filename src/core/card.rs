use crate::core::gesture::{DragVector, GestureTracker};
use crate::models::{Decision, Profile, ProfileId, SwipeThresholds};

/// Per-card behaviour options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardConfig {
    pub thresholds: SwipeThresholds,
    /// Whether a super-like handler is wired up. Without one, upward drags
    /// fall through to the horizontal check.
    pub super_like_enabled: bool,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            thresholds: SwipeThresholds::default(),
            super_like_enabled: true,
        }
    }
}

/// Classify a released drag vector
///
/// Branch order matters: the vertical super-like check runs first, then
/// like, then pass. Anything else is no decision.
#[inline]
pub fn classify(
    vector: DragVector,
    thresholds: &SwipeThresholds,
    super_like_enabled: bool,
) -> Option<Decision> {
    if super_like_enabled && vector.dy < thresholds.super_like {
        Some(Decision::SuperLike)
    } else if vector.dx > thresholds.swipe {
        Some(Decision::Like)
    } else if vector.dx < -thresholds.swipe {
        Some(Decision::Pass)
    } else {
        None
    }
}

/// Lifecycle of the topmost card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Dragging,
    Resolving(Decision),
    Exiting(Decision),
}

/// Where a pointer-down landed on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Card,
    PhotoNav(PhotoStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStep {
    Previous,
    Next,
}

/// Result of releasing the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// A threshold was crossed; the owner must act on the decision now
    Decided(Decision),
    /// Below every threshold; the card is back at rest
    SnappedBack,
    /// No drag was in progress
    Ignored,
}

/// Card interaction state machine
///
/// Drags and button presses both end in [`CardState::Resolving`], and both
/// hand the decision back synchronously so the owner can start the network
/// call while the exit animation runs independently.
#[derive(Debug, Clone)]
pub struct CardInteraction {
    profile_id: ProfileId,
    config: CardConfig,
    tracker: GestureTracker,
    state: CardState,
    offset: DragVector,
    photo_index: usize,
    photo_count: usize,
}

impl CardInteraction {
    pub fn new(profile: &Profile, config: CardConfig) -> Self {
        Self {
            profile_id: profile.id.clone(),
            config,
            tracker: GestureTracker::new(),
            state: CardState::Idle,
            offset: DragVector::ZERO,
            photo_index: 0,
            photo_count: profile.photo_count(),
        }
    }

    pub fn profile_id(&self) -> &ProfileId {
        &self.profile_id
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    /// Current visual offset of the card
    pub fn offset(&self) -> DragVector {
        self.offset
    }

    pub fn photo_index(&self) -> usize {
        self.photo_index
    }

    /// Page forward, stopping at the last photo. Returns the new index.
    pub fn next_photo(&mut self) -> usize {
        self.photo_index = (self.photo_index + 1).min(self.photo_count.saturating_sub(1));
        self.photo_index
    }

    pub fn previous_photo(&mut self) -> usize {
        self.photo_index = self.photo_index.saturating_sub(1);
        self.photo_index
    }

    pub fn is_exiting(&self) -> bool {
        matches!(self.state, CardState::Resolving(_) | CardState::Exiting(_))
    }

    /// Pointer or touch pressed on the card
    ///
    /// Photo navigation taps page the photos and never reach the tracker.
    /// Returns whether a drag started.
    pub fn pointer_down(&mut self, x: f64, y: f64, target: PointerTarget) -> bool {
        match target {
            PointerTarget::PhotoNav(step) => {
                self.step_photo(step);
                false
            }
            PointerTarget::Card => {
                if self.state != CardState::Idle {
                    return false;
                }
                if self.tracker.start(x, y) {
                    self.state = CardState::Dragging;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<DragVector> {
        if self.state != CardState::Dragging {
            return None;
        }
        let vector = self.tracker.move_to(x, y)?;
        self.offset = vector;
        Some(vector)
    }

    pub fn pointer_up(&mut self) -> Release {
        if self.state != CardState::Dragging {
            return Release::Ignored;
        }
        let Some(vector) = self.tracker.end() else {
            return Release::Ignored;
        };

        match classify(vector, &self.config.thresholds, self.config.super_like_enabled) {
            Some(decision) => Release::Decided(self.resolve(decision)),
            None => {
                tracing::trace!(
                    "Card {} snapped back (dx={}, dy={})",
                    self.profile_id,
                    vector.dx,
                    vector.dy
                );
                self.state = CardState::Idle;
                self.offset = DragVector::ZERO;
                Release::SnappedBack
            }
        }
    }

    /// Pointer left the surface or was cancelled by the platform
    pub fn pointer_cancel(&mut self) {
        if self.state == CardState::Dragging {
            self.tracker.cancel();
            self.state = CardState::Idle;
            self.offset = DragVector::ZERO;
        }
    }

    /// Like / pass / super-like button
    ///
    /// Only valid from idle. A super-like press without a super-like handler
    /// is ignored.
    pub fn press(&mut self, decision: Decision) -> Option<Decision> {
        if self.state != CardState::Idle {
            return None;
        }
        if decision == Decision::SuperLike && !self.config.super_like_enabled {
            return None;
        }
        Some(self.resolve(decision))
    }

    /// Exit animation finished; the card can be removed
    pub fn finish_exit(&mut self) -> bool {
        match self.state {
            CardState::Resolving(decision) => {
                self.state = CardState::Exiting(decision);
                true
            }
            _ => false,
        }
    }

    fn resolve(&mut self, decision: Decision) -> Decision {
        self.state = CardState::Resolving(decision);
        self.offset = self.exit_offset(decision);
        tracing::debug!("Card {} resolved as {}", self.profile_id, decision);
        decision
    }

    // Off-screen target the exit animation moves towards
    fn exit_offset(&self, decision: Decision) -> DragVector {
        let distance = self.config.thresholds.swipe * 10.0;
        match decision {
            Decision::Like => DragVector::new(distance, self.offset.dy),
            Decision::Pass => DragVector::new(-distance, self.offset.dy),
            Decision::SuperLike => DragVector::new(self.offset.dx, -distance),
        }
    }

    fn step_photo(&mut self, step: PhotoStep) {
        match step {
            PhotoStep::Previous => self.previous_photo(),
            PhotoStep::Next => self.next_photo(),
        };
    }
}
