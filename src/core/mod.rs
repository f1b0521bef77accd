// Engine exports
pub mod card;
pub mod controller;
pub mod coordinator;
pub mod filters;
pub mod gesture;
pub mod queue;

pub use card::{classify, CardConfig, CardInteraction, CardState, PhotoStep, PointerTarget, Release};
pub use controller::{DecisionTicket, DiscoveryController, Feedback, RetryableError, Screen};
pub use coordinator::{CoordinatorError, DecisionOutcome, LikeMatchCoordinator, MatchNotifier};
pub use filters::matches_filter;
pub use gesture::{DragVector, GestureTracker};
pub use queue::{QueueError, SessionQueue};
