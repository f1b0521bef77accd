//! Swipe Engine - swipe-and-match core for a dating app
//!
//! Turns pointer gestures into like / pass / super-like decisions, keeps the
//! browsing session queue, and records decisions against a like/match store
//! so that two reciprocal likes produce exactly one match.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    classify, CardConfig, CardInteraction, DecisionOutcome, DiscoveryController, GestureTracker,
    LikeMatchCoordinator, MatchNotifier, SessionQueue,
};
pub use crate::models::{Decision, LikeRecord, MatchPair, MatchRecord, Profile, ProfileId, SwipeThresholds};
