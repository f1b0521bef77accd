// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateFilter, Decision, LikeRecord, MatchEvent, MatchPair, MatchRecord, Profile, ProfileId,
    SwipeThresholds,
};
pub use requests::{FetchCandidatesRequest, RecordDecisionRequest};
pub use responses::{CandidatesResponse, DecisionResponse, ErrorResponse, HealthResponse, MatchesResponse};
