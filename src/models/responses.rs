use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchRecord, Profile};

/// Response for the candidates endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<Profile>,
    pub total_results: usize,
    pub cached: bool,
}

/// Response for the decisions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub outcome: String,
    #[serde(rename = "isMatch")]
    pub is_match: bool,
}

/// Response for the matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(rename = "profileId")]
    pub profile_id: String,
    pub matches: Vec<MatchRecord>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
