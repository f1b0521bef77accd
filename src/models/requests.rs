use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{CandidateFilter, Decision};

/// Request to fetch candidates for the discovery screen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FetchCandidatesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "viewer_id", rename = "viewerId")]
    pub viewer_id: String,
    #[serde(default)]
    pub filter: CandidateFilter,
    #[serde(default = "default_limit")]
    pub limit: u16,
}

fn default_limit() -> u16 {
    20
}

/// Request to record a like, super-like or pass
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordDecisionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "viewer_id", rename = "viewerId")]
    pub viewer_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_id", rename = "targetId")]
    pub target_id: String,
    pub decision: Decision,
}
