use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a profile
///
/// Ordering is plain string ordering, which is what canonicalizes match pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProfileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Candidate profile as produced by the profile feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "profileId")]
    pub id: ProfileId,
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
    #[serde(rename = "lastSeen", default)]
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "photoIds", default)]
    pub photo_ids: Vec<String>,
}

impl Profile {
    /// Number of photos, never less than one so paging always has a page
    pub fn photo_count(&self) -> usize {
        self.photo_ids.len().max(1)
    }
}

/// Outcome of a card interaction for a single profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Like,
    SuperLike,
    Pass,
}

impl Decision {
    /// Whether this decision writes a like record
    pub fn is_like(self) -> bool {
        matches!(self, Decision::Like | Decision::SuperLike)
    }

    pub fn is_super(self) -> bool {
        matches!(self, Decision::SuperLike)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Like => "like",
            Decision::SuperLike => "super_like",
            Decision::Pass => "pass",
        };
        f.write_str(s)
    }
}

/// Durable like, unique per ordered (liker, liked) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub liker_id: ProfileId,
    pub liked_id: ProfileId,
    pub is_super: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Unordered pair of profiles stored smaller id first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchPair {
    profile_a_id: ProfileId,
    profile_b_id: ProfileId,
}

impl MatchPair {
    pub fn new(x: ProfileId, y: ProfileId) -> Self {
        if x <= y {
            Self { profile_a_id: x, profile_b_id: y }
        } else {
            Self { profile_a_id: y, profile_b_id: x }
        }
    }

    pub fn profile_a(&self) -> &ProfileId {
        &self.profile_a_id
    }

    pub fn profile_b(&self) -> &ProfileId {
        &self.profile_b_id
    }

    pub fn contains(&self, id: &ProfileId) -> bool {
        &self.profile_a_id == id || &self.profile_b_id == id
    }
}

/// Durable mutual match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub pair: MatchPair,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Event published once per newly created match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub profile_a_id: ProfileId,
    pub profile_b_id: ProfileId,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

impl From<&MatchRecord> for MatchEvent {
    fn from(record: &MatchRecord) -> Self {
        Self {
            profile_a_id: record.pair.profile_a().clone(),
            profile_b_id: record.pair.profile_b().clone(),
            matched_at: record.created_at,
        }
    }
}

/// Filter options understood by the profile feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateFilter {
    #[serde(rename = "ageFrom", default)]
    pub age_from: Option<u8>,
    #[serde(rename = "ageTo", default)]
    pub age_to: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "excludeGenderMatching", default)]
    pub exclude_gender_matching: bool,
    #[serde(default)]
    pub search: Option<String>,
}

/// Gesture thresholds in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeThresholds {
    pub swipe: f64,
    pub super_like: f64,
}

impl Default for SwipeThresholds {
    fn default() -> Self {
        Self {
            swipe: 100.0,
            super_like: -80.0,
        }
    }
}
