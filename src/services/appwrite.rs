use async_trait::async_trait;
use crate::core::filters::matches_filter;
use crate::models::{CandidateFilter, Profile, ProfileId};
use crate::services::{FeedError, ProfileFeed};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Appwrite API client serving as the profile feed
///
/// Filters are pushed down as Appwrite queries and re-checked locally, since
/// Appwrite's full-text search is looser than ours.
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub profiles: String,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collections.profiles
        )
    }

    async fn list_documents(&self, queries: &[String]) -> Result<Vec<Value>, FeedError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| FeedError::InvalidResponse(format!("Failed to encode queries: {}", e)))?;
        let full_url = format!("{}?queries={}", self.documents_url(), urlencoding::encode(&queries_json));

        let response = self
            .client
            .get(&full_url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Appwrite query failed: {} - {}", status, body);
            return Err(FeedError::ApiError(format!("Failed to list profiles: {}", status)));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| FeedError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents.clone())
    }

    /// Get a single profile by id
    pub async fn get_profile(&self, profile_id: &ProfileId) -> Result<Profile, FeedError> {
        tracing::debug!("Fetching profile: {}", profile_id);

        let queries = vec![format!("equal(\"profileId\", \"{}\")", profile_id)];
        let documents = self.list_documents(&queries).await?;

        let doc = documents
            .first()
            .ok_or_else(|| FeedError::NotFound(format!("Profile not found: {}", profile_id)))?;

        let data = doc.get("data").unwrap_or(doc);

        serde_json::from_value(data.clone())
            .map_err(|e| FeedError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }
}

/// Build Appwrite queries for a candidate filter
fn build_queries(
    viewer_id: &ProfileId,
    filter: &CandidateFilter,
    viewer_gender: Option<&str>,
    exclude_ids: &[ProfileId],
    limit: usize,
) -> Vec<String> {
    let mut queries = vec![format!("notEqual(\"profileId\", \"{}\")", viewer_id)];

    if let Some(from) = filter.age_from {
        queries.push(format!("greaterThanEqual(\"age\", {})", from));
    }
    if let Some(to) = filter.age_to {
        queries.push(format!("lessThanEqual(\"age\", {})", to));
    }
    if let Some(city) = filter.city.as_deref().filter(|c| !c.trim().is_empty()) {
        queries.push(format!("equal(\"city\", \"{}\")", city.trim()));
    }
    if filter.exclude_gender_matching {
        if let Some(gender) = viewer_gender {
            queries.push(format!("notEqual(\"gender\", \"{}\")", gender));
        }
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        queries.push(format!("search(\"name\", \"{}\")", search.trim()));
    }

    for id in exclude_ids {
        queries.push(format!("notEqual(\"profileId\", \"{}\")", id));
    }

    queries.push(format!("limit({})", limit));
    queries
}

#[async_trait]
impl ProfileFeed for AppwriteClient {
    async fn fetch_candidates(
        &self,
        viewer_id: &ProfileId,
        filter: &CandidateFilter,
        exclude_ids: &[ProfileId],
        limit: usize,
    ) -> Result<Vec<Profile>, FeedError> {
        // Viewer's gender is only needed for the gender exclusion
        let viewer_gender = if filter.exclude_gender_matching {
            self.get_profile(viewer_id).await?.gender
        } else {
            None
        };

        let queries = build_queries(viewer_id, filter, viewer_gender.as_deref(), exclude_ids, limit);
        let documents = self.list_documents(&queries).await?;
        let total = documents.len();

        let profiles: Vec<Profile> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone()).ok()
            })
            .filter(|p: &Profile| &p.id != viewer_id && !exclude_ids.contains(&p.id))
            .filter(|p| matches_filter(p, filter, viewer_gender.as_deref()))
            .take(limit)
            .collect();

        tracing::debug!("Fetched {} candidates for {} ({} documents)", profiles.len(), viewer_id, total);

        Ok(profiles)
    }
}
