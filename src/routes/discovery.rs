use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::FeedSettings;
use crate::core::{CoordinatorError, LikeMatchCoordinator};
use crate::models::{
    CandidatesResponse, DecisionResponse, ErrorResponse, FetchCandidatesRequest, HealthResponse,
    MatchesResponse, ProfileId, RecordDecisionRequest,
};
use crate::services::{CacheManager, LikeMatchStore, ProfileFeed};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<dyn ProfileFeed>,
    pub store: Arc<dyn LikeMatchStore>,
    pub coordinator: LikeMatchCoordinator,
    pub cache: Option<Arc<CacheManager>>,
    pub feed_settings: FeedSettings,
}

/// Configure all discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/candidates", web::post().to(fetch_candidates))
        .route("/decisions", web::post().to(record_decision))
        .route("/matches", web::get().to(get_matches));
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Fetch candidates endpoint
///
/// POST /api/v1/candidates
///
/// Request body:
/// ```json
/// {
///   "viewerId": "string",
///   "filter": { "ageFrom": 25, "ageTo": 35, "city": "string", "excludeGenderMatching": true, "search": "string" },
///   "limit": 20
/// }
/// ```
async fn fetch_candidates(
    state: web::Data<AppState>,
    req: web::Json<FetchCandidatesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for fetch_candidates request: {:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let viewer_id = ProfileId::new(req.viewer_id.clone());
    let limit = req.limit.min(state.feed_settings.max_limit).max(1) as usize;

    if let Some(cache) = &state.cache {
        match cache.candidates(&viewer_id, &req.filter, limit).await {
            Ok(Some(candidates)) => {
                tracing::debug!("Serving {} cached candidates for {}", candidates.len(), viewer_id);
                return HttpResponse::Ok().json(CandidatesResponse {
                    total_results: candidates.len(),
                    candidates,
                    cached: true,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Candidate cache lookup failed: {}", e),
        }
    }

    // Decided profiles never come back, even across sessions
    let decided = match state.store.decided_targets(&viewer_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!("Failed to fetch decided profiles for {}, proceeding without filtering: {}", viewer_id, e);
            vec![]
        }
    };

    let candidates = match state
        .feed
        .fetch_candidates(&viewer_id, &req.filter, &decided, limit)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to fetch candidates for {}: {}", viewer_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch candidates".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.store_candidates(&viewer_id, &req.filter, limit, &candidates).await {
            tracing::warn!("Failed to cache candidates: {}", e);
        }
    }

    tracing::info!(
        "Returning {} candidates for {} (excluded {} decided)",
        candidates.len(),
        viewer_id,
        decided.len()
    );

    HttpResponse::Ok().json(CandidatesResponse {
        total_results: candidates.len(),
        candidates,
        cached: false,
    })
}

/// Record decision endpoint
///
/// POST /api/v1/decisions
///
/// Request body:
/// ```json
/// {
///   "viewerId": "string",
///   "targetId": "string",
///   "decision": "like|super_like|pass"
/// }
/// ```
async fn record_decision(
    state: web::Data<AppState>,
    req: web::Json<RecordDecisionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let viewer_id = ProfileId::new(req.viewer_id.clone());
    let target_id = ProfileId::new(req.target_id.clone());

    match state
        .coordinator
        .record_decision(&viewer_id, &target_id, req.decision)
        .await
    {
        Ok(outcome) => {
            tracing::debug!("Decision {} -> {} ({}): {}", viewer_id, target_id, req.decision, outcome.as_str());

            // Candidate lists for this viewer now contain a decided profile
            if let Some(cache) = &state.cache {
                if let Err(e) = cache.invalidate_viewer(&viewer_id).await {
                    tracing::warn!("Failed to invalidate cache: {}", e);
                }
            }

            HttpResponse::Ok().json(DecisionResponse {
                outcome: outcome.as_str().to_string(),
                is_match: outcome.is_match(),
            })
        }
        Err(e @ CoordinatorError::SelfDecision(_)) => bad_request("Invalid decision", e.to_string()),
        Err(e) => {
            tracing::error!("Failed to record decision {} -> {}: {}", viewer_id, target_id, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Failed to record decision".to_string(),
                message: e.to_string(),
                status_code: 503,
            })
        }
    }
}

/// Get matches for a profile
///
/// GET /api/v1/matches?profileId={profileId}
async fn get_matches(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let profile_id = match query.get("profileId").filter(|id| !id.is_empty()) {
        Some(id) => ProfileId::new(id.clone()),
        None => {
            return bad_request(
                "Missing profileId parameter",
                "profileId query parameter is required".to_string(),
            );
        }
    };

    match state.store.matches_for(&profile_id).await {
        Ok(matches) => HttpResponse::Ok().json(MatchesResponse {
            profile_id: profile_id.to_string(),
            count: matches.len(),
            matches,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch matches for {}: {}", profile_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch matches".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
