use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use swipe_engine::config::{FeedBackend, Settings, StoreBackend};
use swipe_engine::core::{LikeMatchCoordinator, MatchNotifier};
use swipe_engine::models::Profile;
use swipe_engine::routes::{self, discovery::AppState};
use swipe_engine::services::{
    AppwriteClient, AppwriteCollections, CacheManager, LikeMatchStore, MemoryStore, PostgresClient,
    ProfileFeed, StaticFeed,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings: &Settings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

async fn build_store(settings: &Settings) -> std::io::Result<Arc<dyn LikeMatchStore>> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory like/match store; records are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db = settings
                .database
                .as_ref()
                .ok_or_else(|| io_error("database settings are required for the postgres store".to_string()))?;

            let client = PostgresClient::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io_error(format!("PostgreSQL connection error: {}", e))
            })?;

            info!("PostgreSQL store initialized (max: {} connections)", db.max_connections.unwrap_or(10));
            Ok(Arc::new(client))
        }
    }
}

fn build_feed(settings: &Settings) -> std::io::Result<Arc<dyn ProfileFeed>> {
    match settings.feed.backend {
        FeedBackend::Static => {
            let profiles: Vec<Profile> = match &settings.feed.profiles_path {
                Some(path) => {
                    let raw = std::fs::read_to_string(path)?;
                    serde_json::from_str(&raw)
                        .map_err(|e| io_error(format!("Invalid profiles file {}: {}", path, e)))?
                }
                None => vec![],
            };
            info!("Static feed loaded with {} profiles", profiles.len());
            Ok(Arc::new(StaticFeed::new(profiles)))
        }
        FeedBackend::Appwrite => {
            let appwrite = settings
                .appwrite
                .as_ref()
                .ok_or_else(|| io_error("appwrite settings are required for the appwrite feed".to_string()))?;

            let client = AppwriteClient::new(
                appwrite.endpoint.clone(),
                appwrite.api_key.clone(),
                appwrite.project_id.clone(),
                appwrite.database_id.clone(),
                AppwriteCollections {
                    profiles: settings.collection.profiles.clone(),
                },
                std::time::Duration::from_secs(appwrite.timeout_secs.unwrap_or(30)),
            )
            .map_err(|e| io_error(format!("Failed to create Appwrite client: {}", e)))?;

            info!("Appwrite feed initialized");
            Ok(Arc::new(client))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error(format!("Configuration error: {}", e))
    })?;

    init_logging(&settings);

    info!("Starting swipe engine...");

    let store = build_store(&settings).await?;
    let feed = build_feed(&settings)?;

    // Cache is optional - candidates are served uncached without it
    let cache = match &settings.cache {
        Some(cache_settings) => {
            let ttl = cache_settings.ttl_secs.unwrap_or(60);
            let l1_size = cache_settings.l1_cache_size.unwrap_or(1000);
            match CacheManager::new(&cache_settings.redis_url, l1_size, ttl).await {
                Ok(c) => {
                    info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
                    Some(Arc::new(c))
                }
                Err(e) => {
                    error!("Failed to connect to Redis ({}), running without cache", e);
                    None
                }
            }
        }
        None => None,
    };

    let notifier = MatchNotifier::new(settings.coordinator.match_channel_capacity);
    let coordinator = LikeMatchCoordinator::new(store.clone(), notifier.clone(), settings.coordinator.call_timeout());

    info!(
        "Coordinator initialized (timeout: {:?}, swipe threshold: {}px, super-like threshold: {}px)",
        settings.coordinator.call_timeout(),
        settings.swipe.swipe_threshold,
        settings.swipe.super_like_threshold
    );

    // Notification delivery lives elsewhere; log what it would receive
    let mut match_events = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match match_events.recv().await {
                Ok(event) => info!(
                    "onMatch: {} <-> {} at {}",
                    event.profile_a_id,
                    event.profile_b_id,
                    event.matched_at
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Match event listener lagged, skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let app_state = AppState {
        feed,
        store,
        coordinator,
        cache,
        feed_settings: settings.feed.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
