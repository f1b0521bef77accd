use crate::core::CardConfig;
use crate::models::SwipeThresholds;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub appwrite: Option<AppwriteSettings>,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub cache: Option<CacheSettings>,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub swipe: SwipeSettings,
    #[serde(default)]
    pub coordinator: CoordinatorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_profiles_collection")]
    pub profiles: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            profiles: default_profiles_collection(),
        }
    }
}

fn default_profiles_collection() -> String { "profiles".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

/// Which like/match store backs the coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Which profile feed serves candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedBackend {
    #[default]
    Appwrite,
    Static,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    #[serde(default)]
    pub backend: FeedBackend,
    /// JSON array of profiles, used by the static feed
    #[serde(default)]
    pub profiles_path: Option<String>,
    #[serde(default = "default_feed_limit")]
    pub default_limit: u16,
    #[serde(default = "default_feed_max_limit")]
    pub max_limit: u16,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            backend: FeedBackend::default(),
            profiles_path: None,
            default_limit: default_feed_limit(),
            max_limit: default_feed_max_limit(),
        }
    }
}

fn default_feed_limit() -> u16 { 20 }
fn default_feed_max_limit() -> u16 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct SwipeSettings {
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,
    #[serde(default = "default_super_like_threshold")]
    pub super_like_threshold: f64,
    #[serde(default = "default_true")]
    pub super_like_enabled: bool,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            swipe_threshold: default_swipe_threshold(),
            super_like_threshold: default_super_like_threshold(),
            super_like_enabled: true,
        }
    }
}

impl SwipeSettings {
    pub fn card_config(&self) -> CardConfig {
        CardConfig {
            thresholds: SwipeThresholds {
                swipe: self.swipe_threshold,
                super_like: self.super_like_threshold,
            },
            super_like_enabled: self.super_like_enabled,
        }
    }
}

fn default_swipe_threshold() -> f64 { 100.0 }
fn default_super_like_threshold() -> f64 { -80.0 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorSettings {
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_match_channel_capacity")]
    pub match_channel_capacity: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            match_channel_capacity: default_match_channel_capacity(),
        }
    }
}

impl CoordinatorSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

fn default_call_timeout_ms() -> u64 { 5000 }
fn default_match_channel_capacity() -> usize { 256 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SWIPE_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SWIPE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;
        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply well-known unprefixed environment variables
///
/// `DATABASE_URL` and `REDIS_URL` are what most hosting platforms inject.
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }

    builder.build()
}
