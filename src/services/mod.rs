// Service exports
pub mod appwrite;
pub mod cache;
pub mod feed;
pub mod memory;
pub mod postgres;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections};
pub use cache::{CacheManager, CacheKey, CacheError};
pub use feed::{FeedError, ProfileFeed};
pub use memory::{MemoryStore, StaticFeed};
pub use postgres::PostgresClient;
pub use store::{Insert, LikeMatchStore, StoreError};
