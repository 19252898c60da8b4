use std::fmt::Display;

use redis::{AsyncCommands, Client};

use crate::models::CatalogTitle;

/// Cache TTL for catalog list queries, in seconds
const CATALOG_CACHE_TTL: u64 = 600;

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Keys for cached catalog queries
#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    TopRated(f64),
    TopRatedByGenre(String, f64),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TopRated(min) => write!(f, "catalog:top:{:.1}", min),
            CacheKey::TopRatedByGenre(genre, min) => {
                write!(f, "catalog:genre:{}:{:.1}", genre.to_lowercase(), min)
            }
        }
    }
}

/// Cache-aside helper for hot catalog list queries
///
/// Every recommendation request fans out into several top-rated catalog
/// lookups, and the catalog itself changes rarely, so the lists are cached
/// with a short TTL. Cache failures are logged and the caller falls through
/// to the database.
#[derive(Clone)]
pub struct CatalogCache {
    redis_client: Client,
}

impl CatalogCache {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Attempts to retrieve a cached title list; misses and errors both yield `None`
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<CatalogTitle>> {
        let mut conn = match self.redis_client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Redis connection failed, skipping cache read");
                return None;
            }
        };

        let cached: Option<String> = match conn.get(key.to_string()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Redis get failed");
                return None;
            }
        };

        let json = cached?;
        match serde_json::from_str(&json) {
            Ok(titles) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(titles)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache deserialization failed");
                None
            }
        }
    }

    /// Stores a title list; errors are logged and swallowed
    pub async fn put(&self, key: &CacheKey, titles: &[CatalogTitle]) {
        let json = match serde_json::to_string(titles) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache serialization failed");
                return;
            }
        };

        let mut conn = match self.redis_client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Redis connection failed, skipping cache write");
                return;
            }
        };

        let result: Result<(), _> = conn.set_ex(key.to_string(), json, CATALOG_CACHE_TTL).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, key = %key, "Redis set failed");
        } else {
            tracing::debug!(key = %key, ttl = CATALOG_CACHE_TTL, "Cached catalog query");
        }
    }
}
