use anyhow::Result;
use moka::future::Cache;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

const KEY_PREFIX: &str = "unt";

/// Read-through cache for slow-changing chain data such as token metadata.
///
/// Values live in an in-process `moka` cache and, when reachable, in Redis so
/// several service instances share them.
pub struct CacheService {
    redis: Option<redis::aio::ConnectionManager>,
    memory: Arc<Cache<String, String>>,
}

impl CacheService {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let redis = match redis::Client::open(redis_url) {
            Ok(client) => match client.get_connection_manager().await {
                Ok(conn) => {
                    tracing::info!("Redis connected successfully");
                    Some(conn)
                }
                Err(e) => {
                    tracing::warn!("Redis connection failed: {}, using memory cache only", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Redis client creation failed: {}, using memory cache only", e);
                None
            }
        };

        Ok(Self {
            redis,
            memory: Self::memory_cache(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            redis: None,
            memory: Self::memory_cache(),
        }
    }

    fn memory_cache() -> Arc<Cache<String, String>> {
        Arc::new(
            Cache::builder()
                .max_capacity(256)
                .time_to_live(Duration::from_secs(300))
                .build(),
        )
    }

    fn namespaced(key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let key = Self::namespaced(key);

        if let Some(cached) = self.memory.get(&key).await {
            match serde_json::from_str(&cached) {
                Ok(value) => {
                    tracing::debug!("Memory cache hit for key: {}", key);
                    return Some(value);
                }
                Err(e) => tracing::warn!("Discarding undecodable cache entry {}: {}", key, e),
            }
        }

        let mut redis = self.redis.clone()?;
        match redis.get::<_, Option<String>>(&key).await {
            Ok(Some(cached)) => {
                let value = serde_json::from_str(&cached).ok()?;
                self.memory.insert(key.clone(), cached).await;
                tracing::debug!("Redis cache hit for key: {}", key);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Redis get error: {}", e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let key = Self::namespaced(key);
        let serialized = serde_json::to_string(value)?;

        self.memory.insert(key.clone(), serialized.clone()).await;

        if let Some(mut redis) = self.redis.clone() {
            if let Err(e) = redis
                .set_ex::<_, _, ()>(&key, serialized, ttl.as_secs().max(1))
                .await
            {
                tracing::warn!("Redis set error: {}", e);
            }
        }

        Ok(())
    }

    /// True only when Redis is configured and answers `PING`.
    pub async fn ping(&self) -> bool {
        let Some(mut redis) = self.redis.clone() else {
            return false;
        };
        redis::cmd("PING")
            .query_async::<_, String>(&mut redis)
            .await
            .is_ok()
    }
}
