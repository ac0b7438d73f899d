use crate::config::CacheSettings;
use async_trait::async_trait;
use moka::Expiry;
use rand::Rng;
use redis::aio::ConnectionManager;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Store for serialized route responses
///
/// Values are the exact JSON bodies handed back on a hit.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, json: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Liveness of the backing store
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Expiry policy for one dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TtlPolicy {
    Fixed(Duration),
    /// Uniform in `[min, max]` whole seconds, drawn per write
    Jittered { min: Duration, max: Duration },
}

impl TtlPolicy {
    pub fn resolve(&self) -> Duration {
        match *self {
            TtlPolicy::Fixed(ttl) => ttl,
            TtlPolicy::Jittered { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                let secs = rand::thread_rng().gen_range(lo.as_secs()..=hi.as_secs());
                Duration::from_secs(secs)
            }
        }
    }
}

/// Per-dataset expiry policies
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub snap: TtlPolicy,
    pub counselors: TtlPolicy,
    pub fmr: TtlPolicy,
    pub laus: TtlPolicy,
    pub geocode: TtlPolicy,
}

impl CacheTtls {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            snap: TtlPolicy::Jittered {
                min: Duration::from_secs(settings.snap_ttl_min_secs),
                max: Duration::from_secs(settings.snap_ttl_max_secs),
            },
            counselors: TtlPolicy::Fixed(Duration::from_secs(settings.counselors_ttl_secs)),
            fmr: TtlPolicy::Fixed(Duration::from_secs(settings.fmr_ttl_secs)),
            laus: TtlPolicy::Fixed(Duration::from_secs(settings.laus_ttl_secs)),
            geocode: TtlPolicy::Fixed(Duration::from_secs(settings.geocode_ttl_secs)),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

#[derive(Debug, Clone)]
struct CachedBody {
    json: String,
    ttl: Duration,
}

/// Entries live exactly as long as the TTL they were written with
struct PerEntryTtl;

impl Expiry<String, CachedBody> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CachedBody, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache; L2 is Redis, shared across instances.
/// Without Redis the manager runs on L1 alone.
pub struct CacheManager {
    redis: Option<ConnectionManager>,
    l1_cache: moka::future::Cache<String, CachedBody>,
}

impl CacheManager {
    /// Create a cache manager, degrading to L1-only when Redis is unreachable
    pub async fn new(redis_url: Option<&str>, l1_size: u64) -> Self {
        let redis = match redis_url.filter(|url| !url.is_empty()) {
            Some(url) => match Self::connect(url).await {
                Ok(conn) => Some(conn),
                Err(e) => {
                    tracing::warn!("Redis unavailable ({}), using in-process cache only", e);
                    None
                }
            },
            None => None,
        };

        Self {
            redis,
            l1_cache: Self::build_l1(l1_size),
        }
    }

    /// In-process cache only
    pub fn in_memory(l1_size: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size),
        }
    }

    async fn connect(url: &str) -> Result<ConnectionManager, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(ConnectionManager::new(client).await?)
    }

    fn build_l1(l1_size: u64) -> moka::future::Cache<String, CachedBody> {
        moka::future::Cache::builder()
            .max_capacity(l1_size)
            .expire_after(PerEntryTtl)
            .build()
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }
}

#[async_trait]
impl ResponseCache for CacheManager {
    /// Get a value from cache (L1 first, then L2)
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(body) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(Some(body.json));
        }

        let Some(redis) = &self.redis else {
            return Ok(None);
        };

        // The connection manager multiplexes; each call works on its own handle
        let mut conn = redis.clone();
        let (value, pttl): (Option<String>, i64) = redis::pipe()
            .cmd("GET")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await?;

        if let Some(json) = &value {
            tracing::trace!("L2 cache hit: {}", key);
            if pttl > 0 {
                let body = CachedBody {
                    json: json.clone(),
                    ttl: Duration::from_millis(pttl as u64),
                };
                self.l1_cache.insert(key.to_string(), body).await;
            }
        }

        Ok(value)
    }

    /// Set a value in cache (both L1 and L2)
    async fn set(&self, key: &str, json: &str, ttl: Duration) -> Result<(), CacheError> {
        let body = CachedBody {
            json: json.to_string(),
            ttl,
        };
        self.l1_cache.insert(key.to_string(), body).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.clone();
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl.as_secs().max(1))
                .arg(json)
                .query_async::<()>(&mut conn)
                .await?;
        }

        tracing::trace!("Cache set: {} ({}s)", key, ttl.as_secs());
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        match &self.redis {
            Some(redis) => {
                let mut conn = redis.clone();
                redis::cmd("PING").query_async::<String>(&mut conn).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_ttl_within_bounds() {
        let policy = TtlPolicy::Jittered {
            min: Duration::from_secs(600),
            max: Duration::from_secs(1800),
        };
        for _ in 0..200 {
            let ttl = policy.resolve();
            assert!(ttl >= Duration::from_secs(600) && ttl <= Duration::from_secs(1800));
        }
    }

    #[test]
    fn test_default_ttls() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.counselors.resolve(), Duration::from_secs(3600));
        assert_eq!(ttls.fmr.resolve(), Duration::from_secs(86_400));
        assert_eq!(ttls.laus.resolve(), Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_in_memory_set_get() {
        let cache = CacheManager::in_memory(100);
        assert_eq!(cache.get("snap:abc").await.unwrap(), None);

        cache.set("snap:abc", r#"{"items":[]}"#, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("snap:abc").await.unwrap().as_deref(), Some(r#"{"items":[]}"#));
        assert!(cache.ping().await.is_ok());
        assert!(!cache.has_redis());
    }

    #[tokio::test]
    async fn test_entry_expires_with_its_own_ttl() {
        let cache = CacheManager::in_memory(100);
        cache.set("short", "1", Duration::from_millis(50)).await.unwrap();
        cache.set("long", "2", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_redis_round_trip() {
        let cache = CacheManager::new(Some("redis://127.0.0.1:6379"), 100).await;
        assert!(cache.has_redis());
        cache.set("test_key", "\"value\"", Duration::from_secs(30)).await.unwrap();
        assert_eq!(cache.get("test_key").await.unwrap().as_deref(), Some("\"value\""));
    }
}
