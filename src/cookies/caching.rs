//! Size-bounded, time-limited cookie cache.
//!
//! Stores one cookie list per host. An entry disappears when it was written
//! more than `expire_after_write` ago or read more than `expire_after_access`
//! ago, and the least recently used host is evicted once more than
//! `maximum_size` hosts are stored.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::jar::CookieJar;
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

/// Settings for [`CachingCookieJar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Install a caching jar when the client is built without an explicit one.
    pub enabled: bool,
    /// Maximum number of hosts kept.
    pub maximum_size: u64,
    #[serde(with = "humantime_serde")]
    pub expire_after_write: Duration,
    #[serde(with = "humantime_serde")]
    pub expire_after_access: Duration,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            maximum_size: 10_000,
            expire_after_write: Duration::from_secs(30 * 60),
            expire_after_access: Duration::from_secs(30 * 60),
        }
    }
}

/// moka panics on expiry windows longer than 1000 years.
const MAX_EXPIRY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Host-keyed cookie cache with LRU size bound and write/access TTLs.
pub struct CachingCookieJar {
    cache: Cache<String, Vec<CanonicalCookie>>,
    maximum_size: u64,
}

impl Default for CachingCookieJar {
    fn default() -> Self {
        Self::from_config(&CookieConfig::default())
    }
}

impl CachingCookieJar {
    pub fn new(maximum_size: u64, expire_after_write: Duration, expire_after_access: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(maximum_size)
            .eviction_policy(EvictionPolicy::lru())
            .time_to_live(expire_after_write.min(MAX_EXPIRY))
            .time_to_idle(expire_after_access.min(MAX_EXPIRY))
            .eviction_listener(|host: Arc<String>, _cookies, cause: RemovalCause| {
                if cause.was_evicted() {
                    tracing::debug!(host = %host, ?cause, "cookie cache entry removed");
                }
            })
            .build();

        Self {
            cache,
            maximum_size,
        }
    }

    pub fn from_config(config: &CookieConfig) -> Self {
        Self::new(
            config.maximum_size,
            config.expire_after_write,
            config.expire_after_access,
        )
    }

    /// Number of hosts currently stored, after applying pending evictions.
    pub fn len(&self) -> usize {
        self.cache.run_pending_tasks();
        usize::try_from(self.cache.entry_count()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Whether `host` has a live entry. Does not count as an access.
    pub fn contains_host(&self, host: &str) -> bool {
        self.cache.contains_key(host)
    }

    /// Apply pending evictions and drop expired entries now.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl std::fmt::Debug for CachingCookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingCookieJar")
            .field("maximum_size", &self.maximum_size)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl CookieJar for CachingCookieJar {
    fn name(&self) -> &str {
        "caching"
    }

    fn save_from_response(&self, url: &Url, cookies: &[CanonicalCookie]) -> Result<(), NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?.to_lowercase();
        if self.maximum_size == 0 {
            return Ok(());
        }
        self.cache.insert(host, cookies.to_vec());
        // Evict now so the host bound holds after every save.
        self.cache.run_pending_tasks();
        Ok(())
    }

    fn load_for_request(&self, url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        let Some(host) = url.host_str().map(str::to_lowercase) else {
            return Ok(Vec::new());
        };
        let Some(mut cookies) = self.cache.get(&host) else {
            return Ok(Vec::new());
        };
        // Filter only; writing back would restart the write TTL.
        let now = OffsetDateTime::now_utc();
        cookies.retain(|c| !c.is_expired(now));
        Ok(cookies)
    }
}
