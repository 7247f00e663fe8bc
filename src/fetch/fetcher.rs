use std::cell::Cell;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::connectivity::Connectivity;
use crate::error::FetchError;
use crate::store::{CacheEntry, KeyValueCache, StoreBackend};
use crate::sync::SyncTracker;

/// Consider cached data stale after 1 hour unless the plan says otherwise.
/// Balances freshness with reducing unnecessary network calls for
/// slowly-changing data (encyclopedia articles, market listings).
const DEFAULT_MAX_AGE_MINUTES: i64 = 60;

/// Default number of additional attempts after the first failure.
const DEFAULT_RETRY_BUDGET: u32 = 2;

/// Default base delay for linear backoff between retries.
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Per-invocation fetch policy: what to cache under, how old is too old,
/// and how hard to retry. Owned by the caller for one invocation; nothing
/// survives between invocations except through the cache itself.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Cache key for this data; `None` bypasses caching entirely.
    pub cache_key: Option<String>,
    /// Age after which a cached entry no longer short-circuits a fetch.
    pub max_age: Duration,
    /// Maximum additional attempts after the first failure.
    pub retry_budget: u32,
    /// Backoff is `retry_base_delay * attempt_number` (linear).
    pub retry_base_delay: StdDuration,
    /// Skip the fresh-cache short-circuit. Never overrides the offline
    /// availability rule.
    pub force_refresh: bool,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            cache_key: None,
            max_age: Duration::minutes(DEFAULT_MAX_AGE_MINUTES),
            retry_budget: DEFAULT_RETRY_BUDGET,
            retry_base_delay: StdDuration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            force_refresh: false,
        }
    }
}

impl FetchPlan {
    /// Plan that caches under `key` with the default policy.
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            cache_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Plan with caching bypassed.
    pub fn uncached() -> Self {
        Self::default()
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_retries(mut self, budget: u32, base_delay: StdDuration) -> Self {
        self.retry_budget = budget;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

/// Where a fetch result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fresh data from the operation.
    Network,
    /// Cached data still within its max age.
    CacheFresh,
    /// Cached data past its max age, served after the operation failed.
    CacheStale,
    /// Cached data of any age, served because the device is offline.
    Offline,
}

/// A fetch result tagged with its source so callers can show a
/// "possibly outdated" indicator.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub source: DataSource,
    /// When the served data was cached; `None` for network-fresh results.
    pub stored_at: Option<DateTime<Utc>>,
}

impl<T> Fetched<T> {
    fn network(data: T) -> Self {
        Self {
            data,
            source: DataSource::Network,
            stored_at: None,
        }
    }

    fn from_entry(entry: CacheEntry<T>, source: DataSource) -> Self {
        Self {
            data: entry.payload,
            source,
            stored_at: Some(entry.stored_at),
        }
    }

    pub fn is_from_cache(&self) -> bool {
        self.source != DataSource::Network
    }

    /// True when the served data may be older than the plan's max age.
    pub fn possibly_stale(&self) -> bool {
        matches!(self.source, DataSource::CacheStale | DataSource::Offline)
    }
}

/// Policy wrapper around caller-supplied async operations.
///
/// Holds no per-request state; concurrent fetches for the same key are
/// independent and the cache is last-write-wins.
pub struct DataFetcher<B: StoreBackend, C: Connectivity> {
    cache: Arc<KeyValueCache<B>>,
    connectivity: C,
}

impl<B: StoreBackend, C: Connectivity> DataFetcher<B, C> {
    pub fn new(cache: Arc<KeyValueCache<B>>, connectivity: C) -> Self {
        Self {
            cache,
            connectivity,
        }
    }

    pub fn cache(&self) -> &Arc<KeyValueCache<B>> {
        &self.cache
    }

    /// Execute one logical fetch under the given plan.
    ///
    /// Offline with a cached entry serves it regardless of age; offline
    /// with nothing cached fails without invoking `operation`. Online, a
    /// fresh entry short-circuits unless the plan forces a refresh;
    /// otherwise `operation` runs with up to `retry_budget` retries at
    /// linearly increasing delays, falling back to a stale entry once the
    /// budget is spent.
    pub async fn fetch<T, F, Fut>(
        &self,
        plan: &FetchPlan,
        mut operation: F,
    ) -> Result<Fetched<T>, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut cached: Option<CacheEntry<T>> = plan
            .cache_key
            .as_deref()
            .and_then(|key| self.cache.get(key));

        if !self.connectivity.is_online() {
            return match cached {
                Some(entry) => {
                    debug!(key = ?plan.cache_key, age = %entry.age_display(), "Offline, serving cached data");
                    Ok(Fetched::from_entry(entry, DataSource::Offline))
                }
                None => Err(FetchError::Offline),
            };
        }

        if !plan.force_refresh && cached.as_ref().is_some_and(|e| !e.is_stale(plan.max_age)) {
            if let Some(entry) = cached.take() {
                return Ok(Fetched::from_entry(entry, DataSource::CacheFresh));
            }
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(data) => {
                    if let Some(key) = plan.cache_key.as_deref() {
                        // A failed write-back does not fail the fetch; the
                        // fresh data is still returned to the caller.
                        if let Err(e) = self.cache.put(key, &data) {
                            warn!(key, error = %e, "Failed to cache fetched data");
                        }
                    }
                    return Ok(Fetched::network(data));
                }
                Err(err) => {
                    // Retry only while the budget holds and the device is
                    // still online.
                    if attempt <= plan.retry_budget && self.connectivity.is_online() {
                        let delay = plan.retry_base_delay * attempt;
                        debug!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Fetch failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if let Some(entry) = cached.take() {
                        warn!(
                            key = ?plan.cache_key,
                            attempts = attempt,
                            error = %err,
                            "Fetch failed, serving stale cache"
                        );
                        return Ok(Fetched::from_entry(entry, DataSource::CacheStale));
                    }
                    return Err(FetchError::Operation {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    /// Like [`fetch`](Self::fetch), recording the outcome in the sync
    /// tracker under `module`.
    ///
    /// The tracker only transitions when the operation is actually
    /// attempted: cache short-circuits and offline-served results leave
    /// the record untouched. An attempt records `Succeeded` on network
    /// success and `Failed` otherwise, including when the caller was
    /// served a stale fallback.
    pub async fn fetch_tracked<T, F, Fut>(
        &self,
        tracker: &SyncTracker<B>,
        module: &str,
        plan: &FetchPlan,
        mut operation: F,
    ) -> Result<Fetched<T>, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let attempted = Cell::new(false);

        let result = self
            .fetch(plan, || {
                if !attempted.get() {
                    attempted.set(true);
                    if let Err(e) = tracker.begin_sync(module) {
                        warn!(module, error = %e, "Failed to record sync start");
                    }
                }
                operation()
            })
            .await;

        if attempted.get() {
            let succeeded =
                matches!(&result, Ok(fetched) if fetched.source == DataSource::Network);
            if let Err(e) = tracker.complete_sync(module, succeeded) {
                warn!(module, error = %e, "Failed to record sync outcome");
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================
