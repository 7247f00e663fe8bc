use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::StoreBackend;
use crate::error::StoreError;

/// A cached payload together with the time the cache wrote it.
///
/// `stored_at` is set by the cache at write time, never by the caller, so
/// freshness cannot be forged. It persists as integer milliseconds since
/// the epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }

    /// An entry is stale once its age reaches `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }

    pub fn age_display(&self) -> String {
        format_age_minutes(self.age().num_minutes())
    }
}

/// Current time truncated to millisecond granularity, the precision
/// timestamps persist at. Generating timestamps this way keeps the
/// in-memory value and the stored value identical.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render an age in minutes as a short human string.
/// Negative ages from clock skew render "just now".
pub(crate) fn format_age_minutes(minutes: i64) -> String {
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            // Round up: 1d 12h+ becomes 2d
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Timestamped key-value cache over a storage backend.
///
/// Pure get/put/remove semantics with no internal policy: no eviction, no
/// expiry, no staleness decisions. The fetch layer owns policy.
pub struct KeyValueCache<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> KeyValueCache<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Serialize `payload` with a fresh `stored_at` and write it under
    /// `key`, replacing any prior entry. On backend failure the prior
    /// entry is left unchanged.
    pub fn put<T: Serialize>(&self, key: &str, payload: &T) -> Result<(), StoreError> {
        let entry = CacheEntry {
            payload,
            stored_at: now_millis(),
        };
        let contents = serde_json::to_string_pretty(&entry).map_err(|e| StoreError::Serialize {
            key: key.to_string(),
            source: e,
        })?;
        self.backend.set(key, &contents)
    }

    /// Read the entry under `key`. Missing, unreadable, and corrupt
    /// entries all come back as `None`; corruption is logged, not thrown.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(key, error = %e, "Corrupt cache entry, treating as absent");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(key, error = %e, "Cache read failed, treating as absent");
                None
            }
        }
    }

    /// Delete the entry if present; no-op when absent.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)
    }

    /// Delete every key in the provided list. The backend cannot
    /// enumerate its own keys, so the caller supplies the authoritative
    /// list. Attempts every key even if some removals fail, then reports
    /// the first failure.
    pub fn clear_all<'a, I>(&self, known_keys: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut first_err = None;
        for key in known_keys {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove cache entry during clear");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Sum the serialized byte length of the entries under the given
    /// keys. Display and diagnostics only - never used for eviction.
    pub fn estimate_size<'a, I>(&self, known_keys: I) -> u64
    where
        I: IntoIterator<Item = &'a str>,
    {
        known_keys
            .into_iter()
            .filter_map(|key| self.backend.get(key).ok().flatten())
            .map(|raw| raw.len() as u64)
            .sum()
    }
}

// ============================================================================
// Tests
// ============================================================================
