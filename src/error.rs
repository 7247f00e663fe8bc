use thiserror::Error;

/// Failures from the persistent key-value storage layer.
///
/// Read-path corruption is not represented here: a cache entry that fails
/// to deserialize is treated as absent by `KeyValueCache::get`, never
/// surfaced as an error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize payload for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures surfaced by the fetch policy after all fallbacks are exhausted.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Device is offline and no cached entry exists for the requested key.
    /// Never retried; the UI is expected to render a retry affordance.
    #[error("Offline and no cached data available")]
    Offline,

    /// The caller-supplied operation failed on every attempt and no stale
    /// cache entry was available to fall back on.
    #[error("Fetch failed after {attempts} attempt(s): {source}")]
    Operation {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}
