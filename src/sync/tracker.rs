use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::{
    cache::{format_age_minutes, now_millis},
    KeyValueCache, StoreBackend,
};

/// Prefix for the cache keys sync records persist under.
const SYNC_KEY_PREFIX: &str = "sync-status";

/// Outcome of the most recent synchronization attempt for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatus {
    NeverSynced,
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    pub status: SyncStatus,
    /// Set only on the transition into `Succeeded`; a later failure
    /// leaves it in place so the UI can still show the last good sync.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_success_at: Option<DateTime<Utc>>,
}

impl Default for SyncRecord {
    fn default() -> Self {
        Self {
            status: SyncStatus::NeverSynced,
            last_success_at: None,
        }
    }
}

impl SyncRecord {
    /// Human string for status bars: "never", "just now", "5m ago", ...
    pub fn last_success_display(&self) -> String {
        match self.last_success_at {
            Some(at) => format_age_minutes((Utc::now() - at).num_minutes()),
            None => "never".to_string(),
        }
    }
}

/// Persisted per-module sync state machine.
///
/// Transitions are last-write-wins and deliberately loose: `complete_sync`
/// without a preceding `begin_sync` simply sets the state directly, since
/// orchestrators may report terminal outcomes without announcing a start.
pub struct SyncTracker<B: StoreBackend> {
    cache: Arc<KeyValueCache<B>>,
}

impl<B: StoreBackend> SyncTracker<B> {
    pub fn new(cache: Arc<KeyValueCache<B>>) -> Self {
        Self { cache }
    }

    fn record_key(module: &str) -> String {
        format!("{}/{}", SYNC_KEY_PREFIX, module)
    }

    /// Current record for a module, or the never-synced default.
    pub fn get_status(&self, module: &str) -> SyncRecord {
        self.cache
            .get::<SyncRecord>(&Self::record_key(module))
            .map(|entry| entry.payload)
            .unwrap_or_default()
    }

    /// Mark a sync as started, from any prior state.
    pub fn begin_sync(&self, module: &str) -> Result<(), StoreError> {
        let mut record = self.get_status(module);
        record.status = SyncStatus::InProgress;
        debug!(module, "Sync started");
        self.cache.put(&Self::record_key(module), &record)
    }

    /// Record the outcome of a sync. `last_success_at` is stamped only on
    /// success.
    pub fn complete_sync(&self, module: &str, succeeded: bool) -> Result<(), StoreError> {
        let mut record = self.get_status(module);
        if succeeded {
            record.status = SyncStatus::Succeeded;
            record.last_success_at = Some(now_millis());
            info!(module, "Sync succeeded");
        } else {
            record.status = SyncStatus::Failed;
            warn!(module, "Sync failed");
        }
        self.cache.put(&Self::record_key(module), &record)
    }

    /// Drop the records for the named modules, returning them to the
    /// never-synced default. Part of the full data reset flow.
    pub fn reset_all(&self, modules: &[&str]) -> Result<(), StoreError> {
        let keys: Vec<String> = modules.iter().map(|m| Self::record_key(m)).collect();
        self.cache.clear_all(keys.iter().map(String::as_str))
    }
}

// ============================================================================
// Tests
// ============================================================================
