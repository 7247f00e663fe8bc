//! Offline data cache and sync layer for the cropcache field client.
//!
//! Rural connectivity is unreliable, so every data screen in the app works
//! from a local snapshot first. This crate is the policy layer that makes
//! that possible:
//!
//! - [`store`]: a timestamped key-value cache over pluggable storage
//!   backends (one JSON file per key on device, in-memory for tests).
//! - [`fetch`]: a connectivity-aware fetch policy - serve fresh cache,
//!   fall back to stale cache when offline or after retries are exhausted,
//!   retry transient failures with linear backoff.
//! - [`sync`]: a persisted per-module record of the last synchronization
//!   outcome, for "last synced 5m ago" status displays.
//!
//! The network client, UI, and sync orchestration live outside this crate;
//! callers hand [`fetch::DataFetcher`] an async operation and a
//! [`fetch::FetchPlan`] describing the caching and retry policy for that
//! one call.

pub mod config;
pub mod error;
pub mod fetch;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{FetchError, StoreError};
pub use fetch::{
    AssumeOnline, Connectivity, ConnectivityFlag, DataFetcher, DataSource, FetchPlan, Fetched,
};
pub use store::{CacheEntry, FileStore, KeyValueCache, MemoryStore, StoreBackend};
pub use sync::{SyncRecord, SyncStatus, SyncTracker};
