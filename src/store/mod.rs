//! Local key-value cache for offline data access.
//!
//! This module provides the `KeyValueCache` for storing and retrieving
//! timestamped JSON payloads. Storage goes through the `StoreBackend`
//! trait; `FileStore` keeps one JSON file per key on device, `MemoryStore`
//! backs tests.
//!
//! There is no eviction and no background expiry: staleness is judged
//! lazily at read time by comparing `stored_at` against a caller-supplied
//! maximum age.

pub mod backend;
pub mod cache;

pub use backend::{FileStore, MemoryStore, StoreBackend};
pub use cache::{CacheEntry, KeyValueCache};
