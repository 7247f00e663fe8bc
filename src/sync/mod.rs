//! Per-module synchronization status tracking.
//!
//! `SyncTracker` records the outcome of the last synchronization attempt
//! for each logical data module ("encyclopedia", "weather", ...) and the
//! timestamp of the last success, persisted through the key-value cache
//! so status survives app restarts.
//!
//! The tracker is purely a record-keeper: it never invokes fetches or
//! decides when to sync. Orchestration drives the transitions.

pub mod tracker;

pub use tracker::{SyncRecord, SyncStatus, SyncTracker};
