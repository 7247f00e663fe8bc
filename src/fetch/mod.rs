//! Connectivity-aware fetch policy.
//!
//! `DataFetcher` decides, per invocation, whether to serve cached data,
//! invoke the caller's async operation, or fail:
//!
//! - offline with any cached entry: serve it, regardless of age
//! - offline with nothing cached: fail immediately, no retry
//! - online with a fresh entry: short-circuit (unless force-refresh)
//! - otherwise: invoke the operation, retrying transient failures with
//!   linear backoff, and degrade to stale cache once the budget runs out
//!
//! Results carry a `DataSource` tag so the UI can show a "possibly
//! outdated" indicator for anything not fetched fresh.

pub mod connectivity;
pub mod fetcher;

pub use connectivity::{AssumeOnline, Connectivity, ConnectivityFlag};
pub use fetcher::{DataFetcher, DataSource, FetchPlan, Fetched};
