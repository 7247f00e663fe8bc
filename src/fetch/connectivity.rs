use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Current online/offline status of the device.
///
/// The check must be cheap - it runs on every fetch. Platform-specific
/// network monitoring lives outside this crate and feeds one of the
/// implementations below.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Always reports online. For embedders without a connectivity signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Shared boolean flag the surrounding app flips when the network monitor
/// reports a change. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct ConnectivityFlag {
    online: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}
