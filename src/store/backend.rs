use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StoreError;

/// Persistent string storage underneath the cache.
///
/// Backends store UTF-8 string values (the cache JSON-serializes payloads
/// before handing them down) and have no native key enumeration - callers
/// that need to clear everything must track their own key list.
pub trait StoreBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// One JSON file per key under a cache directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io {
            key: dir.display().to_string(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Map a cache key to a filesystem-safe file name.
///
/// Keys that are already safe pass through unchanged so cache files stay
/// recognizable. Anything else gets unsafe bytes replaced and a hash of
/// the original key appended, so distinct keys stay distinct.
fn sanitize_key(key: &str) -> String {
    fn is_safe(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
    }

    if !key.is_empty() && key.chars().all(is_safe) {
        return key.to_string();
    }

    let cleaned: String = key
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    format!("{}-{:016x}", cleaned, hasher.finish())
}

impl StoreBackend for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::Io {
            key: key.to_string(),
            source: e,
        })?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        // Write through a temp file and rename so a failed write leaves
        // the prior value for this key untouched.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| StoreError::Io {
            key: key.to_string(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::Io {
            key: key.to_string(),
            source: e,
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Mutex-guarded map, for tests and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Recover from poisoning: a panic mid-insert cannot leave the map
        // in a torn state, the guard just records that a panic happened.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl StoreBackend for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        assert!(store.get("weather").unwrap().is_none());
        store.set("weather", r#"{"temp":20}"#).unwrap();
        assert_eq!(store.get("weather").unwrap().unwrap(), r#"{"temp":20}"#);
    }

    #[test]
    fn test_file_store_overwrite_replaces_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.set("k", "first value, quite long").unwrap();
        store.set("k", "2nd").unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), "2nd");
    }

    #[test]
    fn test_file_store_remove_is_noop_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.remove("missing").unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_sanitize_key_passthrough_for_safe_keys() {
        assert_eq!(sanitize_key("market_listings"), "market_listings");
        assert_eq!(sanitize_key("forum-posts.page1"), "forum-posts.page1");
    }

    #[test]
    fn test_sanitize_key_keeps_distinct_keys_distinct() {
        // Both collapse to the same cleaned form; the hash suffix must differ
        let a = sanitize_key("sync/weather");
        let b = sanitize_key("sync:weather");
        assert_ne!(a, b);
        assert!(a.starts_with("sync_weather-"));
    }

    #[test]
    fn test_file_store_key_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store.set("sync/weather", "a").unwrap();
        store.set("sync/encyclopedia", "b").unwrap();
        assert_eq!(store.get("sync/weather").unwrap().unwrap(), "a");
        assert_eq!(store.get("sync/encyclopedia").unwrap().unwrap(), "b");
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), "v");
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }
}
