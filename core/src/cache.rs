//! Persistence of the last confirmed host.
//!
//! The engine only needs a string get/set store. [`TomlFileStore`] keeps it on
//! disk between runs; [`MemoryStore`] is for tests and cache-less runs.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use seekr_common::error::StoreError;
use seekr_common::network::address::Address;
use tracing::{debug, warn};

pub const LAST_DISCOVERED_HOST: &str = "last_discovered_host";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Wraps a store with the single "last known address" slot.
///
/// Entries never expire here; only a failed probe at the coordinator level
/// makes a cached address stale.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The cached address, or `None` when unset, unreadable or malformed.
    pub fn get(&self) -> Option<Address> {
        let raw = match self.store.get(LAST_DISCOVERED_HOST) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("could not read cached host: {e}");
                return None;
            }
        };

        match raw.parse::<Address>() {
            Ok(address) => Some(address),
            Err(e) => {
                debug!("ignoring malformed cached host '{raw}': {e}");
                None
            }
        }
    }

    pub fn set(&self, address: &Address) -> Result<(), StoreError> {
        self.store.set(LAST_DISCOVERED_HOST, address.as_str())
    }
}

/// A flat TOML table of string keys to string values.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for TomlFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(StoreError::Parse(e)) => {
                warn!("replacing unreadable store {}: {e}", self.path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        let text = toml::to_string(&entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, text).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("seekr-test-{}", rand::random::<u64>()))
            .join("nested")
            .join("cache.toml")
    }

    #[test]
    fn empty_cache_returns_none() {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn set_overwrites_previous_address() {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        cache.set(&"192.168.1.20".parse().unwrap()).unwrap();
        cache.set(&"192.168.1.21".parse().unwrap()).unwrap();
        assert_eq!(cache.get(), Some("192.168.1.21".parse().unwrap()));
    }

    #[test]
    fn malformed_entry_reads_as_absent() {
        let store = MemoryStore::with_entry(LAST_DISCOVERED_HOST, "not a host!");
        let cache = ResultCache::new(Arc::new(store));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn empty_entry_reads_as_absent() {
        let store = MemoryStore::with_entry(LAST_DISCOVERED_HOST, "");
        assert_eq!(ResultCache::new(Arc::new(store)).get(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = scratch_path();

        let first = ResultCache::new(Arc::new(TomlFileStore::new(&path)));
        assert_eq!(first.get(), None);
        first.set(&"10.0.0.50".parse().unwrap()).unwrap();

        let reopened = ResultCache::new(Arc::new(TomlFileStore::new(&path)));
        assert_eq!(reopened.get(), Some("10.0.0.50".parse().unwrap()));

        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let path = scratch_path();
        let store = TomlFileStore::new(&path);
        store.set("other", "value").unwrap();
        store.set(LAST_DISCOVERED_HOST, "10.0.0.1").unwrap();

        assert_eq!(store.get("other").unwrap().as_deref(), Some("value"));
        assert!(!path.with_extension("toml.tmp").exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_a_parse_error_and_cache_miss() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "this is = = not toml").unwrap();

        let store = TomlFileStore::new(&path);
        assert!(matches!(store.get(LAST_DISCOVERED_HOST), Err(StoreError::Parse(_))));
        assert_eq!(ResultCache::new(Arc::new(store)).get(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_replaced_on_set() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "garbage = = =").unwrap();

        let cache = ResultCache::new(Arc::new(TomlFileStore::new(&path)));
        cache.set(&"10.0.0.50".parse().unwrap()).unwrap();
        assert_eq!(cache.get(), Some("10.0.0.50".parse().unwrap()));

        let reopened = TomlFileStore::new(&path);
        assert_eq!(
            reopened.get(LAST_DISCOVERED_HOST).unwrap().as_deref(),
            Some("10.0.0.50")
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }
}
