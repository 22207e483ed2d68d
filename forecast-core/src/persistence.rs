//! Best-effort snapshot storage for the saved-forecast collection.
//!
//! The collection lives in a single named slot of a key-value store. Reads that
//! fail for any reason produce an empty collection and writes that fail are only
//! logged: the dashboard keeps working from memory either way.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
};

use crate::{
    error::{ForecastError, Result},
    model::SavedForecast,
};

pub const DEFAULT_SLOT: &str = "saved-forecasts";

/// Opaque key-value persistence boundary.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, slot: &str) -> Result<Option<String>>;

    fn write(&self, slot: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        (**self).read(slot)
    }

    fn write(&self, slot: &str, value: &str) -> Result<()> {
        (**self).write(slot, value)
    }
}

/// One file per slot inside `root`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| {
            ForecastError::persistence(format!("Failed to read {}: {e}", path.display()))
        })?;
        Ok(Some(content))
    }

    fn write(&self, slot: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            ForecastError::persistence(format!(
                "Failed to create data directory {}: {e}",
                self.root.display()
            ))
        })?;

        let path = self.slot_path(slot);
        fs::write(&path, value).map_err(|e| {
            ForecastError::persistence(format!("Failed to write {}: {e}", path.display()))
        })
    }
}

/// In-process store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<()> {
        self.slots.lock().insert(slot.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and snapshots the collection through a [`KeyValueStore`].
pub struct ForecastRepository {
    store: Box<dyn KeyValueStore>,
    slot: String,
}

impl ForecastRepository {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            slot: DEFAULT_SLOT.to_string(),
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKeyValueStore::new()))
    }

    /// Read the saved collection. Never fails: missing, unreadable or malformed
    /// data yields an empty collection.
    pub fn load(&self) -> Vec<SavedForecast> {
        let raw = match self.store.read(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "failed to read saved forecasts");
                return Vec::new();
            }
        };

        match decode(&raw) {
            Ok(items) => {
                tracing::debug!(count = items.len(), "loaded saved forecasts");
                items
            }
            Err(e) => {
                tracing::warn!(
                    slot = %self.slot,
                    error = %e,
                    "discarding unreadable saved forecasts"
                );
                Vec::new()
            }
        }
    }

    /// Write the full collection. Failures are logged, never returned.
    pub fn save(&self, items: &[SavedForecast]) {
        let encoded = match serde_json::to_string(items) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize saved forecasts");
                return;
            }
        };

        if let Err(e) = self.store.write(&self.slot, &encoded) {
            tracing::warn!(slot = %self.slot, error = %e, "failed to persist saved forecasts");
        }
    }
}

/// Strict decode: the payload must be an array of well-formed entries with
/// unique keys, otherwise the whole payload is rejected.
fn decode(raw: &str) -> Result<Vec<SavedForecast>> {
    let items: Vec<SavedForecast> = serde_json::from_str(raw)
        .map_err(|e| ForecastError::persistence(format!("invalid saved data: {e}")))?;

    let mut seen = std::collections::HashSet::new();
    for item in &items {
        item.validate()?;
        if !seen.insert(item.key.as_str()) {
            return Err(ForecastError::persistence(format!(
                "duplicate key '{}' in saved data",
                item.key
            )));
        }
    }

    Ok(items)
}
