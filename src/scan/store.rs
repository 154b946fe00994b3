use crate::audit::InfractionRecord;
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::scan::record::ElementRecord;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// String key-value persistence, the shape of a page's local storage
pub trait Storage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: String) -> Result<()>;
}

/// Storage that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}

/// Storage keeping one `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

type SharedStorage = Arc<Mutex<dyn Storage>>;

/// Read access to the persisted element inventory and infractions
#[derive(Clone)]
pub struct InventoryStore {
    storage: SharedStorage,
    elements_key: String,
    infractions_key: String,
}

impl InventoryStore {
    pub fn new(storage: impl Storage + 'static, config: &ScanConfig) -> Self {
        let storage: SharedStorage = Arc::new(Mutex::new(storage));
        Self {
            storage,
            elements_key: config.elements_key.clone(),
            infractions_key: config.infractions_key.clone(),
        }
    }

    pub fn in_memory(config: &ScanConfig) -> Self {
        Self::new(MemoryStorage::new(), config)
    }

    pub fn elements(&self) -> Result<Vec<ElementRecord>> {
        self.read_list(&self.elements_key)
    }

    pub fn infractions(&self) -> Result<Vec<InfractionRecord>> {
        self.read_list(&self.infractions_key)
    }

    /// The single writer for this store; handed to the top-level frame only
    pub(crate) fn writer(&self) -> InventoryWriter {
        InventoryWriter { store: self.clone() }
    }

    fn lock(&self) -> Result<MutexGuard<'_, dyn Storage + 'static>> {
        self.storage
            .lock()
            .map_err(|e| ScanError::Storage(format!("Storage lock poisoned: {}", e)))
    }

    /// A missing key or a `null` value reads as an empty list
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let raw = self.lock()?.get_item(key)?;
        match raw {
            Some(json) => Ok(serde_json::from_str::<Option<Vec<T>>>(&json)?.unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.lock()?.set_item(key, json)
    }
}

/// Exclusive write access to an [`InventoryStore`]
pub struct InventoryWriter {
    store: InventoryStore,
}

impl InventoryWriter {
    /// Empty both lists
    pub fn reset(&mut self) -> Result<()> {
        self.store.write_list::<ElementRecord>(&self.store.elements_key, &[])?;
        self.store.write_list::<InfractionRecord>(&self.store.infractions_key, &[])
    }

    pub fn replace_elements(&mut self, records: &[ElementRecord]) -> Result<()> {
        self.store.write_list(&self.store.elements_key, records)
    }

    /// Append records whose `(xpath, frame, tag)` is not stored yet; returns how many were added
    pub fn merge_elements(&mut self, batch: Vec<ElementRecord>) -> Result<usize> {
        let mut stored = self.store.elements()?;
        let before = stored.len();

        for record in batch {
            if !stored.iter().any(|existing| existing.same_element(&record)) {
                stored.push(record);
            }
        }

        let added = stored.len() - before;
        debug!("Merged {} new elements into inventory", added);
        self.store.write_list(&self.store.elements_key, &stored)?;
        Ok(added)
    }

    pub fn replace_infractions(&mut self, infractions: &[InfractionRecord]) -> Result<()> {
        self.store.write_list(&self.store.infractions_key, infractions)
    }

    /// Append infractions that are not already stored verbatim
    pub fn merge_infractions(&mut self, batch: Vec<InfractionRecord>) -> Result<usize> {
        let mut stored = self.store.infractions()?;
        let before = stored.len();

        for infraction in batch {
            if !stored.contains(&infraction) {
                stored.push(infraction);
            }
        }

        let added = stored.len() - before;
        self.store.write_list(&self.store.infractions_key, &stored)?;
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Locator, Quality};
    use crate::scan::record::FrameLocator;

    fn record(xpath: &str, frame: &str) -> ElementRecord {
        let locator = Locator::new(xpath, Quality::Attribute);
        ElementRecord::new("input", locator, FrameLocator::from(frame))
    }

    #[test]
    fn test_missing_and_null_read_empty() {
        let config = ScanConfig::default();
        let mut storage = MemoryStorage::new();
        storage.set_item(&config.infractions_key, "null".to_string()).unwrap();
        let store = InventoryStore::new(storage, &config);

        assert!(store.elements().unwrap().is_empty());
        assert!(store.infractions().unwrap().is_empty());
    }

    #[test]
    fn test_merge_dedups_by_identity() {
        let store = InventoryStore::in_memory(&ScanConfig::default());
        let mut writer = store.writer();

        writer.replace_elements(&[record("//input[1]", "ROOT")]).unwrap();
        let added = writer
            .merge_elements(vec![
                record("//input[1]", "ROOT"),
                record("//input[1]", "//iframe[@id=\"a\"]"),
                record("//input[1]", "//iframe[@id=\"a\"]"),
            ])
            .unwrap();

        assert_eq!(added, 1);
        let elements = store.elements().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].frame.as_str(), "//iframe[@id=\"a\"]");
    }

    #[test]
    fn test_reset_clears_both_lists() {
        let store = InventoryStore::in_memory(&ScanConfig::default());
        let mut writer = store.writer();
        writer.replace_elements(&[record("//a", "ROOT")]).unwrap();

        writer.reset().unwrap();

        assert!(store.elements().unwrap().is_empty());
        assert!(store.infractions().unwrap().is_empty());
    }

    #[test]
    fn test_raw_storage_holds_json_array() {
        let config = ScanConfig::default();
        let store = InventoryStore::in_memory(&config);
        store.writer().replace_elements(&[record("//a", "ROOT")]).unwrap();

        let raw = store.lock().unwrap().get_item("myElementsCache").unwrap().unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains("\"FRAME\":\"ROOT\""));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("xpath-scanner-store-{}", std::process::id()));
        let mut storage = FileStorage::open(&dir).unwrap();

        assert_eq!(storage.get_item("missing").unwrap(), None);
        storage.set_item("myElementsCache", "[]".to_string()).unwrap();
        assert_eq!(storage.get_item("myElementsCache").unwrap().as_deref(), Some("[]"));

        let _ = fs::remove_dir_all(&dir);
    }
}
