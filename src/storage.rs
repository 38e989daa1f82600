use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage file does not hold a json object")]
    NotAnObject,
}

/// String key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Flat JSON object on disk. Every `set` rewrites the whole file.
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => parse_entries(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let object: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let text = serde_json::to_string_pretty(&Value::Object(object))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn parse_entries(text: &str) -> Result<BTreeMap<String, String>, StorageError> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let Value::Object(object) = serde_json::from_str::<Value>(text)? else {
        return Err(StorageError::NotAnObject);
    };

    // non-string values are not ours, skip them
    Ok(object
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect())
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if previous.as_deref() == Some(value) {
            return Ok(());
        }

        let result = self.flush();
        if result.is_err() {
            // keep the cache in step with the file
            match previous {
                Some(previous) => self.entries.insert(key.to_string(), previous),
                None => self.entries.remove(key),
            };
        }
        result
    }
}

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "primview-{tag}-{}-{nanos}.json",
            std::process::id()
        ))
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let path = temp_path("missing");
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("objectType").unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn values_survive_reopening() {
        let path = temp_path("reopen");
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.set("objectType", "Sphere").unwrap();
            store.set("objectType", "Torus").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("objectType").unwrap().as_deref(), Some("Torus"));

        let text = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["objectType"], "Torus");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn non_object_document_is_rejected() {
        let path = temp_path("array");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(StorageError::NotAnObject)));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_document_is_a_json_error() {
        let path = temp_path("broken");
        fs::write(&path, "{ \"objectType\": ").unwrap();

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(StorageError::Json(_))));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_write_is_retried_on_the_next_set() {
        let dir = temp_path("late-dir");
        let path = dir.join("store.json");
        let mut store = JsonFileStore::open(&path).unwrap();

        assert!(matches!(store.set("objectType", "Sphere"), Err(StorageError::Io(_))));
        assert_eq!(store.get("objectType").unwrap(), None);

        fs::create_dir_all(&dir).unwrap();
        store.set("objectType", "Sphere").unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("objectType").unwrap().as_deref(), Some("Sphere"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.set("objectType", "Cone").unwrap();
        assert_eq!(store.get("objectType").unwrap().as_deref(), Some("Cone"));
    }
}
