//! Key/value persistence with an in-memory fallback.
//!
//! Each key maps to one JSON file under the data directory. Reads and writes
//! never surface errors to callers: when the backing store is unavailable or
//! a blob fails to parse, the store falls back to an in-process map that
//! survives for the lifetime of the `Store` value. Writes always attempt the
//! backing file first and mirror into the fallback regardless of success, so
//! reads stay consistent within a runtime session even on a broken disk.

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct Store {
    root: PathBuf,
    fallback: HashMap<String, Value>,
}

impl Store {
    /// Open a store rooted at the given directory. The directory is created
    /// lazily on first write; a missing directory just means empty reads.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fallback: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Read a value, returning `fallback` when the key is absent or the
    /// stored blob cannot be read or parsed.
    pub fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.read_value(key) {
            Some(value) => match serde_json::from_value(value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Stored value for {} has unexpected shape: {}", key, e);
                    fallback
                }
            },
            None => fallback,
        }
    }

    fn read_value(&self, key: &str) -> Option<Value> {
        let path = self.key_path(key);
        if path.exists() {
            match read_locked(&path) {
                Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                    Ok(value) if !value.is_null() => return Some(value),
                    Ok(_) => return None,
                    Err(e) => {
                        tracing::warn!("Failed to parse {} blob: {}. Trying fallback.", key, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {} blob: {}. Trying fallback.", key, e);
                }
            }
        }
        self.fallback.get(key).cloned()
    }

    /// Write a value. Attempts an atomic locked file write, then mirrors the
    /// value into the in-memory fallback either way.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to serialize value for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.write_file(key, &json) {
            tracing::warn!("Failed to persist {}: {}. Keeping in-memory copy.", key, e);
        }
        self.fallback.insert(key.to_string(), json);
    }

    /// Atomically writes by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn write_file(&self, key: &str, value: &Value) -> crate::Result<()> {
        std::fs::create_dir_all(&self.root)?;

        let temp = NamedTempFile::new_in(&self.root)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(value)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(self.key_path(key))
            .map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Persisted {}", key);
        Ok(())
    }
}

fn read_locked(path: &Path) -> crate::Result<String> {
    use std::io::Read;
    let file = std::fs::File::open(path)?;
    file.lock_shared()?;
    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    let result = reader.read_to_string(&mut contents);
    file.unlock()?;
    result?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_get_set_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path());

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u32);
        store.set("counts", &map);

        let loaded: BTreeMap<String, u32> = store.get("counts", BTreeMap::new());
        assert_eq!(loaded, map);
        assert!(dir.path().join("counts.json").exists());
    }

    #[test]
    fn test_missing_key_returns_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());
        let value: Vec<String> = store.get("absent", vec!["default".into()]);
        assert_eq!(value, vec!["default".to_string()]);
    }

    #[test]
    fn test_corrupt_blob_returns_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json }").unwrap();
        let store = Store::open(dir.path());
        let value: u32 = store.get("bad", 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn test_set_survives_unwritable_root() {
        // Root is a file, so every file write fails; reads must still see
        // what was written this session.
        let dir = tempfile::tempdir().unwrap();
        let bogus_root = dir.path().join("not-a-dir");
        std::fs::write(&bogus_root, "x").unwrap();

        let mut store = Store::open(&bogus_root);
        store.set("streak", &42u32);
        let value: u32 = store.get("streak", 0);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_null_blob_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.json"), "null").unwrap();
        let store = Store::open(dir.path());
        let value: Option<u32> = store.get("session", Some(1));
        // Stored null means "cleared", not "use fallback blindly"
        assert_eq!(value, Some(1));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path());
        store.set("profile", &"test");

        let extras: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "profile.json")
            .collect();
        assert!(extras.is_empty(), "unexpected files: {:?}", extras);
    }
}
