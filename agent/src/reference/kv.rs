//! Reference [`KeyValueStore`] implementations.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::contracts::{KeyValueStore, KvError};

/// Stores the single 32-bit record as four little-endian bytes in a file.
/// Mirrors the "single record at a fixed address, exactly `sizeof(int32)`
/// bytes" contract of the real key-value store, using a file in place of a
/// flash page.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileKeyValueStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn path_for(&self, key: u32) -> PathBuf {
        if key == crate::store::ACTION_ID_KEY {
            self.path.clone()
        } else {
            let mut p = self.path.clone();
            p.set_extension(format!("kv{key}"));
            p
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn read_u32(&self, key: u32) -> Result<Option<u32>, KvError> {
        let _guard = self.lock.lock().expect("kv lock poisoned");
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) if bytes.len() == 4 => {
                let mut array = [0u8; 4];
                array.copy_from_slice(&bytes);
                Ok(Some(u32::from_le_bytes(array)))
            }
            Ok(_) => Ok(None),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(KvError::Io(error.to_string())),
        }
    }

    fn write_u32(&self, key: u32, value: u32) -> Result<(), KvError> {
        let _guard = self.lock.lock().expect("kv lock poisoned");
        let path = self.path_for(key);
        std::fs::write(&path, value.to_le_bytes()).map_err(|error| KvError::Io(error.to_string()))
    }
}

/// In-process, non-persistent store for unit tests that don't need a
/// filesystem.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    records: Mutex<std::collections::HashMap<u32, u32>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn read_u32(&self, key: u32) -> Result<Option<u32>, KvError> {
        Ok(self.records.lock().expect("kv lock poisoned").get(&key).copied())
    }

    fn write_u32(&self, key: u32, value: u32) -> Result<(), KvError> {
        self.records.lock().expect("kv lock poisoned").insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action_id.bin");
        let store = FileKeyValueStore::new(&path);
        assert_eq!(store.read_u32(crate::store::ACTION_ID_KEY).unwrap(), None);
        store.write_u32(crate::store::ACTION_ID_KEY, 7).unwrap();
        assert_eq!(store.read_u32(crate::store::ACTION_ID_KEY).unwrap(), Some(7));
    }
}
