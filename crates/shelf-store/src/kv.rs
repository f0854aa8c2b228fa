//! Key-value backend with versioned writes and automatic serialization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use crate::StoreError;

/// Write precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Write unconditionally.
    Any,
    /// Only write if the key does not exist yet.
    Absent,
    /// Only write if the stored version still matches.
    Version(u64),
}

/// Raw stored value with its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub version: u64,
    pub bytes: Vec<u8>,
}

/// Single-row atomic key-value storage.
///
/// Every successful write bumps the row's version, so callers can do
/// read-modify-write with [`Expect::Version`] and retry on conflict.
pub trait KvBackend: Send + Sync {
    /// Read a row.
    fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Write a row if `expect` holds. Returns the new version.
    ///
    /// Fails with [`StoreError::ConcurrentModification`] when the
    /// precondition does not hold.
    fn put(&self, key: &str, bytes: Vec<u8>, expect: Expect) -> Result<u64, StoreError>;

    /// Delete a row if `expect` holds. Returns whether a row was removed.
    fn delete(&self, key: &str, expect: Expect) -> Result<bool, StoreError>;

    /// All keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// JSON helpers available on every backend.
pub trait KvJson: KvBackend {
    /// Read and deserialize a row.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, u64)>, StoreError> {
        match self.get(key)? {
            Some(v) => Ok(Some((serde_json::from_slice(&v.bytes)?, v.version))),
            None => Ok(None),
        }
    }

    /// Serialize and write a row.
    fn put_json<T: Serialize>(&self, key: &str, value: &T, expect: Expect) -> Result<u64, StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.put(key, bytes, expect)
    }

    /// Read every row under a prefix, in key order.
    ///
    /// Rows deleted between listing and reading are skipped.
    fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StoreError> {
        let mut rows = Vec::new();
        for key in self.keys_with_prefix(prefix)? {
            if let Some((value, _)) = self.get_json(&key)? {
                rows.push(value);
            }
        }
        Ok(rows)
    }

    /// Delete every row under a prefix. Returns how many were removed.
    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in self.keys_with_prefix(prefix)? {
            if self.delete(&key, Expect::Any)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<K: KvBackend + ?Sized> KvJson for K {}

#[derive(Debug, Default)]
struct Rows {
    next_version: u64,
    entries: BTreeMap<String, Versioned>,
}

impl Rows {
    fn check(&self, key: &str, expect: Expect) -> Result<(), StoreError> {
        let current = self.entries.get(key).map(|v| v.version);
        let ok = match (expect, current) {
            (Expect::Any, _) => true,
            (Expect::Absent, None) => true,
            (Expect::Version(want), Some(have)) => want == have,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::ConcurrentModification(key.to_string()))
        }
    }
}

/// In-process backend, optionally persisted as a JSON snapshot file.
#[derive(Debug, Default)]
pub struct MemoryKv {
    rows: Mutex<Rows>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryKv {
    /// An empty, unpersisted backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a snapshot file, or start empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut rows = Rows::default();

        if path.exists() {
            let content = std::fs::read(&path)?;
            let snapshot: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&content)?;
            for (key, value) in snapshot {
                rows.next_version += 1;
                let entry = Versioned {
                    version: rows.next_version,
                    bytes: serde_json::to_vec(&value)?,
                };
                rows.entries.insert(key, entry);
            }
        }

        Ok(Self {
            rows: Mutex::new(rows),
            snapshot_path: Some(path),
        })
    }

    /// Write the snapshot back to the file it was opened from.
    ///
    /// No-op for unpersisted backends.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot: BTreeMap<String, serde_json::Value> = {
            let rows = self.lock()?;
            rows.entries
                .iter()
                .map(|(k, v)| -> Result<(String, serde_json::Value), StoreError> {
                    Ok((k.clone(), serde_json::from_slice(&v.bytes)?))
                })
                .collect::<Result<_, _>>()?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.lock().map(|r| r.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Rows>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: Vec<u8>, expect: Expect) -> Result<u64, StoreError> {
        let mut rows = self.lock()?;
        rows.check(key, expect)?;
        rows.next_version += 1;
        let version = rows.next_version;
        rows.entries.insert(key.to_string(), Versioned { version, bytes });
        Ok(version)
    }

    fn delete(&self, key: &str, expect: Expect) -> Result<bool, StoreError> {
        let mut rows = self.lock()?;
        if expect != Expect::Any {
            rows.check(key, expect)?;
        }
        Ok(rows.entries.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let rows = self.lock()?;
        Ok(rows
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// Helper to build store keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = store_key!("variant", slot_id, variant_id);
/// // Returns "variant:slot-1:var-abc"
/// ```
#[macro_export]
macro_rules! store_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let kv = MemoryKv::new();
        kv.put_json("slot:a", &serde_json::json!({"n": 1}), Expect::Any).unwrap();
        let (value, _): (serde_json::Value, u64) = kv.get_json("slot:a").unwrap().unwrap();
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_absent_precondition() {
        let kv = MemoryKv::new();
        kv.put("k", b"1".to_vec(), Expect::Absent).unwrap();
        let err = kv.put("k", b"2".to_vec(), Expect::Absent).unwrap_err();
        assert!(matches!(err, StoreError::ConcurrentModification(_)));
    }

    #[test]
    fn test_version_precondition() {
        let kv = MemoryKv::new();
        let v1 = kv.put("k", b"1".to_vec(), Expect::Any).unwrap();
        let v2 = kv.put("k", b"2".to_vec(), Expect::Version(v1)).unwrap();
        assert!(v2 > v1);

        // Stale writer loses
        assert!(kv.put("k", b"3".to_vec(), Expect::Version(v1)).is_err());
        assert_eq!(kv.get("k").unwrap().unwrap().bytes, b"2".to_vec());
    }

    #[test]
    fn test_prefix_scan_is_ordered_and_bounded() {
        let kv = MemoryKv::new();
        for key in ["pool:s1:b", "pool:s1:a", "pool:s10:a", "slot:s1"] {
            kv.put(key, b"{}".to_vec(), Expect::Any).unwrap();
        }
        assert_eq!(kv.keys_with_prefix("pool:s1:").unwrap(), vec!["pool:s1:a", "pool:s1:b"]);
    }

    #[test]
    fn test_delete_with_stale_version_fails() {
        let kv = MemoryKv::new();
        let v1 = kv.put("k", b"1".to_vec(), Expect::Any).unwrap();
        kv.put("k", b"2".to_vec(), Expect::Any).unwrap();
        assert!(kv.delete("k", Expect::Version(v1)).is_err());
        assert!(kv.delete("k", Expect::Any).unwrap());
        assert!(!kv.delete("k", Expect::Any).unwrap());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = std::env::temp_dir().join(format!("shelf-kv-{}", std::process::id()));
        let path = dir.join("store.json");
        let _ = std::fs::remove_file(&path);

        let kv = MemoryKv::open(&path).unwrap();
        assert!(kv.is_empty());
        kv.put_json("slot:a", &serde_json::json!({"name": "A"}), Expect::Any).unwrap();
        kv.save().unwrap();

        let reopened = MemoryKv::open(&path).unwrap();
        let (value, _): (serde_json::Value, u64) = reopened.get_json("slot:a").unwrap().unwrap();
        assert_eq!(value["name"], "A");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_store_key_macro() {
        assert_eq!(store_key!("variant", "slot-1", "var-a"), "variant:slot-1:var-a");
    }
}
