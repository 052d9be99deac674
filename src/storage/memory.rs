//! In-process, non-persistent storage backend.
//!
//! Grounded on the teacher's in-memory collection maps
//! (`collection/core`): a single lock-guarded hash map, no on-disk
//! representation at all. Duplicate writes overwrite, matching the
//! `write` contract's memory-variant carve-out.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::record::VectorRecord;
use crate::storage::{Storage, StorageStats};

/// An in-memory [`Storage`] backend: a map from identifier to record.
pub struct MemoryStorage {
    records: RwLock<FxHashMap<String, VectorRecord>>,
    closed: AtomicBool,
}

impl MemoryStorage {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(FxHashMap::default()),
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn write(&self, records: &[VectorRecord]) -> Result<()> {
        self.check_open()?;
        let mut map = self.records.write();
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    fn read(&self, ids: &[String]) -> Result<Vec<VectorRecord>> {
        self.check_open()?;
        let map = self.records.read();
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        self.check_open()?;
        let mut map = self.records.write();
        for id in ids {
            map.remove(id);
        }
        Ok(())
    }

    fn compact(&self) -> Result<()> {
        self.check_open()?;
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        let map = self.records.read();
        StorageStats {
            total_vectors: map.len(),
            tombstone_count: 0,
            avg_write_latency_us: 0.0,
            avg_read_latency_us: 0.0,
        }
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str) -> VectorRecord {
        VectorRecord::new(id, "docs", vec![1.0, 2.0], false, 0)
    }

    #[test]
    fn write_then_read_round_trips() {
        let storage = MemoryStorage::new();
        storage.write(&[rec("v1")]).unwrap();
        let got = storage.read(&["v1".to_string()]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "v1");
        assert_eq!(got[0].embedding, vec![1.0, 2.0]);
    }

    #[test]
    fn duplicate_write_overwrites() {
        let storage = MemoryStorage::new();
        storage.write(&[rec("v1")]).unwrap();
        let mut updated = rec("v1");
        updated.embedding = vec![9.0, 9.0];
        storage.write(&[updated]).unwrap();
        let got = storage.read(&["v1".to_string()]).unwrap();
        assert_eq!(got[0].embedding, vec![9.0, 9.0]);
        assert_eq!(storage.stats().total_vectors, 1);
    }

    #[test]
    fn delete_then_read_omits_record() {
        let storage = MemoryStorage::new();
        storage.write(&[rec("v1"), rec("v2")]).unwrap();
        storage.delete(&["v1".to_string()]).unwrap();
        let got = storage.read(&["v1".to_string(), "v2".to_string()]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "v2");
    }

    #[test]
    fn closed_handle_rejects_operations() {
        let storage = MemoryStorage::new();
        storage.write(&[rec("v1")]).unwrap();
        storage.close().unwrap();
        assert!(matches!(storage.write(&[rec("v2")]), Err(Error::Closed)));
        assert!(matches!(storage.read(&["v1".to_string()]), Err(Error::Closed)));
    }

    #[test]
    fn missing_ids_are_silently_omitted() {
        let storage = MemoryStorage::new();
        storage.write(&[rec("v1")]).unwrap();
        let got = storage.read(&["nope".to_string(), "v1".to_string()]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "v1");
    }
}
