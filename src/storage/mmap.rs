//! Memory-mapped, append-only storage for [`VectorRecord`]s.
//!
//! Grounded on the teacher's `storage/mmap.rs` — a `memmap2::MmapMut` over an
//! open file, a `parking_lot::RwLock` guarding the mapping, a
//! `rustc_hash::FxHashMap` offset index, and page-sized growth with a
//! `tracing::warn!` on every remap (the teacher's one correctness-critical
//! mutation path). Unlike the teacher's split `vectors.dat`/`.idx`/`.wal`
//! files, the on-disk layout here is the single concatenated file the format
//! mandates: header-then-payload records, back to back, no side index file —
//! the offset index is rebuilt from the mapping itself on open and on grow.
//!
//! Growth rebuilds the offset index by rescanning the file from offset zero,
//! per the stated contract, even though only the newly-opened tail is
//! actually unindexed; see `DESIGN.md` for why the full rescan is kept
//! despite being more work than strictly necessary. The same rescan rule
//! means a `delete` of a record that is not the last one written will hide
//! every later record on the next `open` — the scan stops at the first
//! zero-dimension header it meets, tombstone or not. This mirrors the format
//! precisely rather than working around it.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use memmap2::MmapMut;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::record::VectorRecord;
use crate::storage::format::{self, HEADER_LEN};
use crate::storage::{Storage, StorageStats};

#[derive(Default)]
struct Latencies {
    write_us: f64,
    read_us: f64,
}

impl Latencies {
    fn record_write(&mut self, elapsed_us: f64) {
        self.write_us = if self.write_us == 0.0 {
            elapsed_us
        } else {
            0.8 * self.write_us + 0.2 * elapsed_us
        };
    }

    fn record_read(&mut self, elapsed_us: f64) {
        self.read_us = if self.read_us == 0.0 {
            elapsed_us
        } else {
            0.8 * self.read_us + 0.2 * elapsed_us
        };
    }
}

/// Memory-mapped storage over a single append-only file in the bit-exact
/// layout documented on [`crate::storage::format`].
pub struct MmapStorage {
    path: PathBuf,
    file: RwLock<File>,
    mmap: RwLock<MmapMut>,
    index: RwLock<FxHashMap<String, usize>>,
    next_offset: AtomicUsize,
    tombstone_count: AtomicUsize,
    page_size: usize,
    writer_lock: Mutex<()>,
    latency: Mutex<Latencies>,
    closed: AtomicBool,
}

impl MmapStorage {
    /// Opens (creating if absent) the storage file at `path`, scanning it
    /// from offset zero to rebuild the in-memory offset index.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened/mapped, or if the scan
    /// finds a structurally corrupt header (non-UTF-8 identifier).
    pub fn open(path: impl AsRef<Path>, page_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let page_size = page_size.max(4096);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            file.set_len(page_size)?;
        }
        // SAFETY: `file` is open read-write and sized to a nonzero length above.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        let storage = Self {
            path,
            file: RwLock::new(file),
            mmap: RwLock::new(mmap),
            index: RwLock::new(FxHashMap::default()),
            next_offset: AtomicUsize::new(0),
            tombstone_count: AtomicUsize::new(0),
            page_size: page_size as usize,
            writer_lock: Mutex::new(()),
            latency: Mutex::new(Latencies::default()),
            closed: AtomicBool::new(false),
        };
        storage.rescan_locked(&storage.mmap.write())?;
        Ok(storage)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Rescans `mmap` from offset zero, stopping at end-of-file or the first
    /// zero-dimension header, and replaces the offset index accordingly.
    fn rescan_locked(&self, mmap: &MmapMut) -> Result<()> {
        let mut index = FxHashMap::default();
        let mut offset = 0usize;
        let mut tombstones = 0usize;
        loop {
            if offset + HEADER_LEN > mmap.len() {
                break;
            }
            let header = format::decode_header(&mmap[offset..offset + HEADER_LEN])?;
            if header.is_tombstone() {
                // An empty identifier means this slot was never written (the
                // file is zero-initialized on grow), not an actual deleted
                // record; only count real tombstones toward `stats()`.
                if !header.id.is_empty() {
                    tombstones += 1;
                }
                break;
            }
            index.insert(header.id.clone(), offset);
            offset += HEADER_LEN + header.data_len as usize;
        }
        *self.index.write() = index;
        self.next_offset.store(offset, Ordering::Release);
        self.tombstone_count.store(tombstones, Ordering::Release);
        Ok(())
    }

    /// Grows the backing file and mapping in page-sized increments until at
    /// least `required_len` bytes are addressable, then rebuilds the offset
    /// index against the freshly remapped buffer.
    fn ensure_capacity(&self, required_len: usize) -> Result<()> {
        let mut mmap = self.mmap.write();
        if mmap.len() >= required_len {
            return Ok(());
        }
        mmap.flush()?;
        let mut new_len = mmap.len() as u64;
        let page = self.page_size as u64;
        while new_len < required_len as u64 {
            new_len += page;
        }
        let file = self.file.read();
        file.set_len(new_len)?;
        // SAFETY: the file was just resized to `new_len` via `set_len` above.
        *mmap = unsafe { MmapMut::map_mut(&*file)? };
        warn!(new_len, path = %self.path.display(), "grew mmap storage file");
        drop(file);
        self.rescan_locked(&mmap)
    }

    fn write_one(&self, record: &VectorRecord) -> Result<()> {
        {
            let index = self.index.read();
            if index.contains_key(&record.id) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate identifier '{}'",
                    record.id
                )));
            }
        }
        let payload = format::encode_payload(&record.embedding);
        let header = format::encode_header(record, &payload)?;
        let record_len = HEADER_LEN + payload.len();
        let offset = self.next_offset.load(Ordering::Acquire);
        self.ensure_capacity(offset + record_len)?;
        {
            let mut mmap = self.mmap.write();
            mmap[offset..offset + HEADER_LEN].copy_from_slice(&header);
            mmap[offset + HEADER_LEN..offset + record_len].copy_from_slice(&payload);
        }
        self.index.write().insert(record.id.clone(), offset);
        self.next_offset.store(offset + record_len, Ordering::Release);
        debug!(id = %record.id, offset, "wrote record");
        Ok(())
    }

    fn read_at(&self, mmap: &MmapMut, offset: usize) -> Result<Option<VectorRecord>> {
        let header = format::decode_header(&mmap[offset..offset + HEADER_LEN])?;
        if header.is_tombstone() {
            return Ok(None);
        }
        let payload_start = offset + HEADER_LEN;
        let payload_end = payload_start + header.data_len as usize;
        let payload = &mmap[payload_start..payload_end];
        let computed = format::checksum(payload);
        if computed != header.checksum {
            return Err(Error::ChecksumMismatch(header.id.clone()));
        }
        let embedding = format::decode_payload(payload)?;
        Ok(Some(VectorRecord::new(
            header.id,
            String::new(),
            embedding,
            false,
            header.timestamp,
        )))
    }
}

impl Storage for MmapStorage {
    fn write(&self, records: &[VectorRecord]) -> Result<()> {
        self.check_open()?;
        let start = Instant::now();
        let _guard = self.writer_lock.lock();
        for record in records {
            self.write_one(record)?;
        }
        self.latency
            .lock()
            .record_write(start.elapsed().as_secs_f64() * 1e6);
        Ok(())
    }

    fn read(&self, ids: &[String]) -> Result<Vec<VectorRecord>> {
        self.check_open()?;
        let start = Instant::now();
        let index = self.index.read();
        let mmap = self.mmap.read();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(&offset) = index.get(id) else {
                continue;
            };
            match self.read_at(&mmap, offset) {
                Ok(Some(record)) => out.push(record),
                Ok(None) => {}
                Err(e) => error!(id = %id, error = %e, "skipping unreadable record"),
            }
        }
        drop(mmap);
        drop(index);
        self.latency
            .lock()
            .record_read(start.elapsed().as_secs_f64() * 1e6);
        Ok(out)
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        self.check_open()?;
        let _guard = self.writer_lock.lock();
        for id in ids {
            let offset = self.index.write().remove(id);
            if let Some(offset) = offset {
                let mut mmap = self.mmap.write();
                let header = format::decode_header(&mmap[offset..offset + HEADER_LEN])?;
                let tomb = format::tombstone_header(&header);
                mmap[offset..offset + HEADER_LEN].copy_from_slice(&tomb);
                self.tombstone_count.fetch_add(1, Ordering::AcqRel);
            }
        }
        Ok(())
    }

    fn compact(&self) -> Result<()> {
        self.check_open()?;
        let _guard = self.writer_lock.lock();
        let index = self.index.read().clone();
        let mmap = self.mmap.read();
        let mut new_buf: Vec<u8> = Vec::new();
        let mut new_index = FxHashMap::default();
        let mut ids: Vec<&String> = index.keys().collect();
        ids.sort();
        for id in ids {
            let offset = index[id];
            let header = format::decode_header(&mmap[offset..offset + HEADER_LEN])?;
            if header.is_tombstone() {
                continue;
            }
            let payload_end = offset + HEADER_LEN + header.data_len as usize;
            let new_offset = new_buf.len();
            new_buf.extend_from_slice(&mmap[offset..payload_end]);
            new_index.insert(id.clone(), new_offset);
        }
        drop(mmap);

        let padded_len = {
            let page = self.page_size as u64;
            let min_len = (new_buf.len() as u64).max(page);
            min_len.div_ceil(page) * page
        };
        let tmp_path = self.path.with_extension("compact.tmp");
        {
            let mut tmp = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            tmp.write_all(&new_buf)?;
            tmp.set_len(padded_len)?;
            tmp.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        // SAFETY: `file` was just sized to `padded_len` above.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        *self.file.write() = file;
        *self.mmap.write() = mmap;
        *self.index.write() = new_index;
        self.next_offset.store(new_buf.len(), Ordering::Release);
        self.tombstone_count.store(0, Ordering::Release);
        debug!(path = %self.path.display(), "compacted storage file");
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        let index = self.index.read();
        let lat = self.latency.lock();
        StorageStats {
            total_vectors: index.len(),
            tombstone_count: self.tombstone_count.load(Ordering::Acquire),
            avg_write_latency_us: lat.write_us,
            avg_read_latency_us: lat.read_us,
        }
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.mmap.read().flush()?;
        Ok(())
    }
}
