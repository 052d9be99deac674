//! Storage backends for persisting [`VectorRecord`](crate::record::VectorRecord)s.
//!
//! Two concrete variants implement the same [`Storage`] trait: [`memory`]
//! (a plain in-process map, nothing persisted) and [`mmap`] (an append-only
//! memory-mapped file with the fixed on-disk layout documented on [`mmap`]).

pub mod format;
pub mod memory;
pub mod mmap;

use crate::error::Result;
use crate::record::VectorRecord;

/// Point-in-time counters and latency moving averages for a storage handle.
///
/// Best-effort: not serialized against concurrent `write`/`delete` calls, so
/// a snapshot taken mid-batch may undercount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StorageStats {
    /// Number of live (non-tombstoned) records.
    pub total_vectors: usize,
    /// Number of tombstoned records still occupying space.
    pub tombstone_count: usize,
    /// Exponential moving average of `write` latency, in microseconds.
    pub avg_write_latency_us: f64,
    /// Exponential moving average of `read` latency, in microseconds.
    pub avg_read_latency_us: f64,
}

/// The shared capability set over in-memory and memory-mapped storage.
///
/// Mirrors the teacher's `VectorStorage` trait split (`storage/traits.rs`),
/// generalized from fixed-width `f32` vectors to the core's `VectorRecord`.
pub trait Storage: Send + Sync {
    /// Persists `records`. In the memory variant, a duplicate identifier
    /// overwrites the prior record; in the mmap variant, it is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if any record fails to write; the mmap variant
    /// aborts the remainder of the batch on the first failure.
    fn write(&self, records: &[VectorRecord]) -> Result<()>;

    /// Reads records by identifier. Missing ids are silently omitted; the
    /// result preserves the order of `ids` for the ones that are present.
    ///
    /// # Errors
    ///
    /// Returns an error only if the handle itself is closed or corrupt;
    /// per-record checksum failures are skipped, not propagated.
    fn read(&self, ids: &[String]) -> Result<Vec<VectorRecord>>;

    /// Deletes records by identifier. Space may or may not be reclaimed;
    /// use [`Storage::compact`] to reclaim it.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed.
    fn delete(&self, ids: &[String]) -> Result<()>;

    /// Reclaims space held by tombstoned records. A no-op for the memory
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails partway through.
    fn compact(&self) -> Result<()>;

    /// Returns a best-effort snapshot of storage counters.
    fn stats(&self) -> StorageStats;

    /// Flushes pending writes, unmaps, and invalidates the handle. Further
    /// calls to any other method return [`crate::error::Error::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&self) -> Result<()>;
}
