//! The shared capability set over index variants (HNSW, IVF).
//!
//! Grounded on the teacher's "one capability set, tagged variants behind it"
//! design note: callers hold a concrete handle for the index's lifetime, so
//! no virtual dispatch is needed in hot paths; the trait object only exists
//! at the factory boundary.

pub mod factory;
pub mod hnsw;
pub mod ivf;

use crate::error::Result;
use crate::record::{SearchHit, VectorRecord};

/// Point-in-time counters for an index handle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndexStats {
    /// Number of vectors currently held by the index.
    pub total_vectors: usize,
    /// Configured embedding dimension.
    pub dimension: usize,
    /// Configured maximum element count.
    pub capacity: usize,
}

/// The operation set every index variant implements.
pub trait Index: Send + Sync {
    /// Inserts a record. Rejects dimension mismatches and capacity overflow.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::DimensionMismatch`] or
    /// [`crate::error::Error::CapacityExceeded`] as appropriate.
    fn insert(&self, record: VectorRecord) -> Result<()>;

    /// Returns the `k` nearest records to `query`, ascending by distance.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatch, non-positive `k`, or an empty
    /// index.
    fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchHit>>;

    /// Deletes a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Unsupported`] (this core does not
    /// implement graph/cluster repair) or
    /// [`crate::error::Error::NotFound`] if the variant attempted a lookup
    /// first.
    fn delete(&self, id: &str) -> Result<()>;

    /// Returns a point-in-time snapshot of index counters.
    fn stats(&self) -> IndexStats;

    /// Marks the handle closed; further operations return
    /// [`crate::error::Error::Closed`].
    ///
    /// # Errors
    ///
    /// This core's index variants hold no external resources to flush, so
    /// this never actually fails, but the signature stays fallible to match
    /// the shared interface.
    fn close(&self) -> Result<()>;
}
