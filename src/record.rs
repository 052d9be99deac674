//! The canonical vector record type and search result shape.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::distance::magnitude;

/// A vector together with its identifier, metadata, and derived fields.
///
/// Once inserted into an index, a record's embedding is immutable — updates
/// are modeled as delete-then-insert by callers, never as in-place mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Identifier, unique within an index. Recommended to stay under 64
    /// bytes so it fits the on-disk header without truncation.
    pub id: String,
    /// Informational collection tag; opaque to the index/storage core.
    pub collection: String,
    /// The embedding. Its length must equal the owning index's configured `D`.
    pub embedding: Vec<f64>,
    /// Free-form metadata, opaque to the core.
    #[serde(default)]
    pub metadata: JsonValue,
    /// Optional text annotation (e.g. the chunk the embedding was derived from).
    #[serde(default)]
    pub text: Option<String>,
    /// Creation timestamp, unix milliseconds.
    pub created_at: i64,
    /// Last-update timestamp, unix milliseconds. Equal to `created_at` until
    /// a future mutable-metadata operation changes it (none exist in this core).
    pub updated_at: i64,
    /// Precomputed Euclidean norm of `embedding`.
    pub magnitude: f64,
    /// Whether `embedding` was L2-normalized before storage.
    #[serde(default)]
    pub normalized: bool,
}

impl VectorRecord {
    /// Builds a record, computing `magnitude` from the given embedding.
    ///
    /// `normalize` controls whether the embedding is L2-normalized in place
    /// before the magnitude is derived, mirroring an index's `normalize` config.
    #[must_use]
    pub fn new(id: impl Into<String>, collection: impl Into<String>, embedding: Vec<f64>, normalize: bool, now_millis: i64) -> Self {
        let embedding = if normalize {
            crate::distance::normalize(&embedding)
        } else {
            embedding
        };
        let mag = magnitude(&embedding);
        Self {
            id: id.into(),
            collection: collection.into(),
            embedding,
            metadata: JsonValue::Null,
            text: None,
            created_at: now_millis,
            updated_at: now_millis,
            magnitude: mag,
            normalized: normalize,
        }
    }

    /// Attaches metadata, returning `self` for chained construction.
    #[must_use]
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches a text annotation, returning `self` for chained construction.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Returns the embedding's dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// L2-normalizes `embedding` in place and recomputes `magnitude`, marking
    /// the record as normalized. A no-op (beyond re-deriving `magnitude`) if
    /// the embedding is already unit length. Used by an index whose config
    /// sets `normalize = true`, so normalization is honored at insertion
    /// time regardless of how the caller built the record.
    pub fn normalize(&mut self) {
        self.embedding = crate::distance::normalize(&self.embedding);
        self.magnitude = magnitude(&self.embedding);
        self.normalized = true;
    }
}

/// A single ranked result from `Index::search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Identifier of the matching record.
    pub id: String,
    /// Metric-space distance (smaller is nearer, per [`crate::distance::DistanceMetric`]).
    pub distance: f64,
    /// Monotone-decreasing score derived from distance: `1 / (1 + distance)`, in `(0, 1]`.
    pub score: f64,
}

impl SearchHit {
    /// Builds a hit, deriving `score` from `distance`.
    #[must_use]
    pub fn new(id: impl Into<String>, distance: f64) -> Self {
        Self {
            id: id.into(),
            score: 1.0 / (1.0 + distance),
            distance,
        }
    }
}
