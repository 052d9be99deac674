//! Hierarchical Navigable Small World index.
//!
//! `HnswIndex` is the public handle: configuration plus one
//! `parking_lot::RwLock<GraphState>`, matching the component's own
//! concurrency note (a single reader/writer lock, fine-grained per-field
//! locking left for later). The algorithm itself lives in [`graph`].

mod graph;
mod layer;
mod ordered_float;

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::config::{HnswParams, IndexConfig};
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::index::{Index, IndexStats};
use crate::record::{SearchHit, VectorRecord};
use graph::GraphState;

/// A layered-proximity-graph index over fixed-dimension `f64` embeddings.
pub struct HnswIndex {
    dimension: usize,
    max_elements: usize,
    metric: DistanceMetric,
    normalize: bool,
    params: HnswParams,
    state: RwLock<GraphState>,
    closed: AtomicBool,
}

impl HnswIndex {
    /// Builds an empty index from a validated [`IndexConfig`].
    #[must_use]
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            dimension: config.dimension,
            max_elements: config.max_elements,
            metric: config.distance_metric,
            normalize: config.normalize,
            params: config.hnsw,
            state: RwLock::new(GraphState::new(config.seed)),
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

impl Index for HnswIndex {
    fn insert(&self, mut record: VectorRecord) -> Result<()> {
        self.check_open()?;
        if record.dimension() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: record.dimension(),
            });
        }
        if self.normalize {
            record.normalize();
        }
        let mut state = self.state.write();
        if state.len() >= self.max_elements {
            return Err(Error::CapacityExceeded {
                max: self.max_elements,
            });
        }
        if state.contains_id(&record.id) {
            return Err(Error::InvalidArgument(format!(
                "identifier '{}' already exists",
                record.id
            )));
        }
        state.insert(
            record.id.clone(),
            record.embedding,
            self.metric,
            self.params.m,
            self.params.ef_construction,
            self.params.max_layers,
        );
        debug!(id = %record.id, "inserted into hnsw index");
        Ok(())
    }

    fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchHit>> {
        self.check_open()?;
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Err(Error::InvalidArgument("k must be positive".into()));
        }
        let state = self.state.read();
        if state.len() == 0 {
            return Err(Error::EmptyIndex);
        }
        let ef = self.params.ef_search.max(k);
        let results = state.search(query, ef, self.metric);
        Ok(results
            .into_iter()
            .take(k)
            .map(|(node, distance)| SearchHit::new(state.node_id_of(node), distance))
            .collect())
    }

    fn delete(&self, _id: &str) -> Result<()> {
        self.check_open()?;
        Err(Error::Unsupported(
            "hnsw delete (graph repair) is not implemented".into(),
        ))
    }

    fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            total_vectors: state.len(),
            dimension: self.dimension,
            capacity: self.max_elements,
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
    use crate::config::IndexKind;

    fn config(dimension: usize, max_elements: usize) -> IndexConfig {
        IndexConfig {
            kind: IndexKind::Hnsw,
            dimension,
            max_elements,
            distance_metric: DistanceMetric::Cosine,
            normalize: true,
            hnsw: HnswParams {
                m: 4,
                ef_construction: 50,
                ef_search: 50,
                max_layers: 4,
            },
            ..IndexConfig::default()
        }
    }

    fn rec(id: &str, embedding: Vec<f64>) -> VectorRecord {
        VectorRecord::new(id, "docs", embedding, true, 0)
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let index = HnswIndex::new(&config(4, 10));
        let err = index.insert(rec("v1", vec![1.0, 0.0])).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn capacity_exceeded_is_rejected() {
        let index = HnswIndex::new(&config(2, 1));
        index.insert(rec("v1", vec![1.0, 0.0])).unwrap();
        let err = index.insert(rec("v2", vec![0.0, 1.0])).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
    }

    #[test]
    fn search_on_empty_index_is_rejected() {
        let index = HnswIndex::new(&config(4, 10));
        let err = index.search(&[1.0, 0.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, Error::EmptyIndex));
    }

    #[test]
    fn search_self_hit_within_tolerance() {
        let index = HnswIndex::new(&config(4, 10));
        index.insert(rec("v1", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(rec("v2", vec![0.0, 1.0, 0.0, 0.0])).unwrap();
        let hits = index.search(&[1.0, 0.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].id, "v1");
        assert!(hits[0].distance < 1e-9);
    }

    #[test]
    fn scenario_s1_four_orthonormal_vectors() {
        let index = HnswIndex::new(&config(4, 10));
        index.insert(rec("v1", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(rec("v2", vec![0.0, 1.0, 0.0, 0.0])).unwrap();
        index.insert(rec("v3", vec![0.0, 0.0, 1.0, 0.0])).unwrap();
        index.insert(rec("v4", vec![0.0, 0.0, 0.0, 1.0])).unwrap();
        let hits = index.search(&[1.0, 0.1, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "v1");
    }

    #[test]
    fn delete_is_unsupported() {
        let index = HnswIndex::new(&config(4, 10));
        index.insert(rec("v1", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        assert!(matches!(index.delete("v1"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn closed_handle_rejects_operations() {
        let index = HnswIndex::new(&config(4, 10));
        index.close().unwrap();
        assert!(matches!(
            index.insert(rec("v1", vec![1.0, 0.0, 0.0, 0.0])),
            Err(Error::Closed)
        ));
    }

    #[test]
    fn config_normalize_true_normalizes_un_normalized_embedding_at_insert() {
        let index = HnswIndex::new(&config(4, 10));
        let un_normalized = VectorRecord::new("v1", "docs", vec![3.0, 4.0, 0.0, 0.0], false, 0);
        assert!(!un_normalized.normalized);
        index.insert(un_normalized).unwrap();
        let hits = index.search(&[3.0, 4.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].id, "v1");
        assert!(hits[0].distance < 1e-9);
    }

    #[test]
    fn config_normalize_false_leaves_embedding_unchanged() {
        let mut cfg = config(2, 10);
        cfg.normalize = false;
        cfg.distance_metric = DistanceMetric::Euclidean;
        let index = HnswIndex::new(&cfg);
        index
            .insert(VectorRecord::new("v1", "docs", vec![3.0, 4.0], false, 0))
            .unwrap();
        let hits = index.search(&[3.0, 4.0], 1).unwrap();
        assert!(hits[0].distance < 1e-9);
        let far = index.search(&[0.6, 0.8], 1).unwrap();
        assert!(far[0].distance > 1e-6);
    }
}
