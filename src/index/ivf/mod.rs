//! Inverted-file cluster index.
//!
//! Grounded on `other_examples/3662b505_Fabstir-fabstir-vectordb__src-ivf-core.rs.rs`
//! for the `ClusterId`/`Centroid`/`InvertedList` shape, adapted to this
//! core's zero-initialized, never-trained centroid policy (§9's "source"
//! behavior, kept rather than adding a k-means warm-up) and to the shared
//! `Index` trait rather than a standalone `IVFIndex` API. Concurrency
//! follows the same single readers-writer lock as [`crate::index::hnsw`].

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{IndexConfig, IvfParams};
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::index::{Index, IndexStats};
use crate::record::{SearchHit, VectorRecord};

/// Identifier of a cluster, `0..num_clusters`.
pub type ClusterId = usize;

struct Cluster {
    centroid: Vec<f64>,
    members: Vec<String>,
    embeddings: FxHashMap<String, Vec<f64>>,
}

impl Cluster {
    fn new(dimension: usize) -> Self {
        Self {
            centroid: vec![0.0; dimension],
            members: Vec::new(),
            embeddings: FxHashMap::default(),
        }
    }

    fn size(&self) -> usize {
        self.members.len()
    }
}

struct IvfState {
    clusters: Vec<Cluster>,
    assignment: FxHashMap<String, ClusterId>,
}

impl IvfState {
    fn new(num_clusters: usize, dimension: usize) -> Self {
        Self {
            clusters: (0..num_clusters).map(|_| Cluster::new(dimension)).collect(),
            assignment: FxHashMap::default(),
        }
    }

    fn len(&self) -> usize {
        self.assignment.len()
    }

    /// Nearest centroid to `embedding`; ties broken by smaller cluster id.
    fn nearest_cluster(&self, embedding: &[f64], metric: DistanceMetric) -> ClusterId {
        self.clusters
            .iter()
            .enumerate()
            .map(|(id, c)| (id, metric.distance(embedding, &c.centroid)))
            .min_by(|(ida, da), (idb, db)| da.total_cmp(db).then_with(|| ida.cmp(idb)))
            .map(|(id, _)| id)
            .expect("at least one cluster")
    }

    fn insert(&mut self, id: String, embedding: Vec<f64>, metric: DistanceMetric) {
        let cluster_id = self.nearest_cluster(&embedding, metric);
        let cluster = &mut self.clusters[cluster_id];
        let n = cluster.size() as f64;
        for (c, x) in cluster.centroid.iter_mut().zip(embedding.iter()) {
            *c = (*c * n + x) / (n + 1.0);
        }
        cluster.members.push(id.clone());
        cluster.embeddings.insert(id.clone(), embedding);
        self.assignment.insert(id, cluster_id);
    }

    /// Probes the `n_probe` nearest clusters, returns `k` closest members.
    fn search(
        &self,
        query: &[f64],
        k: usize,
        n_probe: usize,
        metric: DistanceMetric,
    ) -> Vec<(String, f64)> {
        let mut cluster_order: Vec<(ClusterId, f64)> = self
            .clusters
            .iter()
            .enumerate()
            .map(|(id, c)| (id, metric.distance(query, &c.centroid)))
            .collect();
        cluster_order.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut candidates: Vec<(String, f64)> = Vec::new();
        for &(cluster_id, _) in cluster_order.iter().take(n_probe.max(1)) {
            let cluster = &self.clusters[cluster_id];
            for (id, embedding) in &cluster.embeddings {
                candidates.push((id.clone(), metric.distance(query, embedding)));
            }
        }
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(k);
        candidates
    }
}

/// A clustered inverted-file index over fixed-dimension `f64` embeddings.
pub struct IvfIndex {
    dimension: usize,
    max_elements: usize,
    metric: DistanceMetric,
    normalize: bool,
    params: IvfParams,
    state: RwLock<IvfState>,
    closed: AtomicBool,
}

impl IvfIndex {
    /// Builds an empty index from a validated [`IndexConfig`]. Centroids
    /// start at zero; this implementation performs no k-means warm-up.
    #[must_use]
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            dimension: config.dimension,
            max_elements: config.max_elements,
            metric: config.distance_metric,
            normalize: config.normalize,
            params: config.ivf,
            state: RwLock::new(IvfState::new(config.ivf.num_clusters, config.dimension)),
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

impl Index for IvfIndex {
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
        if state.assignment.contains_key(&record.id) {
            return Err(Error::InvalidArgument(format!(
                "identifier '{}' already exists",
                record.id
            )));
        }
        state.insert(record.id.clone(), record.embedding, self.metric);
        debug!(id = %record.id, "inserted into ivf index");
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
        Ok(state
            .search(query, k, self.params.n_probe, self.metric)
            .into_iter()
            .map(|(id, distance)| SearchHit::new(id, distance))
            .collect())
    }

    fn delete(&self, _id: &str) -> Result<()> {
        self.check_open()?;
        Err(Error::Unsupported(
            "ivf delete (cluster repair) is not implemented".into(),
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
