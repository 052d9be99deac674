//! Index and storage configuration.
//!
//! Follows the teacher lineage's layering: defaults, overridden by a TOML
//! file, overridden by `VDB_*` environment variables, overridden by runtime
//! values the caller sets directly on the struct. Loading is a thin
//! convenience on top of [`figment`]; validation itself lives in
//! [`crate::factory`], since it must run identically regardless of where the
//! config came from.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;

/// Top-level index variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Hierarchical Navigable Small World graph index.
    Hnsw,
    /// Inverted-file cluster index.
    Ivf,
}

/// HNSW-specific construction/search parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswParams {
    /// Target neighbors per node per layer.
    pub m: usize,
    /// Beam width used while inserting.
    pub ef_construction: usize,
    /// Beam width used while searching.
    pub ef_search: usize,
    /// Maximum number of layers a node may occupy.
    pub max_layers: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 100,
            ef_search: 64,
            max_layers: 16,
        }
    }
}

/// IVF-specific clustering/search parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IvfParams {
    /// Number of clusters the index is partitioned into.
    pub num_clusters: usize,
    /// Soft target member count per cluster (informational only).
    pub cluster_size: usize,
    /// Number of nearest clusters probed per query.
    pub n_probe: usize,
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            num_clusters: 16,
            cluster_size: 256,
            n_probe: 1,
        }
    }
}

/// Configuration accepted by [`crate::factory::create_index`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Which index variant to build.
    pub kind: IndexKind,
    /// Vector dimension `D`. Every inserted/queried embedding must match.
    pub dimension: usize,
    /// Maximum number of elements the index will accept.
    pub max_elements: usize,
    /// Distance metric used for ranking.
    pub distance_metric: DistanceMetric,
    /// Whether embeddings are L2-normalized at insertion time.
    pub normalize: bool,
    /// HNSW parameters (ignored for `kind = Ivf`).
    pub hnsw: HnswParams,
    /// IVF parameters (ignored for `kind = Hnsw`).
    pub ivf: IvfParams,
    /// Seed for the index's random number generator (level sampling), so
    /// that tests and benchmarks can reproduce a graph exactly.
    pub seed: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::Hnsw,
            dimension: 0,
            max_elements: 0,
            distance_metric: DistanceMetric::Cosine,
            normalize: false,
            hnsw: HnswParams::default(),
            ivf: IvfParams::default(),
            seed: 0x5DEE_CE66_D1A4_B5B5,
        }
    }
}

impl IndexConfig {
    /// Loads a config by layering a TOML file (if present) and `VDB_*`
    /// environment variables over these defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but fails to parse, or an
    /// environment variable has the wrong shape for its field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VDB_INDEX_"))
            .extract()
    }
}

/// Storage backend variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Plain in-process hash map; not persisted.
    Memory,
    /// Memory-mapped append-only file, per the on-disk format.
    Mmap,
}

/// Configuration accepted by [`crate::factory::create_storage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which storage backend to build.
    pub kind: StorageKind,
    /// Directory (mmap) or label (memory) for the storage file.
    pub data_path: String,
    /// Soft cap on file growth, in bytes. Advisory; not enforced by `write`.
    pub max_file_size: u64,
    /// Page size used for mmap growth increments, in bytes.
    pub page_size: u64,
    /// Preferred batch size for bulk `write` callers. Advisory.
    pub batch_size: usize,
    /// Advisory flush interval for callers that schedule periodic flushes.
    /// This core exposes only explicit `close`/`compact` flush points.
    pub flush_interval_ms: u64,
    /// Advisory compression hint; this core does not compress payloads.
    pub compression: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            data_path: String::new(),
            max_file_size: 0,
            page_size: 4096,
            batch_size: 256,
            flush_interval_ms: 1000,
            compression: false,
        }
    }
}

impl StorageConfig {
    /// Loads a config by layering a TOML file (if present) and `VDB_*`
    /// environment variables over these defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but fails to parse, or an
    /// environment variable has the wrong shape for its field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VDB_STORAGE_"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_defaults_are_hnsw_cosine() {
        let cfg = IndexConfig::default();
        assert_eq!(cfg.kind, IndexKind::Hnsw);
        assert_eq!(cfg.distance_metric, DistanceMetric::Cosine);
        assert_eq!(cfg.hnsw.m, 16);
    }

    #[test]
    fn storage_defaults_are_memory() {
        let cfg = StorageConfig::default();
        assert_eq!(cfg.kind, StorageKind::Memory);
        assert_eq!(cfg.page_size, 4096);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let cfg = IndexConfig::load("/nonexistent/path/vdb.toml").expect("figment merge");
        assert_eq!(cfg.dimension, 0);
    }

    #[test]
    fn load_merges_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vdb.toml");
        std::fs::write(&path, "dimension = 128\nmax_elements = 1000\n").unwrap();
        let cfg = IndexConfig::load(&path).expect("figment merge");
        assert_eq!(cfg.dimension, 128);
        assert_eq!(cfg.max_elements, 1000);
    }
}
