//! Validated construction of index and storage handles from configuration.
//!
//! Grounded on the same validate-before-allocate discipline the index
//! constructors already apply to a single record (`HnswIndex::insert`,
//! `IvfIndex::insert`): here the same checks run once, against the whole
//! configuration, before any graph/cluster/storage state is allocated.

use std::path::Path;

use crate::config::{IndexConfig, IndexKind, StorageConfig, StorageKind};
use crate::error::{Error, Result};
use crate::index::hnsw::HnswIndex;
use crate::index::ivf::IvfIndex;
use crate::index::Index;
use crate::storage::memory::MemoryStorage;
use crate::storage::mmap::MmapStorage;
use crate::storage::Storage;

/// Validates `config` and builds the index variant it names.
///
/// # Errors
///
/// Returns [`Error::Config`] if `dimension` or `max_elements` is zero, or if
/// the selected variant's own parameters (HNSW's `m`/`ef_construction`/
/// `ef_search`/`max_layers`, IVF's `num_clusters`/`cluster_size`) are not
/// all positive.
pub fn create_index(config: &IndexConfig) -> Result<Box<dyn Index>> {
    if config.dimension == 0 {
        return Err(Error::Config("dimension must be positive".into()));
    }
    if config.max_elements == 0 {
        return Err(Error::Config("max_elements must be positive".into()));
    }
    match config.kind {
        IndexKind::Hnsw => {
            let p = config.hnsw;
            if p.m == 0 || p.ef_construction == 0 || p.ef_search == 0 || p.max_layers == 0 {
                return Err(Error::Config(
                    "hnsw parameters (m, ef_construction, ef_search, max_layers) must all be positive".into(),
                ));
            }
            Ok(Box::new(HnswIndex::new(config)))
        }
        IndexKind::Ivf => {
            let p = config.ivf;
            if p.num_clusters == 0 || p.cluster_size == 0 {
                return Err(Error::Config(
                    "ivf parameters (num_clusters, cluster_size) must all be positive".into(),
                ));
            }
            Ok(Box::new(IvfIndex::new(config)))
        }
    }
}

/// Validates `config` and builds the storage backend it names.
///
/// # Errors
///
/// Returns [`Error::Config`] if `kind` is [`StorageKind::Mmap`] and
/// `data_path` is empty, or if the underlying file cannot be opened/mapped.
pub fn create_storage(config: &StorageConfig) -> Result<Box<dyn Storage>> {
    match config.kind {
        StorageKind::Memory => Ok(Box::new(MemoryStorage::new())),
        StorageKind::Mmap => {
            if config.data_path.is_empty() {
                return Err(Error::Config(
                    "data_path must be set for mmap storage".into(),
                ));
            }
            if config.page_size == 0 {
                return Err(Error::Config("page_size must be positive".into()));
            }
            let storage = MmapStorage::open(Path::new(&config.data_path), config.page_size)?;
            Ok(Box::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HnswParams, IvfParams};

    #[test]
    fn zero_dimension_is_rejected() {
        let config = IndexConfig {
            dimension: 0,
            max_elements: 10,
            ..IndexConfig::default()
        };
        assert!(matches!(create_index(&config), Err(Error::Config(_))));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = IndexConfig {
            dimension: 4,
            max_elements: 0,
            ..IndexConfig::default()
        };
        assert!(matches!(create_index(&config), Err(Error::Config(_))));
    }

    #[test]
    fn hnsw_zero_m_is_rejected() {
        let config = IndexConfig {
            dimension: 4,
            max_elements: 10,
            hnsw: HnswParams { m: 0, ..HnswParams::default() },
            ..IndexConfig::default()
        };
        assert!(matches!(create_index(&config), Err(Error::Config(_))));
    }

    #[test]
    fn ivf_zero_clusters_is_rejected() {
        let config = IndexConfig {
            kind: IndexKind::Ivf,
            dimension: 4,
            max_elements: 10,
            ivf: IvfParams { num_clusters: 0, ..IvfParams::default() },
            ..IndexConfig::default()
        };
        assert!(matches!(create_index(&config), Err(Error::Config(_))));
    }

    #[test]
    fn valid_hnsw_config_builds() {
        let config = IndexConfig {
            dimension: 4,
            max_elements: 10,
            ..IndexConfig::default()
        };
        assert!(create_index(&config).is_ok());
    }

    #[test]
    fn valid_ivf_config_builds() {
        let config = IndexConfig {
            kind: IndexKind::Ivf,
            dimension: 4,
            max_elements: 10,
            ..IndexConfig::default()
        };
        assert!(create_index(&config).is_ok());
    }

    #[test]
    fn memory_storage_always_builds() {
        let config = StorageConfig::default();
        assert!(create_storage(&config).is_ok());
    }

    #[test]
    fn mmap_storage_requires_data_path() {
        let config = StorageConfig {
            kind: StorageKind::Mmap,
            data_path: String::new(),
            ..StorageConfig::default()
        };
        assert!(matches!(create_storage(&config), Err(Error::Config(_))));
    }

    #[test]
    fn mmap_storage_builds_with_valid_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            kind: StorageKind::Mmap,
            data_path: dir.path().join("vectors.vdb").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        assert!(create_storage(&config).is_ok());
    }
}
