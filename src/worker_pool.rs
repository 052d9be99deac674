//! Data-parallel fan-out for batch distance/search operations.
//!
//! Grounded on the teacher's `rayon`-based batch operations
//! (`index/hnsw/index/batch.rs`): one rayon call per batch, queries/vectors
//! processed independently, results collected back into input order. The
//! difference here is that the partitioning is explicit rather than left to
//! `par_iter`'s default chunking, so the "contiguous `⌈n/workers⌉`-sized
//! ranges" contract is testable rather than an accident of the scheduler.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::distance::{cosine_similarity, dot, euclidean_distance, normalize};
use crate::record::SearchHit;

/// A bounded pool of worker threads for batch vector operations.
///
/// Batches smaller than `2 * worker_count` run on the calling thread; larger
/// batches are split into `worker_count` contiguous chunks and run on the
/// internal `rayon` pool, one task per chunk.
pub struct WorkerPool {
    pool: ThreadPool,
    worker_count: usize,
}

impl WorkerPool {
    /// Builds a pool with exactly `worker_count` threads.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero or the underlying thread pool fails
    /// to spawn (out of OS resources).
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be positive");
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .expect("failed to build worker thread pool");
        Self { pool, worker_count }
    }

    /// Number of worker threads backing this pool.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs `f` over every item of `items`, either sequentially or fanned out
    /// across contiguous chunks, per the `2 * worker_count` threshold.
    fn dispatch<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let n = items.len();
        if n < 2 * self.worker_count {
            return items.iter().map(&f).collect();
        }

        let chunk_size = n.div_ceil(self.worker_count);
        self.pool.install(|| {
            use rayon::prelude::*;
            items
                .par_chunks(chunk_size)
                .flat_map_iter(|chunk| chunk.iter().map(&f))
                .collect()
        })
    }

    /// Pairwise dot product of `a[i]` with `b[i]`, in input order.
    #[must_use]
    pub fn parallel_dot(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<f64> {
        let pairs: Vec<(&Vec<f64>, &Vec<f64>)> = a.iter().zip(b.iter()).collect();
        self.dispatch(&pairs, |(x, y)| dot(x, y))
    }

    /// Pairwise cosine similarity of `a[i]` with `b[i]`, in input order.
    #[must_use]
    pub fn parallel_cosine(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<f64> {
        let pairs: Vec<(&Vec<f64>, &Vec<f64>)> = a.iter().zip(b.iter()).collect();
        self.dispatch(&pairs, |(x, y)| cosine_similarity(x, y))
    }

    /// Pairwise Euclidean distance of `a[i]` with `b[i]`, in input order.
    #[must_use]
    pub fn parallel_euclidean(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<f64> {
        let pairs: Vec<(&Vec<f64>, &Vec<f64>)> = a.iter().zip(b.iter()).collect();
        self.dispatch(&pairs, |(x, y)| euclidean_distance(x, y))
    }

    /// L2-normalizes every vector in `v`, in input order.
    #[must_use]
    pub fn parallel_normalize(&self, v: &[Vec<f64>]) -> Vec<Vec<f64>> {
        self.dispatch(v, |x| normalize(x))
    }

    /// Brute-force top-`k` search of `query` against `vectors`, ranked by
    /// ascending distance. The identifier of each hit is its index into
    /// `vectors`; ties on distance break toward the smaller index.
    #[must_use]
    pub fn parallel_search(&self, query: &[f64], vectors: &[Vec<f64>], k: usize) -> Vec<SearchHit> {
        let distances = self.dispatch(vectors, |v| euclidean_distance(query, v));
        let mut hits: Vec<SearchHit> = distances
            .into_iter()
            .enumerate()
            .map(|(i, d)| SearchHit::new(i.to_string(), d))
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let ia: usize = a.id.parse().unwrap_or(usize::MAX);
                    let ib: usize = b.id.parse().unwrap_or(usize::MAX);
                    ia.cmp(&ib)
                })
        });
        hits.truncate(k);
        hits
    }
}
