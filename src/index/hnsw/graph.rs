//! The layered proximity graph: level sampling, insertion, and `search_layer`.
//!
//! Grounded on the teacher's `index/hnsw/native/graph.rs` (`NativeHnsw`):
//! stable `NodeId` indices rather than owning pointers, a min-heap of
//! candidates plus a bounded max-heap of results in `search_layer`, and
//! descend-then-expand insertion. Two deliberate departures from the
//! teacher, both spec-mandated: level sampling is the plain Bernoulli(0.5)
//! trial (not the teacher's `-ln(U) * level_mult` shortcut, though the two
//! are equivalent up to the capping rule), and neighbor pruning removes only
//! the single furthest edge rather than the teacher's VAMANA/alpha
//! diversification — the simpler heuristic the source explicitly allows.
//! The whole graph lives behind one lock at the [`super::HnswIndex`] level,
//! not the teacher's per-field `vectors`/`layers`/`entry_point` locks, per
//! the "single readers-writer lock, fine-grained locking out of scope"
//! concurrency note.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use super::layer::{Layer, NodeId};
use super::ordered_float::OrderedFloat;
use crate::distance::DistanceMetric;

pub(super) struct Node {
    pub(super) id: String,
    pub(super) embedding: Vec<f64>,
}

/// All mutable graph state, owned behind a single lock by `HnswIndex`.
pub(super) struct GraphState {
    pub(super) nodes: Vec<Node>,
    pub(super) layers: Vec<Layer>,
    pub(super) node_levels: Vec<usize>,
    pub(super) id_to_node: FxHashMap<String, NodeId>,
    pub(super) entry_point: Option<NodeId>,
    pub(super) max_layer: usize,
    rng: ChaCha8Rng,
}

impl GraphState {
    pub(super) fn new(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            layers: vec![Layer::new(0)],
            node_levels: Vec::new(),
            id_to_node: FxHashMap::default(),
            entry_point: None,
            max_layer: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) fn contains_id(&self, id: &str) -> bool {
        self.id_to_node.contains_key(id)
    }

    pub(super) fn node_id_of(&self, node: NodeId) -> &str {
        &self.nodes[node].id
    }

    /// Samples a level via repeated Bernoulli(0.5) trials, capped at
    /// `max_layers - 1`: start at 0, keep incrementing while the coin lands
    /// heads.
    fn random_level(&mut self, max_layers: usize) -> usize {
        let mut level = 0;
        while level + 1 < max_layers && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    /// Inserts `embedding` under `id`, returning its assigned `NodeId`.
    ///
    /// Caller guarantees `id` is not already present.
    pub(super) fn insert(
        &mut self,
        id: String,
        embedding: Vec<f64>,
        metric: DistanceMetric,
        m: usize,
        ef_construction: usize,
        max_layers: usize,
    ) -> NodeId {
        let node_id = self.nodes.len();
        let level = self.random_level(max_layers);
        self.id_to_node.insert(id.clone(), node_id);
        self.nodes.push(Node { id, embedding });
        self.node_levels.push(level);

        while self.layers.len() <= level {
            self.layers.push(Layer::new(0));
        }
        for layer in &mut self.layers {
            layer.ensure_capacity(node_id);
        }

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(node_id);
            self.max_layer = level;
            return node_id;
        };

        let old_max_layer = self.max_layer;
        let query = self.nodes[node_id].embedding.clone();
        let mut current = entry;
        for l in (level + 1..=old_max_layer).rev() {
            current = self.search_layer_single(&query, current, l, metric);
        }

        for l in (0..=level.min(old_max_layer)).rev() {
            let candidates = self.search_layer(&query, vec![current], ef_construction, l, metric);
            let selected = select_neighbors(&candidates, m);
            self.layers[l].set_neighbors(node_id, selected.clone());
            for &neighbor in &selected {
                self.add_bidirectional_connection(node_id, neighbor, l, m, metric);
            }
            if let Some(&(best, _)) = candidates.first() {
                current = best;
            }
        }

        if level > old_max_layer {
            self.max_layer = level;
            self.entry_point = Some(node_id);
        }

        node_id
    }

    /// Top-level search: descend with beam 1 to layer 1, then `search_layer`
    /// at layer 0 with the configured `ef_search`.
    pub(super) fn search(
        &self,
        query: &[f64],
        ef_search: usize,
        metric: DistanceMetric,
    ) -> Vec<(NodeId, f64)> {
        let Some(entry) = self.entry_point else {
            return Vec::new();
        };
        let mut current = entry;
        for l in (1..=self.max_layer).rev() {
            current = self.search_layer_single(query, current, l, metric);
        }
        self.search_layer(query, vec![current], ef_search, 0, metric)
    }

    fn search_layer_single(
        &self,
        query: &[f64],
        entry: NodeId,
        layer: usize,
        metric: DistanceMetric,
    ) -> NodeId {
        let mut best = entry;
        let mut best_dist = metric.distance(query, &self.nodes[entry].embedding);
        loop {
            let mut improved = false;
            for &neighbor in self.layers[layer].neighbors(best) {
                let d = metric.distance(query, &self.nodes[neighbor].embedding);
                if d < best_dist {
                    best = neighbor;
                    best_dist = d;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        best
    }

    /// Beam search at a single layer: min-heap of candidates to expand,
    /// bounded max-heap of the current top-`ef` results. Returns results
    /// sorted ascending by distance, ties broken by smaller node index.
    fn search_layer(
        &self,
        query: &[f64],
        entry_points: Vec<NodeId>,
        ef: usize,
        layer: usize,
        metric: DistanceMetric,
    ) -> Vec<(NodeId, f64)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, NodeId)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, NodeId)> = BinaryHeap::new();

        for ep in entry_points {
            let d = metric.distance(query, &self.nodes[ep].embedding);
            candidates.push(Reverse((OrderedFloat(d), ep)));
            results.push((OrderedFloat(d), ep));
            visited.insert(ep);
        }

        while let Some(Reverse((OrderedFloat(c_dist), c_node))) = candidates.pop() {
            let furthest = results.peek().map_or(f64::INFINITY, |r| r.0 .0);
            if c_dist > furthest && results.len() >= ef {
                break;
            }
            for &neighbor in self.layers[layer].neighbors(c_node) {
                if visited.insert(neighbor) {
                    let d = metric.distance(query, &self.nodes[neighbor].embedding);
                    let furthest = results.peek().map_or(f64::INFINITY, |r| r.0 .0);
                    if d < furthest || results.len() < ef {
                        candidates.push(Reverse((OrderedFloat(d), neighbor)));
                        results.push((OrderedFloat(d), neighbor));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        let mut out: Vec<(NodeId, f64)> = results.into_iter().map(|(d, n)| (n, d.0)).collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Connects `neighbor` to `new_node`, pruning the single furthest edge
    /// (distance from `neighbor`'s own embedding) if the list now exceeds `m`.
    fn add_bidirectional_connection(
        &mut self,
        new_node: NodeId,
        neighbor: NodeId,
        layer: usize,
        m: usize,
        metric: DistanceMetric,
    ) {
        let mut neighbors = self.layers[layer].neighbors(neighbor).to_vec();
        if !neighbors.contains(&new_node) {
            neighbors.push(new_node);
        }
        if neighbors.len() > m {
            let neighbor_embedding = &self.nodes[neighbor].embedding;
            if let Some((idx, _)) = neighbors
                .iter()
                .enumerate()
                .map(|(i, &n)| (i, metric.distance(neighbor_embedding, &self.nodes[n].embedding)))
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            {
                neighbors.remove(idx);
            }
        }
        self.layers[layer].set_neighbors(neighbor, neighbors);
    }
}

/// Selects up to `m` neighbors from an ascending-distance candidate pool:
/// the `m` closest.
fn select_neighbors(candidates: &[(NodeId, f64)], m: usize) -> Vec<NodeId> {
    candidates.iter().take(m).map(|&(id, _)| id).collect()
}
