//! A single layer of the HNSW hierarchy: per-node adjacency lists.

/// Stable index into a layer's node array, per the graph's no-owning-pointers
/// design: neighbor edges are indices, never references, so the cyclic
/// bidirectional links never need unsafe or `Rc<RefCell<_>>`.
pub type NodeId = usize;

/// One layer's adjacency lists, indexed by [`NodeId`].
#[derive(Debug, Default)]
pub struct Layer {
    neighbors: Vec<Vec<NodeId>>,
}

impl Layer {
    /// Creates a layer with capacity for `capacity` nodes, all starting with
    /// empty neighbor lists.
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); capacity],
        }
    }

    /// Grows the layer so `node_id` has a slot, if it doesn't already.
    pub(super) fn ensure_capacity(&mut self, node_id: NodeId) {
        if node_id >= self.neighbors.len() {
            self.neighbors.resize(node_id + 1, Vec::new());
        }
    }

    pub(super) fn neighbors(&self, node_id: NodeId) -> &[NodeId] {
        self.neighbors.get(node_id).map_or(&[], Vec::as_slice)
    }

    pub(super) fn set_neighbors(&mut self, node_id: NodeId, neighbors: Vec<NodeId>) {
        if node_id < self.neighbors.len() {
            self.neighbors[node_id] = neighbors;
        }
    }

    #[cfg(test)]
    pub(super) fn contains(&self, node_id: NodeId) -> bool {
        node_id < self.neighbors.len()
    }
}
