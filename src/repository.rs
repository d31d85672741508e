//! The in-memory `Repository`: the live graph.
//!
//! Nodes are indexed by id (O(1) average lookup) and by type (insertion
//! order preserved within a type bucket). Edges are indexed by source,
//! target, and type, and de-duplicated on the `(source, target,
//! edge_type)` triple.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{Result, StorageError};
use crate::graph::decorator::NodeHandle;
use crate::graph::edge::GraphEdge;
use crate::graph::node::GraphNode;

/// A read-only, stable view of a repository at a point in time.
///
/// Implemented as a frozen clone rather than copy-on-write: the node/edge
/// counts in this system are small enough (tens of thousands, not
/// billions) that a full clone behind the returned value is cheaper to
/// reason about than a COW scheme, while still satisfying "stable
/// iteration while writers continue" — a writer's subsequent mutations
/// land on the live repository, never on an already-taken snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl Snapshot {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }
}

/// The live graph: all nodes (indexed by id and by type), all edges
/// (indexed by source, by target, by type). Carries a logical revision
/// counter incremented on every write.
pub struct Repository {
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    type_index: HashMap<&'static str, Vec<usize>>,

    edges: Vec<GraphEdge>,
    edge_keys: HashSet<(String, String, String)>,
    edges_from_index: HashMap<String, Vec<usize>>,
    edges_to_index: HashMap<String, Vec<usize>>,
    edges_type_index: HashMap<String, Vec<usize>>,

    revision: u64,
}

impl Repository {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            type_index: HashMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
            edges_from_index: HashMap::new(),
            edges_to_index: HashMap::new(),
            edges_type_index: HashMap::new(),
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // === NODE OPERATIONS ===

    /// Insert a node. Fails with `AlreadyExists` if the id is already
    /// present (invariant 1: a node id appears at most once).
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        if self.node_index.contains_key(node.id()) {
            warn!(id = node.id(), "add_node: id already exists");
            return Err(StorageError::AlreadyExists(node.id().to_string()).into());
        }
        let idx = self.nodes.len();
        self.node_index.insert(node.id().to_string(), idx);
        self.type_index
            .entry(node.node_type())
            .or_default()
            .push(idx);
        debug!(id = node.id(), node_type = node.node_type(), "add_node");
        self.nodes.push(node);
        self.revision += 1;
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Mutable access to a node without touching the revision counter.
    /// Callers (`NodeHandle`) bump the counter themselves via
    /// `bump_revision`, and only when a write actually changed something —
    /// the scheduler's convergence check depends on the counter tracking
    /// real changes, not mere touches.
    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        let idx = *self.node_index.get(id)?;
        Some(&mut self.nodes[idx])
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    /// Acquire a scoped mutation handle for a node. The handle does not
    /// outlive the borrow of `self`.
    pub fn node_handle(&mut self, id: &str) -> Option<NodeHandle<'_>> {
        if !self.node_index.contains_key(id) {
            return None;
        }
        Some(NodeHandle::new(self, id.to_string()))
    }

    /// Nodes of a given type, in insertion order within that type bucket.
    pub fn nodes_of_type(&self, node_type: &str) -> impl Iterator<Item = &GraphNode> {
        self.type_index
            .get(node_type)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.nodes[idx])
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // === EDGE OPERATIONS ===

    /// Idempotent on the `(source, target, edge_type)` triple: returns the
    /// existing edge if present. Fails with `DanglingReference` if either
    /// endpoint does not exist (invariant 2).
    pub fn get_or_create_edge(&mut self, edge: GraphEdge) -> Result<&GraphEdge> {
        let key = (
            edge.source_id.clone(),
            edge.target_id.clone(),
            edge.edge_type.clone(),
        );

        if let Some(&idx) = self.edge_keys_index(&key) {
            return Ok(&self.edges[idx]);
        }

        if !self.node_index.contains_key(&edge.source_id) || !self.node_index.contains_key(&edge.target_id) {
            warn!(
                source = %edge.source_id,
                target = %edge.target_id,
                edge_type = %edge.edge_type,
                "get_or_create_edge: dangling reference"
            );
            return Err(StorageError::DanglingReference {
                source: edge.source_id,
                target: edge.target_id,
                edge_type: edge.edge_type,
            }
            .into());
        }

        let idx = self.edges.len();
        self.edge_keys.insert(key);
        self.edges_from_index
            .entry(edge.source_id.clone())
            .or_default()
            .push(idx);
        self.edges_to_index
            .entry(edge.target_id.clone())
            .or_default()
            .push(idx);
        self.edges_type_index
            .entry(edge.edge_type.clone())
            .or_default()
            .push(idx);
        debug!(source = %edge.source_id, target = %edge.target_id, edge_type = %edge.edge_type, "get_or_create_edge: inserted");
        self.edges.push(edge);
        self.revision += 1;
        Ok(&self.edges[idx])
    }

    fn edge_keys_index(&self, key: &(String, String, String)) -> Option<&usize> {
        if !self.edge_keys.contains(key) {
            return None;
        }
        // Triple is known to exist; find its slot via the from-index,
        // which is always populated alongside edge_keys.
        self.edges_from_index
            .get(&key.0)?
            .iter()
            .find(|&&idx| self.edges[idx].key() == (key.0.as_str(), key.1.as_str(), key.2.as_str()))
    }

    pub fn edges_from(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.edges_from_index
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    pub fn edges_to(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.edges_to_index
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    pub fn edges_of_type(&self, edge_type: &str) -> impl Iterator<Item = &GraphEdge> {
        self.edges_type_index
            .get(edge_type)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // === SNAPSHOT / RESET ===

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Reset the repository. Invalidates outstanding snapshots only in the
    /// sense that they no longer reflect the live graph; already-taken
    /// `Snapshot` values remain valid (they are independent clones).
    pub fn clear_all(&mut self) {
        self.nodes.clear();
        self.node_index.clear();
        self.type_index.clear();
        self.edges.clear();
        self.edge_keys.clear();
        self.edges_from_index.clear();
        self.edges_to_index.clear();
        self.edges_type_index.clear();
        self.revision += 1;
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
