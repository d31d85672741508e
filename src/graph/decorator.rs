//! `NodeHandle`: the single node-mutation handle.
//!
//! The reference implementation this crate descends from carried two
//! notions of "node decorator" (a `ProjectFileDecorator` and a generic
//! `NodeDecorator<T>`). That split was migration debris, not intent: this
//! crate exposes exactly one handle type, generic over no node variant,
//! used by every inspector regardless of `supported_kind`.
//!
//! The handle borrows the repository exclusively for the scope of one
//! inspection. Writes go through it and nowhere else, which makes
//! "mutation is scoped to this node" a compile-time property rather than a
//! convention inspectors have to honor by hand.

use crate::error::{Result, StorageError};
use crate::graph::edge::GraphEdge;
use crate::graph::node::GraphNode;
use crate::repository::Repository;
use crate::value::{MetricValue, PropertyValue};

pub struct NodeHandle<'repo> {
    repo: &'repo mut Repository,
    node_id: String,
    changed: bool,
}

impl<'repo> NodeHandle<'repo> {
    pub(crate) fn new(repo: &'repo mut Repository, node_id: String) -> Self {
        Self {
            repo,
            node_id,
            changed: false,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Read-only view of the node this handle is scoped to. Inspectors use
    /// this to inspect existing tags/properties/metrics/kind before
    /// deciding what to write.
    pub fn node(&self) -> &GraphNode {
        self.repo
            .get_node(&self.node_id)
            .expect("NodeHandle always refers to a node present when it was created")
    }

    /// Overwrite a property. Errors if `key` is empty.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(StorageError::PersistFailed("property key must be non-empty".into()).into());
        }
        let node = self
            .repo
            .node_mut(&self.node_id)
            .ok_or_else(|| StorageError::NotFound(self.node_id.clone()))?;
        if node.set_property(key, value.into()) {
            self.repo.bump_revision();
            self.changed = true;
        }
        Ok(())
    }

    /// Overwrite a metric. Rejects NaN/infinity per the data model invariant.
    pub fn set_metric(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Result<()> {
        let value = value.into();
        if !value.is_finite() {
            return Err(StorageError::PersistFailed(format!(
                "metric value must be finite, got {:?}",
                value
            ))
            .into());
        }
        let node = self
            .repo
            .node_mut(&self.node_id)
            .ok_or_else(|| StorageError::NotFound(self.node_id.clone()))?;
        if node.set_metric(name.into(), value) {
            self.repo.bump_revision();
            self.changed = true;
        }
        Ok(())
    }

    /// Idempotent tag addition.
    pub fn enable_tag(&mut self, tag: impl Into<String>) -> Result<()> {
        let node = self
            .repo
            .node_mut(&self.node_id)
            .ok_or_else(|| StorageError::NotFound(self.node_id.clone()))?;
        if node.enable_tag(tag.into()) {
            self.repo.bump_revision();
            self.changed = true;
        }
        Ok(())
    }

    /// Idempotent tag removal.
    pub fn disable_tag(&mut self, tag: &str) -> Result<()> {
        let node = self
            .repo
            .node_mut(&self.node_id)
            .ok_or_else(|| StorageError::NotFound(self.node_id.clone()))?;
        if node.disable_tag(tag) {
            self.repo.bump_revision();
            self.changed = true;
        }
        Ok(())
    }

    /// Insert an edge from this node. Permitted for global-phase inspectors
    /// (which may add edges but never nodes) as well as regular ones.
    pub fn add_edge(&mut self, target_id: impl Into<String>, edge_type: impl Into<String>) -> Result<()> {
        let edge = GraphEdge::new(self.node_id.clone(), target_id.into(), edge_type.into());
        self.repo.get_or_create_edge(edge)?;
        Ok(())
    }

    /// Whether any write through this handle actually changed the node,
    /// used by the scheduler to detect per-pass convergence.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Read any node by id. Global-phase inspectors use this (together
    /// with `edges_from`/`edges_to`/`nodes_of_type`) to read the complete
    /// graph; they may read everything but must not add nodes.
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.repo.get_node(id)
    }

    pub fn edges_from(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.repo.edges_from(id)
    }

    pub fn edges_to(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.repo.edges_to(id)
    }

    pub fn nodes_of_type(&self, node_type: &str) -> impl Iterator<Item = &GraphNode> {
        self.repo.nodes_of_type(node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{GraphNode, NodeKind, ProjectFile};

    fn file_node(id: &str) -> GraphNode {
        GraphNode::new(
            id,
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: id.to_string(),
                extension: Some("java".to_string()),
                size_bytes: 10,
                language: None,
            }),
            id,
        )
    }

    #[test]
    fn handle_tracks_change_on_new_tag_only() {
        let mut repo = Repository::new();
        repo.add_node(file_node("a")).unwrap();

        let mut handle = repo.node_handle("a").unwrap();
        handle.enable_tag("language:java").unwrap();
        assert!(handle.changed());

        drop(handle);
        let mut handle = repo.node_handle("a").unwrap();
        handle.enable_tag("language:java").unwrap();
        assert!(!handle.changed());
    }

    #[test]
    fn set_property_rejects_empty_key() {
        let mut repo = Repository::new();
        repo.add_node(file_node("a")).unwrap();
        let mut handle = repo.node_handle("a").unwrap();
        assert!(handle.set_property("", 1i64).is_err());
    }

    #[test]
    fn set_metric_rejects_non_finite() {
        let mut repo = Repository::new();
        repo.add_node(file_node("a")).unwrap();
        let mut handle = repo.node_handle("a").unwrap();
        assert!(handle.set_metric("bad", f64::NAN).is_err());
    }
}
