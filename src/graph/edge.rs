//! `GraphEdge`: a directed, typed relationship between two nodes.
//!
//! Identified by the triple `(source_id, target_id, edge_type)`; that
//! triple is unique within a repository.

use std::collections::BTreeMap;

use crate::value::PropertyValue;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub edge_type: String,
    pub metadata: BTreeMap<String, PropertyValue>,
}

impl GraphEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type: edge_type.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// The unique identifying triple for this edge.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.source_id, &self.target_id, &self.edge_type)
    }
}
