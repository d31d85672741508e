//! `GraphNode`: the unit of analysis.
//!
//! Every node shares a common header (id, node_type discriminator,
//! display_label, properties, metrics, tags) plus variant-specific fields.
//! The variant set is closed today (`ProjectFile`, `JavaClassNode`,
//! `PackageNode`); `node_type` is the serialized discriminator string so a
//! future variant remains representable on disk without a schema change.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::value::{MetricValue, PropertyValue};

/// Variant-specific fields for a `ProjectFile` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub absolute_path: String,
    pub extension: Option<String>,
    pub size_bytes: u64,
    pub language: Option<String>,
}

/// Marker of where a `JavaClassNode` was observed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassOrigin {
    Source,
    Binary,
}

/// Variant-specific fields for a `JavaClassNode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaClassNode {
    pub fully_qualified_name: String,
    pub simple_name: String,
    pub package: String,
    pub origin: ClassOrigin,
    /// Fully-qualified name of the superclass, if known.
    pub parent_class: Option<String>,
    /// Fully-qualified names of implemented interfaces.
    pub interfaces: Vec<String>,
}

/// Variant-specific fields for a `PackageNode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageNode {
    pub fully_qualified_name: String,
}

/// The closed set of node variants. Shares the common header via
/// `GraphNode`; each arm carries only its additive fields. Internally
/// tagged on `kind` for the persistent store's `kind_data` blob — see
/// `store::schema` for why this lives in its own column rather than
/// folded into `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
    ProjectFile(ProjectFile),
    JavaClassNode(JavaClassNode),
    PackageNode(PackageNode),
}

impl NodeKind {
    /// The short discriminator string persisted as `node_type` and matched
    /// against `Inspector::supported_kind`.
    pub fn discriminator(&self) -> &'static str {
        match self {
            NodeKind::ProjectFile(_) => "file",
            NodeKind::JavaClassNode(_) => "java_class",
            NodeKind::PackageNode(_) => "package",
        }
    }
}

/// A vertex in the graph: the common header plus a closed variant.
///
/// `properties`/`metrics`/`tags` are disjoint namespaces (invariant 3 of
/// the data model): a key may appear in both properties and tags without
/// implying a relationship between the two stores.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: String,
    kind: NodeKind,
    display_label: String,
    properties: BTreeMap<String, PropertyValue>,
    metrics: BTreeMap<String, MetricValue>,
    tags: BTreeSet<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, display_label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            display_label: display_label.into(),
            properties: BTreeMap::new(),
            metrics: BTreeMap::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Reconstruct a node from its persisted parts. Used only by the
    /// persistent store's load path, which decodes each column
    /// independently and then assembles the node in one shot.
    pub(crate) fn from_parts(
        id: String,
        kind: NodeKind,
        display_label: String,
        properties: BTreeMap<String, PropertyValue>,
        metrics: BTreeMap<String, MetricValue>,
        tags: BTreeSet<String>,
    ) -> Self {
        Self {
            id,
            kind,
            display_label,
            properties,
            metrics,
            tags,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> &'static str {
        self.kind.discriminator()
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn metrics(&self) -> &BTreeMap<String, MetricValue> {
        &self.metrics
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Overwrite a property. Keys must be non-empty; enforced by the caller
    /// (`NodeHandle`), which is the only path that reaches this method.
    /// Returns `true` if the stored value actually changed.
    pub(crate) fn set_property(&mut self, key: String, value: PropertyValue) -> bool {
        debug_assert!(!key.is_empty(), "property key must be non-empty");
        let old = self.properties.insert(key, value.clone());
        old != Some(value)
    }

    /// Overwrite a metric. Caller (`NodeHandle`) rejects non-finite values
    /// before reaching here. Returns `true` if the stored value changed.
    pub(crate) fn set_metric(&mut self, name: String, value: MetricValue) -> bool {
        let old = self.metrics.insert(name, value);
        old != Some(value)
    }

    /// Idempotent tag addition. Returns `true` if the tag set changed.
    pub(crate) fn enable_tag(&mut self, tag: String) -> bool {
        self.tags.insert(tag)
    }

    /// Idempotent tag removal. Returns `true` if the tag set changed.
    pub(crate) fn disable_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_all_tags<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> bool {
        tags.into_iter().all(|t| self.tags.contains(t))
    }
}
