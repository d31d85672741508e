//! Inspector Framework: dependency-ordered, tag-gated, multi-pass-to-
//! convergence scheduling over the in-memory repository.
//!
//! Capability is modeled as trait implementation rather than an inheritance
//! hierarchy: an inspector type implements `FileInspector` and/or
//! `ClassInspector`, optionally also `Global`. The scheduler dispatches on
//! which traits a registered inspector actually implements, following the
//! teacher's preference for capability sets over deep base classes.

pub mod impls;
pub mod registry;
pub mod scheduler;

use crate::error::Result;
use crate::graph::NodeHandle;

/// Static, declarative metadata the scheduler resolves into a DAG at
/// startup — no reflective discovery, no runtime annotation scanning.
#[derive(Debug, Clone, Default)]
pub struct InspectorDescriptor {
    pub name: &'static str,
    /// Node-type discriminator this inspector is dispatched against
    /// (`"file"`, `"java_class"`, `"package"`).
    pub supported_kind: &'static str,
    /// Tags that must already be present on a node for this inspector to
    /// be considered for it.
    pub requires: &'static [&'static str],
    /// Other inspector names that must run first within the same pass.
    pub needs: &'static [&'static str],
    /// Tags this inspector is expected to set on success; a success that
    /// does not set all of these is a contract violation (warning only).
    pub produces: &'static [&'static str],
    /// Global inspectors run exactly once, after their phase's multi-pass
    /// loop converges, and may read (but never add nodes to) the complete
    /// graph.
    pub requires_all_nodes_processed: bool,
}

/// One unit of analysis: reads a node, writes tags/properties/metrics/edges
/// through the `NodeHandle` it is given. Never touches the repository by
/// any other path.
pub trait Inspector: Send + Sync {
    fn descriptor(&self) -> InspectorDescriptor;

    /// Inspect one node. Any error bubbles up through the ordinary kernel
    /// error type; the scheduler is responsible for catching it, wrapping
    /// it into an `InspectionError` attributed to (inspector name, node
    /// id), and reverting the node to its pre-invocation state. An
    /// inspector body never has to know it is being attributed.
    fn inspect(&self, handle: &mut NodeHandle) -> Result<()>;
}

/// Marker: this inspector is dispatched over `ProjectFile` nodes.
pub trait FileInspector: Inspector {}

/// Marker: this inspector is dispatched over `JavaClassNode` nodes.
pub trait ClassInspector: Inspector {}

/// Marker: this inspector runs in the global phase of its node kind,
/// exactly once, after multi-pass convergence.
pub trait Global: Inspector {}
