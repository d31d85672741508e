//! Phase 5 (global on classes): walks `extends` edges to compute
//! `inheritance_depth` per class — the length of the longest chain of
//! `extends` edges reachable from this node. Runs once, after the class
//! multi-pass phase converges, so every `extends` edge `JavaClassOrigin
//! Inspector` will ever add is already in place.

use std::collections::HashSet;

use crate::error::Result;
use crate::graph::NodeHandle;
use crate::inspector::{ClassInspector, Global, Inspector, InspectorDescriptor};

pub struct InheritanceDepthInspector;

impl Inspector for InheritanceDepthInspector {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "InheritanceDepthInspector",
            supported_kind: "java_class",
            requires: &[],
            needs: &["JavaClassOriginInspector"],
            produces: &[],
            requires_all_nodes_processed: true,
        }
    }

    fn inspect(&self, handle: &mut NodeHandle) -> Result<()> {
        let root = handle.node_id().to_string();
        let mut visited = HashSet::new();
        let depth = depth_from(handle, &root, &mut visited);
        handle.set_metric("inheritance_depth", depth as i64)?;
        Ok(())
    }
}
impl ClassInspector for InheritanceDepthInspector {}
impl Global for InheritanceDepthInspector {}

/// Longest chain of `extends` edges starting at `id`. `visited` guards
/// against a malformed cycle in the graph turning this into an infinite
/// recursion; a node already on the current path contributes depth 0.
fn depth_from(handle: &NodeHandle, id: &str, visited: &mut HashSet<String>) -> usize {
    if !visited.insert(id.to_string()) {
        return 0;
    }
    let mut max_depth = 0;
    for edge in handle.edges_from(id).filter(|e| e.edge_type == "extends") {
        let parent_depth = 1 + depth_from(handle, &edge.target_id.clone(), visited);
        max_depth = max_depth.max(parent_depth);
    }
    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{ClassOrigin, JavaClassNode};
    use crate::graph::{GraphEdge, GraphNode, NodeKind};
    use crate::repository::Repository;

    fn class(id: &str) -> GraphNode {
        GraphNode::new(
            id,
            NodeKind::JavaClassNode(JavaClassNode {
                fully_qualified_name: id.to_string(),
                simple_name: id.to_string(),
                package: String::new(),
                origin: ClassOrigin::Source,
                parent_class: None,
                interfaces: vec![],
            }),
            id,
        )
    }

    #[test]
    fn computes_depth_along_extends_chain() {
        let mut repo = Repository::new();
        for id in ["A", "B", "C", "D"] {
            repo.add_node(class(id)).unwrap();
        }
        // D extends C extends B extends A
        repo.get_or_create_edge(GraphEdge::new("D", "C", "extends")).unwrap();
        repo.get_or_create_edge(GraphEdge::new("C", "B", "extends")).unwrap();
        repo.get_or_create_edge(GraphEdge::new("B", "A", "extends")).unwrap();

        let mut handle = repo.node_handle("D").unwrap();
        InheritanceDepthInspector.inspect(&mut handle).unwrap();
        assert_eq!(handle.node().metrics().get("inheritance_depth").unwrap().as_f64(), 3.0);
        drop(handle);

        let mut handle = repo.node_handle("A").unwrap();
        InheritanceDepthInspector.inspect(&mut handle).unwrap();
        assert_eq!(handle.node().metrics().get("inheritance_depth").unwrap().as_f64(), 0.0);
    }
}
