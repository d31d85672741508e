//! Phase 5 (global, dispatched over `PackageNode`s): sets a `class_count`
//! metric per package and links any `JavaClassNode` whose `package` field
//! names this package but isn't yet connected by a `contains` edge — a
//! backstop for classes discovered after the package node itself was
//! created (e.g. a binary collector run after the source collector).

use crate::error::Result;
use crate::graph::node::NodeKind;
use crate::graph::NodeHandle;
use crate::inspector::{Global, Inspector, InspectorDescriptor};

pub struct PackageMembershipInspector;

impl Inspector for PackageMembershipInspector {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "PackageMembershipInspector",
            supported_kind: "package",
            requires: &[],
            needs: &[],
            produces: &[],
            requires_all_nodes_processed: true,
        }
    }

    fn inspect(&self, handle: &mut NodeHandle) -> Result<()> {
        let package_name = handle.node_id().to_string();

        let member_ids: Vec<String> = handle
            .nodes_of_type("java_class")
            .filter(|n| match n.kind() {
                NodeKind::JavaClassNode(c) => c.package == package_name,
                _ => false,
            })
            .map(|n| n.id().to_string())
            .collect();

        for class_id in &member_ids {
            handle.add_edge(class_id.clone(), "contains")?;
        }
        handle.set_metric("class_count", member_ids.len() as i64)?;

        Ok(())
    }
}
impl Global for PackageMembershipInspector {}
