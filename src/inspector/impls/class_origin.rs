//! Phase 4 (multi-pass on classes): tags a `JavaClassNode` `java:source` or
//! `java:binary` depending on its origin marker, and links `extends`/
//! `implements` edges to any supertype/interface that is itself a
//! collected node (supertypes outside the analyzed set, like
//! `java.lang.Object`, are simply not linked).

use crate::error::Result;
use crate::graph::node::{ClassOrigin, NodeKind};
use crate::graph::NodeHandle;
use crate::inspector::{ClassInspector, Inspector, InspectorDescriptor};

pub struct JavaClassOriginInspector;

impl Inspector for JavaClassOriginInspector {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "JavaClassOriginInspector",
            supported_kind: "java_class",
            requires: &[],
            needs: &[],
            produces: &[],
            requires_all_nodes_processed: false,
        }
    }

    fn inspect(&self, handle: &mut NodeHandle) -> Result<()> {
        let (origin, parent_class, interfaces) = match handle.node().kind() {
            NodeKind::JavaClassNode(class) => {
                (class.origin, class.parent_class.clone(), class.interfaces.clone())
            }
            _ => return Ok(()),
        };

        match origin {
            ClassOrigin::Source => handle.enable_tag("java:source")?,
            ClassOrigin::Binary => handle.enable_tag("java:binary")?,
        }

        if let Some(parent) = parent_class {
            if handle.get_node(&parent).is_some() {
                handle.add_edge(parent, "extends")?;
            }
        }
        for interface in interfaces {
            if handle.get_node(&interface).is_some() {
                handle.add_edge(interface, "implements")?;
            }
        }

        Ok(())
    }
}
impl ClassInspector for JavaClassOriginInspector {}
