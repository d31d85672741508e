//! Phase 1 (file-level detection): sets `language:<lang>` tags and a
//! `size_bytes` metric from a `ProjectFile`'s extension and recorded size.

use crate::error::Result;
use crate::graph::node::NodeKind;
use crate::graph::NodeHandle;
use crate::inspector::{FileInspector, Inspector, InspectorDescriptor};

const EXTENSION_LANGUAGES: &[(&str, &str)] =
    &[("java", "java"), ("kt", "kotlin"), ("scala", "scala"), ("groovy", "groovy")];

pub struct ExtensionLanguageInspector;

impl Inspector for ExtensionLanguageInspector {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "ExtensionLanguageInspector",
            supported_kind: "file",
            requires: &[],
            needs: &[],
            produces: &[],
            requires_all_nodes_processed: false,
        }
    }

    fn inspect(&self, handle: &mut NodeHandle) -> Result<()> {
        let (extension, size_bytes) = match handle.node().kind() {
            NodeKind::ProjectFile(file) => (file.extension.clone(), file.size_bytes),
            _ => return Ok(()),
        };

        handle.set_metric("size_bytes", size_bytes as i64)?;

        if let Some(ext) = extension {
            if let Some((_, language)) = EXTENSION_LANGUAGES.iter().find(|(e, _)| *e == ext) {
                handle.enable_tag(format!("language:{language}"))?;
            }
        }
        Ok(())
    }
}
impl FileInspector for ExtensionLanguageInspector {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::ProjectFile;
    use crate::graph::GraphNode;
    use crate::repository::Repository;

    #[test]
    fn tags_java_files_and_sets_size_metric() {
        let mut repo = Repository::new();
        repo.add_node(GraphNode::new(
            "Foo.java",
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: "/p/Foo.java".to_string(),
                extension: Some("java".to_string()),
                size_bytes: 128,
                language: None,
            }),
            "Foo.java",
        ))
        .unwrap();

        let mut handle = repo.node_handle("Foo.java").unwrap();
        ExtensionLanguageInspector.inspect(&mut handle).unwrap();
        assert!(handle.node().has_tag("language:java"));
        assert_eq!(handle.node().metrics().get("size_bytes").unwrap().as_f64(), 128.0);
    }

    #[test]
    fn unknown_extension_sets_no_language_tag() {
        let mut repo = Repository::new();
        repo.add_node(GraphNode::new(
            "README.md",
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: "/p/README.md".to_string(),
                extension: Some("md".to_string()),
                size_bytes: 4,
                language: None,
            }),
            "README.md",
        ))
        .unwrap();

        let mut handle = repo.node_handle("README.md").unwrap();
        ExtensionLanguageInspector.inspect(&mut handle).unwrap();
        assert!(handle.node().tags().is_empty());
    }
}
