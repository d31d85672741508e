//! Phase 3 (multi-pass on files): sets a `loc` metric on `ProjectFile`
//! nodes tagged `language:java` — a non-blank, non-line-comment line
//! count. Block comments are not stripped; this is a heuristic count, not
//! a parser's, matching the crate's stated Non-goal of full Java parsing.

use crate::error::Result;
use crate::graph::node::NodeKind;
use crate::graph::NodeHandle;
use crate::inspector::{FileInspector, Inspector, InspectorDescriptor};

pub struct JavaLocMetricInspector;

impl Inspector for JavaLocMetricInspector {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "JavaLocMetricInspector",
            supported_kind: "file",
            requires: &["language:java"],
            needs: &["ExtensionLanguageInspector"],
            produces: &[],
            requires_all_nodes_processed: false,
        }
    }

    fn inspect(&self, handle: &mut NodeHandle) -> Result<()> {
        let absolute_path = match handle.node().kind() {
            NodeKind::ProjectFile(file) => file.absolute_path.clone(),
            _ => return Ok(()),
        };

        let content = std::fs::read_to_string(&absolute_path)?;
        let loc = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .count();

        handle.set_metric("loc", loc as i64)?;
        Ok(())
    }
}
impl FileInspector for JavaLocMetricInspector {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::ProjectFile;
    use crate::graph::GraphNode;
    use crate::repository::Repository;

    #[test]
    fn counts_non_blank_non_comment_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.java");
        std::fs::write(&path, "package x;\n\n// a comment\npublic class Foo {\n}\n").unwrap();

        let mut repo = Repository::new();
        repo.add_node(GraphNode::new(
            "Foo.java",
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: path.display().to_string(),
                extension: Some("java".to_string()),
                size_bytes: 1,
                language: Some("java".to_string()),
            }),
            "Foo.java",
        ))
        .unwrap();
        repo.node_handle("Foo.java").unwrap().enable_tag("language:java").unwrap();

        let mut handle = repo.node_handle("Foo.java").unwrap();
        JavaLocMetricInspector.inspect(&mut handle).unwrap();
        assert_eq!(handle.node().metrics().get("loc").unwrap().as_f64(), 3.0);
    }
}
