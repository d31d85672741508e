//! `JavaSourceCollector`: a heuristic `.java` text scanner.
//!
//! This is explicitly not a parser — no lexer, no grammar, no handling of
//! comments that contain lookalike declarations. It regex-scans for
//! `package`, `class`/`interface`, `extends`, and `implements` declarations,
//! which is enough to place a class in the graph with its name, package, and
//! supertype links. Anything subtler (generics, nested classes, annotations
//! on the class line) is out of scope, consistent with this crate never
//! claiming to be a Java compiler.

use std::path::{Path, PathBuf};

use regex_lite::Regex;

use crate::collector::{CollectionContext, Collector};
use crate::error::CollectionError;
use crate::graph::node::{ClassOrigin, JavaClassNode};
use crate::graph::{GraphNode, NodeKind};

pub struct JavaSourceCollector {
    package_re: Regex,
    type_re: Regex,
}

impl JavaSourceCollector {
    pub fn new() -> Self {
        Self {
            package_re: Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap(),
            type_re: Regex::new(
                r"(?m)^\s*(?:public\s+|final\s+|abstract\s+)*(?:class|interface|enum)\s+(\w+)(?:\s+extends\s+([\w.]+))?(?:\s+implements\s+([\w.,\s]+))?",
            )
            .unwrap(),
        }
    }

    fn relative_id(&self, project_root: &Path, source_path: &Path, fqn: &str) -> String {
        let _ = (project_root, source_path);
        fqn.to_string()
    }

    /// A bare supertype name (no `.`) is heuristically assumed to live in
    /// the same package — there is no import table to resolve it properly,
    /// and same-package is the overwhelmingly common case for an
    /// unqualified `extends`/`implements` reference. Already-qualified
    /// names (`java.lang.Object`) pass through unchanged.
    fn qualify(&self, package: &str, name: &str) -> String {
        if package.is_empty() || name.contains('.') {
            name.to_string()
        } else {
            format!("{package}.{name}")
        }
    }
}

impl Default for JavaSourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector<PathBuf, GraphNode> for JavaSourceCollector {
    fn can_collect(&self, input: &PathBuf) -> bool {
        input.extension().map(|e| e == "java").unwrap_or(false)
    }

    fn collect(&self, input: &PathBuf, ctx: &CollectionContext) -> Result<Vec<GraphNode>, CollectionError> {
        let text = std::fs::read_to_string(input).map_err(|source| CollectionError::UnreadableFile {
            path: input.display().to_string(),
            source,
        })?;

        let package = self
            .package_re
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let mut nodes = Vec::new();
        for caps in self.type_re.captures_iter(&text) {
            let simple_name = match caps.get(1) {
                Some(m) => m.as_str().to_string(),
                None => continue,
            };
            let fqn = if package.is_empty() {
                simple_name.clone()
            } else {
                format!("{package}.{simple_name}")
            };
            let id = self.relative_id(ctx.project_root, input, &fqn);
            if ctx.already_collected(&id) {
                continue;
            }

            let parent_class = caps
                .get(2)
                .map(|m| self.qualify(&package, m.as_str().trim()));
            let interfaces = caps
                .get(3)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(|s| s.trim())
                        .filter(|s| !s.is_empty())
                        .map(|s| self.qualify(&package, s))
                        .collect()
                })
                .unwrap_or_default();

            nodes.push(GraphNode::new(
                id,
                NodeKind::JavaClassNode(JavaClassNode {
                    fully_qualified_name: fqn.clone(),
                    simple_name,
                    package: package.clone(),
                    origin: ClassOrigin::Source,
                    parent_class,
                    interfaces,
                }),
                fqn,
            ));
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;

    #[test]
    fn extracts_package_and_supertypes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.java");
        std::fs::write(
            &path,
            "package com.example;\n\npublic class Foo extends Base implements Runnable, Closeable {\n}\n",
        )
        .unwrap();

        let repo = Repository::new();
        let ctx = CollectionContext::new(&repo, dir.path());
        let collector = JavaSourceCollector::new();
        let nodes = collector.collect(&path, &ctx).unwrap();

        assert_eq!(nodes.len(), 1);
        match nodes[0].kind() {
            NodeKind::JavaClassNode(class) => {
                assert_eq!(class.fully_qualified_name, "com.example.Foo");
                assert_eq!(class.parent_class.as_deref(), Some("com.example.Base"));
                assert_eq!(
                    class.interfaces,
                    vec!["com.example.Runnable", "com.example.Closeable"]
                );
            }
            other => panic!("expected JavaClassNode, got {other:?}"),
        }
    }

    #[test]
    fn class_without_package_uses_simple_name_as_fqn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Loose.java");
        std::fs::write(&path, "class Loose {}\n").unwrap();

        let repo = Repository::new();
        let ctx = CollectionContext::new(&repo, dir.path());
        let nodes = JavaSourceCollector::new().collect(&path, &ctx).unwrap();

        assert_eq!(nodes[0].id(), "Loose");
    }
}
