//! Phase 2 (collection trigger): for every `ProjectFile` tagged
//! `language:java`, collect `JavaClassNode`s and insert them into the
//! repository, plus the `PackageNode`s they belong to.
//!
//! This is not an `Inspector` — it adds nodes, which a `NodeHandle`
//! deliberately cannot do (see `graph::decorator`). The kernel entry point
//! invokes it directly between phase 1 (file-level detection) and phase 3
//! (multi-pass on files), matching the Collection row of the phase table.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::{BinaryClassCollector, CollectionContext, Collector, JavaSourceCollector};
use crate::error::CollectionError;
use crate::graph::node::{NodeKind, PackageNode};
use crate::graph::GraphEdge;
use crate::repository::Repository;

pub struct JavaSourceCollectionInspector {
    source_collector: JavaSourceCollector,
    binary_collector: BinaryClassCollector,
}

impl JavaSourceCollectionInspector {
    pub fn new() -> Self {
        Self {
            source_collector: JavaSourceCollector::new(),
            binary_collector: BinaryClassCollector::new(),
        }
    }

    /// Returns the number of class nodes inserted and any per-file
    /// collection errors, captured rather than propagated (same recovery
    /// mode as an inspector failure).
    pub fn run(&self, repo: &mut Repository, project_root: &Path) -> (usize, Vec<CollectionError>) {
        let file_ids: Vec<String> = repo
            .nodes_of_type("file")
            .filter(|n| n.has_tag("language:java"))
            .map(|n| n.id().to_string())
            .collect();

        let mut inserted = 0;
        let mut errors = Vec::new();

        for file_id in file_ids {
            let absolute_path = match repo.get_node(&file_id).map(|n| n.kind()) {
                Some(NodeKind::ProjectFile(f)) => PathBuf::from(&f.absolute_path),
                _ => continue,
            };

            let is_binary = matches!(
                absolute_path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref(),
                Some("class") | Some("jar") | Some("war") | Some("ear")
            );

            let result = {
                let ctx = CollectionContext::new(repo, project_root);
                if is_binary {
                    self.binary_collector.collect(&absolute_path, &ctx)
                } else {
                    self.source_collector.collect(&absolute_path, &ctx)
                }
            };

            match result {
                Ok(nodes) => {
                    for node in nodes {
                        let class_id = node.id().to_string();
                        let package = match node.kind() {
                            NodeKind::JavaClassNode(c) => c.package.clone(),
                            _ => String::new(),
                        };

                        if repo.add_node(node).is_err() {
                            continue; // already present; collection is dedup-safe, not an error
                        }
                        inserted += 1;
                        debug!(file = file_id, class = class_id, "java_source_collection: inserted class");

                        let _ = repo.get_or_create_edge(GraphEdge::new(file_id.clone(), class_id.clone(), "contains"));

                        if !package.is_empty() {
                            if repo.get_node(&package).is_none() {
                                let _ = repo.add_node(crate::graph::GraphNode::new(
                                    package.clone(),
                                    NodeKind::PackageNode(PackageNode { fully_qualified_name: package.clone() }),
                                    package.clone(),
                                ));
                            }
                            let _ = repo.get_or_create_edge(GraphEdge::new(package, class_id, "contains"));
                        }
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        (inserted, errors)
    }
}

impl Default for JavaSourceCollectionInspector {
    fn default() -> Self {
        Self::new()
    }
}
