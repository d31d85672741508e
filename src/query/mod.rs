//! Query Surface: the typed API external callers (principally a migration
//! engine) use to read the graph. Evaluated against the in-memory
//! repository by default; `store::SqliteStore::open_session` backs the
//! same operations when a caller wants to query the persisted form without
//! loading the whole graph into memory first.

use std::collections::BTreeSet;

use crate::graph::GraphNode;
use crate::repository::Repository;
use crate::value::PropertyValue;

/// One of the four permitted predicate shapes for `by_property`.
pub enum PropertyPredicate<'a> {
    Equals(&'a PropertyValue),
    Exists,
    StringContains(&'a str),
    NumericCompare(NumericComparison, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericComparison {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
}

/// A bounded traversal result: the node set reached and the edges that
/// connect them, both already filtered by `edge_filter`.
#[derive(Debug, Default)]
pub struct Subgraph {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String, String)>,
}

/// Read-only view over a `Repository`. Holds a shared borrow, so it cannot
/// outlive the repository it was built from — the same scoping discipline
/// `NodeHandle` uses for writes.
pub struct QuerySurface<'repo> {
    repo: &'repo Repository,
}

impl<'repo> QuerySurface<'repo> {
    pub fn new(repo: &'repo Repository) -> Self {
        Self { repo }
    }

    pub fn by_id(&self, id: &str) -> Option<&'repo GraphNode> {
        self.repo.get_node(id)
    }

    /// Nodes of one type, ordered by id (within a single type, `(node_type,
    /// id)` ordering reduces to ordering by id).
    pub fn by_type(&self, node_type: &str) -> Vec<&'repo GraphNode> {
        let mut nodes: Vec<&GraphNode> = self.repo.nodes_of_type(node_type).collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));
        nodes
    }

    pub fn by_tags(
        &self,
        all_of: &BTreeSet<String>,
        any_of: &BTreeSet<String>,
        none_of: &BTreeSet<String>,
    ) -> Vec<&'repo GraphNode> {
        let mut nodes: Vec<&GraphNode> = self
            .repo
            .all_nodes()
            .filter(|n| all_of.iter().all(|t| n.has_tag(t)))
            .filter(|n| any_of.is_empty() || any_of.iter().any(|t| n.has_tag(t)))
            .filter(|n| none_of.iter().all(|t| !n.has_tag(t)))
            .collect();
        sort_by_type_then_id(&mut nodes);
        nodes
    }

    pub fn by_property(&self, key: &str, predicate: PropertyPredicate) -> Vec<&'repo GraphNode> {
        let mut nodes: Vec<&GraphNode> = self
            .repo
            .all_nodes()
            .filter(|n| match n.properties().get(key) {
                Some(value) => matches_predicate(value, &predicate),
                None => false,
            })
            .collect();
        sort_by_type_then_id(&mut nodes);
        nodes
    }

    pub fn neighbors(&self, id: &str, edge_type: Option<&str>, direction: Direction) -> Vec<&'repo GraphNode> {
        let mut ids: BTreeSet<String> = BTreeSet::new();

        if matches!(direction, Direction::Out | Direction::Both) {
            for edge in self.repo.edges_from(id) {
                if edge_type.map(|t| t == edge.edge_type).unwrap_or(true) {
                    ids.insert(edge.target_id.clone());
                }
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for edge in self.repo.edges_to(id) {
                if edge_type.map(|t| t == edge.edge_type).unwrap_or(true) {
                    ids.insert(edge.source_id.clone());
                }
            }
        }

        let mut nodes: Vec<&GraphNode> = ids.iter().filter_map(|id| self.repo.get_node(id)).collect();
        sort_by_type_then_id(&mut nodes);
        nodes
    }

    /// Breadth-first traversal outward from `root_ids`, up to `max_depth`
    /// hops, considering only edges for which `edge_filter` returns true.
    pub fn subgraph(&self, root_ids: &[String], max_depth: usize, edge_filter: impl Fn(&str) -> bool) -> Subgraph {
        let mut visited: BTreeSet<String> = root_ids.iter().cloned().collect();
        let mut frontier: Vec<String> = root_ids.to_vec();
        let mut edges = Vec::new();

        for _ in 0..max_depth {
            let mut next_frontier = Vec::new();
            for id in &frontier {
                for edge in self.repo.edges_from(id).chain(self.repo.edges_to(id)) {
                    if !edge_filter(&edge.edge_type) {
                        continue;
                    }
                    edges.push((edge.source_id.clone(), edge.target_id.clone(), edge.edge_type.clone()));
                    let other = if edge.source_id == *id { &edge.target_id } else { &edge.source_id };
                    if visited.insert(other.clone()) {
                        next_frontier.push(other.clone());
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        edges.sort();
        edges.dedup();
        Subgraph { nodes: visited.into_iter().collect(), edges }
    }
}

fn sort_by_type_then_id(nodes: &mut [&GraphNode]) {
    nodes.sort_by(|a, b| a.node_type().cmp(b.node_type()).then_with(|| a.id().cmp(b.id())));
}

fn matches_predicate(value: &PropertyValue, predicate: &PropertyPredicate) -> bool {
    match predicate {
        PropertyPredicate::Equals(expected) => value == *expected,
        PropertyPredicate::Exists => true,
        PropertyPredicate::StringContains(needle) => match value {
            PropertyValue::Str(s) => s.contains(needle),
            _ => false,
        },
        PropertyPredicate::NumericCompare(cmp, threshold) => {
            let as_f64 = match value {
                PropertyValue::Int(i) => Some(*i as f64),
                PropertyValue::Float(f) => Some(*f),
                _ => None,
            };
            match as_f64 {
                Some(v) => match cmp {
                    NumericComparison::LessThan => v < *threshold,
                    NumericComparison::LessOrEqual => v <= *threshold,
                    NumericComparison::GreaterThan => v > *threshold,
                    NumericComparison::GreaterOrEqual => v >= *threshold,
                },
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{PackageNode, ProjectFile};
    use crate::graph::{GraphEdge, GraphNode, NodeKind};

    fn repo_with_two_files() -> Repository {
        let mut repo = Repository::new();
        repo.add_node(GraphNode::new(
            "b.java",
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: "b.java".to_string(),
                extension: Some("java".to_string()),
                size_bytes: 1,
                language: None,
            }),
            "b.java",
        ))
        .unwrap();
        repo.add_node(GraphNode::new(
            "a.java",
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: "a.java".to_string(),
                extension: Some("java".to_string()),
                size_bytes: 2,
                language: None,
            }),
            "a.java",
        ))
        .unwrap();
        repo
    }

    #[test]
    fn by_type_orders_lexicographically_by_id() {
        let repo = repo_with_two_files();
        let query = QuerySurface::new(&repo);
        let ids: Vec<&str> = query.by_type("file").into_iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["a.java", "b.java"]);
    }

    #[test]
    fn by_tags_all_of_any_of_none_of() {
        let mut repo = repo_with_two_files();
        repo.node_handle("a.java").unwrap().enable_tag("language:java").unwrap();
        repo.node_handle("b.java").unwrap().enable_tag("language:kotlin").unwrap();

        let query = QuerySurface::new(&repo);
        let mut all_of = BTreeSet::new();
        all_of.insert("language:java".to_string());
        let result = query.by_tags(&all_of, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), "a.java");
    }

    #[test]
    fn neighbors_respects_direction_and_edge_type() {
        let mut repo = repo_with_two_files();
        repo.add_node(GraphNode::new(
            "p",
            NodeKind::PackageNode(PackageNode { fully_qualified_name: "p".to_string() }),
            "p",
        ))
        .unwrap();
        repo.get_or_create_edge(GraphEdge::new("p", "a.java", "contains")).unwrap();

        let query = QuerySurface::new(&repo);
        let out = query.neighbors("p", Some("contains"), Direction::Out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), "a.java");

        let in_dir = query.neighbors("a.java", None, Direction::In);
        assert_eq!(in_dir.len(), 1);
        assert_eq!(in_dir[0].id(), "p");
    }

    #[test]
    fn subgraph_bounds_traversal_by_depth() {
        let mut repo = Repository::new();
        for id in ["a", "b", "c"] {
            repo.add_node(GraphNode::new(
                id,
                NodeKind::PackageNode(PackageNode { fully_qualified_name: id.to_string() }),
                id,
            ))
            .unwrap();
        }
        repo.get_or_create_edge(GraphEdge::new("a", "b", "contains")).unwrap();
        repo.get_or_create_edge(GraphEdge::new("b", "c", "contains")).unwrap();

        let query = QuerySurface::new(&repo);
        let sub = query.subgraph(&["a".to_string()], 1, |_| true);
        assert!(sub.nodes.contains(&"b".to_string()));
        assert!(!sub.nodes.contains(&"c".to_string()));
    }
}
