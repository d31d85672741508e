//! Integration tests covering seed end-to-end scenarios: empty project,
//! single-file Java source, a `needs` cycle, a contract violation,
//! persist/load round-trip, and global-phase complete-graph observation.

use std::fs;

use jakern::config::KernelConfig;
use jakern::error::{ConfigurationError, KernelError};
use jakern::graph::node::ProjectFile;
use jakern::graph::{GraphNode, NodeHandle, NodeKind};
use jakern::inspector::scheduler::{self, CancellationToken, RunReport, SchedulerConfig};
use jakern::inspector::{FileInspector, Inspector, InspectorDescriptor};
use jakern::kernel::analyze_project;
use jakern::repository::Repository;
use jakern::store::SqliteStore;

fn file_node(id: &str) -> GraphNode {
    GraphNode::new(
        id,
        NodeKind::ProjectFile(ProjectFile {
            absolute_path: id.to_string(),
            extension: Some("java".to_string()),
            size_bytes: 1,
            language: None,
        }),
        id,
    )
}

#[test]
fn empty_project_yields_an_empty_snapshot_and_no_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = KernelConfig::new(dir.path());
    let snapshot = analyze_project(config).unwrap();

    assert!(snapshot.nodes().is_empty());
    assert!(snapshot.edges().is_empty());
}

#[test]
fn single_file_java_project_produces_linked_file_class_package() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Greeter.java"),
        "package com.example.hello;\n\npublic class Greeter {\n    String say() { return \"hi\"; }\n}\n",
    )
    .unwrap();

    let config = KernelConfig::new(dir.path());
    let snapshot = analyze_project(config).unwrap();

    let file = snapshot.nodes().iter().find(|n| n.node_type() == "file").unwrap();
    assert!(file.has_tag("language:java"));
    assert!(file.metrics().contains_key("size_bytes"));

    let class = snapshot.nodes().iter().find(|n| n.node_type() == "java_class").unwrap();
    assert_eq!(class.id(), "com.example.hello.Greeter");
    assert!(class.has_tag("java:source"));
    assert!(class.metrics().contains_key("loc"));

    let package = snapshot.nodes().iter().find(|n| n.node_type() == "package").unwrap();
    assert_eq!(package.id(), "com.example.hello");
    assert_eq!(package.metrics().get("class_count").unwrap().as_f64(), 1.0);

    let contains_edges: Vec<_> = snapshot
        .edges()
        .iter()
        .filter(|e| e.edge_type == "contains")
        .collect();
    assert!(contains_edges.iter().any(|e| e.source_id == file.id() && e.target_id == class.id()));
    assert!(contains_edges.iter().any(|e| e.source_id == package.id() && e.target_id == class.id()));
}

struct NeedsCycleA;
struct NeedsCycleB;

impl Inspector for NeedsCycleA {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "NeedsCycleA",
            supported_kind: "file",
            requires: &[],
            needs: &["NeedsCycleB"],
            produces: &[],
            requires_all_nodes_processed: false,
        }
    }
    fn inspect(&self, handle: &mut NodeHandle) -> jakern::error::Result<()> {
        handle.enable_tag("a")
    }
}
impl FileInspector for NeedsCycleA {}

impl Inspector for NeedsCycleB {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "NeedsCycleB",
            supported_kind: "file",
            requires: &[],
            needs: &["NeedsCycleA"],
            produces: &[],
            requires_all_nodes_processed: false,
        }
    }
    fn inspect(&self, handle: &mut NodeHandle) -> jakern::error::Result<()> {
        handle.enable_tag("b")
    }
}
impl FileInspector for NeedsCycleB {}

#[test]
fn needs_cycle_is_reported_as_a_configuration_error() {
    let mut repo = Repository::new();
    repo.add_node(file_node("a.java")).unwrap();

    let inspectors: Vec<Box<dyn Inspector>> = vec![Box::new(NeedsCycleA), Box::new(NeedsCycleB)];
    let config = SchedulerConfig::default();
    let cancel = CancellationToken::new();
    let mut report = RunReport::default();

    let err = scheduler::run_node_phases(&mut repo, &inspectors, &[], &[], &config, &cancel).unwrap_err();
    assert!(matches!(err, KernelError::Configuration(ConfigurationError::Cycle(_))));
}

struct BrokenPromise;

impl Inspector for BrokenPromise {
    fn descriptor(&self) -> InspectorDescriptor {
        InspectorDescriptor {
            name: "BrokenPromise",
            supported_kind: "file",
            requires: &[],
            needs: &[],
            produces: &["never_set"],
            requires_all_nodes_processed: false,
        }
    }
    fn inspect(&self, handle: &mut NodeHandle) -> jakern::error::Result<()> {
        // Declares "never_set" in `produces` but never actually sets it.
        handle.enable_tag("ran")
    }
}
impl FileInspector for BrokenPromise {}

#[test]
fn unmet_produces_contract_is_recorded_as_a_violation_not_an_error() {
    let mut repo = Repository::new();
    repo.add_node(file_node("a.java")).unwrap();

    let inspectors: Vec<Box<dyn Inspector>> = vec![Box::new(BrokenPromise)];
    let mut report = RunReport::default();

    scheduler::run_file_detection(&mut repo, &inspectors, &mut report).unwrap();

    assert!(report.inspection_errors.is_empty());
    assert_eq!(report.contract_violations.len(), 1);
    assert!(repo.get_node("a.java").unwrap().has_tag("ran"));
}

#[test]
fn persisted_graph_survives_a_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Foo.java"), "package p;\nclass Foo {}\n").unwrap();

    let db_path = dir.path().join("graph.sqlite");
    let config = KernelConfig::new(dir.path()).with_database_path(&db_path);
    let original = analyze_project(config).unwrap();

    let store = SqliteStore::open(&db_path).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.node_count(), original.nodes().len());
    assert_eq!(loaded.edge_count(), original.edges().len());
    assert!(loaded.get_node("p.Foo").is_some());
}

#[test]
fn inheritance_depth_sees_the_complete_graph_in_the_global_phase() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("A.java"), "package p;\nclass A {}\n").unwrap();
    fs::write(dir.path().join("B.java"), "package p;\nclass B extends A {}\n").unwrap();
    fs::write(dir.path().join("C.java"), "package p;\nclass C extends B {}\n").unwrap();

    let config = KernelConfig::new(dir.path());
    let snapshot = analyze_project(config).unwrap();

    let depth_of = |id: &str| {
        snapshot
            .nodes()
            .iter()
            .find(|n| n.id() == id)
            .unwrap()
            .metrics()
            .get("inheritance_depth")
            .unwrap()
            .as_f64()
    };

    assert_eq!(depth_of("p.A"), 0.0);
    assert_eq!(depth_of("p.B"), 1.0);
    assert_eq!(depth_of("p.C"), 2.0);
}
