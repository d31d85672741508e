//! The library's single public orchestration entry point. Wires collection,
//! the five inspector phases, and persistence together; a CLI, YAML plan
//! engine, and export formatters are out-of-scope collaborators that would
//! sit on top of this function.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::collector::{CollectionContext, Collector, SourceFileCollector};
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::inspector::impls::{
    ExtensionLanguageInspector, InheritanceDepthInspector, JavaClassOriginInspector, JavaLocMetricInspector,
    JavaSourceCollectionInspector, PackageMembershipInspector,
};
use crate::inspector::registry::Registry;
use crate::inspector::scheduler::{self, RunReport, SchedulerConfig};
use crate::repository::{Repository, Snapshot};
use crate::store::SqliteStore;

/// Builds the core inspector set named in the representative registration
/// list. Callers who need a different or extended set construct their own
/// `Registry`; `analyze_project` is a convenience wrapper around it.
fn default_registry(config: &KernelConfig) -> Registry {
    let mut registry = Registry::new();
    if config.allows_inspector("ExtensionLanguageInspector") {
        registry.register_file(ExtensionLanguageInspector);
    }
    if config.allows_inspector("JavaLocMetricInspector") {
        registry.register_file(JavaLocMetricInspector);
    }
    if config.allows_inspector("JavaClassOriginInspector") {
        registry.register_class(JavaClassOriginInspector);
    }
    if config.allows_inspector("InheritanceDepthInspector") {
        registry.register_class(InheritanceDepthInspector);
    }
    if config.allows_inspector("PackageMembershipInspector") {
        registry.register_package(PackageMembershipInspector);
    }
    registry
}

/// Run one full analysis of `config.project_root`: walk the project for
/// files, tag languages, collect Java classes and packages, run the
/// inspector framework to convergence, persist to `config.database_path`
/// if given, and write a run report alongside it.
pub fn analyze_project(config: KernelConfig) -> Result<Snapshot> {
    let registry = default_registry(&config);
    registry.validate()?;

    let mut repo = Repository::new();
    let mut report = RunReport::default();

    collect_source_files(&mut repo, &config.project_root, config.parallel, &mut report);

    // Phase 1: file-level detection. Runs before collection so
    // `language:java` exists for the collection trigger below.
    scheduler::run_file_detection(&mut repo, registry.file_inspectors(), &mut report)?;

    // Phase 2: collection. Not dispatched through the scheduler —
    // `JavaSourceCollectionInspector` adds nodes, which a `NodeHandle`
    // cannot do.
    if config.allows_inspector("JavaSourceCollectionInspector") {
        let collector = JavaSourceCollectionInspector::default();
        let (collected, errors) = collector.run(&mut repo, &config.project_root);
        info!(collected, errors = errors.len(), "collection phase complete");
        report.collection_errors.extend(errors);
    }

    // Phases 3-5: multi-pass on files, global on files, multi-pass on
    // classes, global on classes, global on packages.
    let scheduler_config = SchedulerConfig {
        max_passes: config.max_passes,
        parallel: config.parallel,
        error_budget: config.error_budget,
    };
    let cancel = config.cancellation.clone().unwrap_or_default();
    let phase_report = scheduler::run_node_phases(
        &mut repo,
        registry.file_inspectors(),
        registry.class_inspectors(),
        registry.package_inspectors(),
        &scheduler_config,
        &cancel,
    )?;
    merge_phase_report(&mut report, phase_report);

    if report.budget_exceeded(&scheduler_config) {
        warn!(
            errors = report.error_count(),
            budget = ?scheduler_config.error_budget,
            "analysis run exceeded its configured error budget"
        );
        write_run_report(&config.project_root, &report);
        return Err(KernelError::BudgetExceeded {
            failed: report.error_count(),
            budget: scheduler_config.error_budget.expect("budget_exceeded implies error_budget is Some"),
        });
    }

    if let Some(database_path) = &config.database_path {
        let store = SqliteStore::open(database_path)?;
        store.persist(&repo)?;
    }

    write_run_report(&config.project_root, &report);

    Ok(repo.snapshot())
}

fn collect_source_files(repo: &mut Repository, project_root: &Path, parallel: bool, report: &mut RunReport) {
    let collector = SourceFileCollector::new();
    let ctx = CollectionContext::new(repo, project_root);
    let (nodes, errors) = collector.collect_all(&ctx, parallel);
    drop(ctx);

    for node in nodes {
        // Collectors already filter out ids the repository holds, so this
        // only fails on a benign race with another writer; log and move on.
        if let Err(err) = repo.add_node(node) {
            warn!(%err, "dropped duplicate node from source-file collection");
        }
    }
    report.collection_errors.extend(errors);
}

fn merge_phase_report(report: &mut RunReport, phase_report: RunReport) {
    report.collection_errors.extend(phase_report.collection_errors);
    report.inspection_errors.extend(phase_report.inspection_errors);
    report.contract_violations.extend(phase_report.contract_violations);
    report.file_passes_run = phase_report.file_passes_run;
    report.file_phase_converged = phase_report.file_phase_converged;
    report.class_passes_run = phase_report.class_passes_run;
    report.class_phase_converged = phase_report.class_phase_converged;
}

/// Best-effort: a failure to write the run report never fails the run
/// itself, since the `Snapshot` the caller already has is the source of
/// truth.
fn write_run_report(project_root: &Path, report: &RunReport) {
    let dir = project_root.join(".analysis");
    if let Err(err) = fs::create_dir_all(&dir) {
        warn!(%err, path = %dir.display(), "could not create .analysis directory for run report");
        return;
    }

    let summary = serde_json::json!({
        "collection_errors": report.collection_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "inspection_errors": report.inspection_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "contract_violations": report.contract_violations.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "file_passes_run": report.file_passes_run,
        "file_phase_converged": report.file_phase_converged,
        "class_passes_run": report.class_passes_run,
        "class_phase_converged": report.class_phase_converged,
    });

    let path = dir.join("run_report.json");
    match serde_json::to_vec_pretty(&summary) {
        Ok(bytes) => {
            if let Err(err) = fs::write(&path, bytes) {
                warn!(%err, path = %path.display(), "could not write run report");
            }
        }
        Err(err) => warn!(%err, "could not serialize run report"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::inspector::scheduler::CancellationToken;

    #[test]
    fn analysis_fails_when_the_configured_error_budget_is_exceeded() {
        let dir = tempdir().unwrap();
        let missing_root = dir.path().join("does-not-exist");

        let config = KernelConfig::new(&missing_root).with_error_budget(0);
        let err = analyze_project(config).unwrap_err();

        assert!(matches!(err, KernelError::BudgetExceeded { .. }));
    }

    #[test]
    fn an_externally_held_cancellation_token_is_honored_by_analyze_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Foo.java"), "package p;\nclass Foo {}\n").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let config = KernelConfig::new(dir.path()).with_cancellation(token);

        let err = analyze_project(config).unwrap_err();
        assert!(matches!(err, KernelError::Cancelled));
    }

    #[test]
    fn analyzes_a_single_file_java_project() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("Foo.java"),
            "package com.example;\npublic class Foo {\n    int x = 1;\n}\n",
        )
        .unwrap();

        let config = KernelConfig::new(dir.path());
        let snapshot = analyze_project(config).unwrap();

        assert!(snapshot.nodes().iter().any(|n| n.node_type() == "java_class"));
        assert!(snapshot.nodes().iter().any(|n| n.node_type() == "package"));
    }

    #[test]
    fn empty_project_produces_an_empty_snapshot() {
        let dir = tempdir().unwrap();
        let config = KernelConfig::new(dir.path());
        let snapshot = analyze_project(config).unwrap();
        assert!(snapshot.nodes().is_empty());
    }

    #[test]
    fn persists_to_the_configured_database_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Foo.java"), "package p;\nclass Foo {}\n").unwrap();

        let db_path = dir.path().join("graph.sqlite");
        let config = KernelConfig::new(dir.path()).with_database_path(&db_path);
        analyze_project(config).unwrap();

        let store = SqliteStore::open(&db_path).unwrap();
        let stats = store.statistics().unwrap();
        assert!(stats.node_count > 0);
    }
}
