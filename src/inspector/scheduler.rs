//! The scheduler: phase sequencing, the multi-pass-to-convergence
//! algorithm, and the global phase.
//!
//! `needs` ordering is resolved by a plain Kahn's-algorithm topological
//! sort over a name-keyed adjacency map, written by hand rather than
//! reaching for a graph crate — small, explicit traversal code over a
//! dependency like `petgraph`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{CollectionError, ConfigurationError, ContractViolation, InspectionError, KernelError};
use crate::inspector::{Inspector, InspectorDescriptor};
use crate::repository::Repository;

/// Checked between inspectors and between nodes; cooperative, never
/// preemptive. Cloning shares the same underlying flag.
#[derive(Clone, Default, Debug)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_passes: usize,
    pub parallel: bool,
    /// `None` means unbounded; per-error logging happens regardless.
    pub error_budget: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_passes: 5, parallel: true, error_budget: None }
    }
}

/// Everything captured along the way: nothing here aborts the run except
/// an exceeded error budget, which is reported but left for the caller to
/// act on.
#[derive(Debug, Default)]
pub struct RunReport {
    pub collection_errors: Vec<CollectionError>,
    pub inspection_errors: Vec<InspectionError>,
    pub contract_violations: Vec<ContractViolation>,
    pub file_passes_run: usize,
    pub file_phase_converged: bool,
    pub class_passes_run: usize,
    pub class_phase_converged: bool,
}

impl RunReport {
    pub fn error_count(&self) -> usize {
        self.inspection_errors.len() + self.collection_errors.len()
    }

    /// True once the configured error budget (if any) has been exceeded.
    pub fn budget_exceeded(&self, config: &SchedulerConfig) -> bool {
        config.error_budget.map(|budget| self.error_count() > budget).unwrap_or(false)
    }
}

/// Run phases 3 through 5 (multi-pass on files, global on files,
/// multi-pass on classes, global on classes). Phases 1 and 2
/// (file-level detection, collection) are driven by the kernel entry
/// point directly since they are one-shot, not multi-pass.
pub fn run_node_phases(
    repo: &mut Repository,
    file_inspectors: &[Box<dyn Inspector>],
    class_inspectors: &[Box<dyn Inspector>],
    package_inspectors: &[Box<dyn Inspector>],
    config: &SchedulerConfig,
    cancel: &CancellationToken,
) -> Result<RunReport, KernelError> {
    let mut report = RunReport::default();

    let (passes, converged) = run_multi_pass(repo, file_inspectors, "file", config, cancel, &mut report)?;
    report.file_passes_run = passes;
    report.file_phase_converged = converged;
    if cancel.is_cancelled() {
        return Err(KernelError::Cancelled);
    }

    run_global_phase(repo, file_inspectors, "file", cancel, &mut report)?;
    if cancel.is_cancelled() {
        return Err(KernelError::Cancelled);
    }

    let (passes, converged) = run_multi_pass(repo, class_inspectors, "java_class", config, cancel, &mut report)?;
    report.class_passes_run = passes;
    report.class_phase_converged = converged;
    if cancel.is_cancelled() {
        return Err(KernelError::Cancelled);
    }

    run_global_phase(repo, class_inspectors, "java_class", cancel, &mut report)?;
    if cancel.is_cancelled() {
        return Err(KernelError::Cancelled);
    }
    run_global_phase(repo, package_inspectors, "package", cancel, &mut report)?;
    if cancel.is_cancelled() {
        return Err(KernelError::Cancelled);
    }

    Ok(report)
}

/// Phase 1 (file-level detection): a single pass over the file inspectors,
/// run before collection so cheap tags like `language:java` exist for
/// `JavaSourceCollectionInspector` to key off. Phases 3/3.5 (`run_node_phases`)
/// run the same inspector set again to convergence; re-running here is
/// idempotent, not wasted work, since tags/metrics only change when their
/// underlying source value changes.
pub fn run_file_detection(
    repo: &mut Repository,
    file_inspectors: &[Box<dyn Inspector>],
    report: &mut RunReport,
) -> Result<(), KernelError> {
    let config = SchedulerConfig { max_passes: 1, ..Default::default() };
    let cancel = CancellationToken::new();
    run_multi_pass(repo, file_inspectors, "file", &config, &cancel, report)?;
    Ok(())
}

fn run_multi_pass(
    repo: &mut Repository,
    inspectors: &[Box<dyn Inspector>],
    node_kind: &str,
    config: &SchedulerConfig,
    cancel: &CancellationToken,
    report: &mut RunReport,
) -> Result<(usize, bool), KernelError> {
    let candidates: Vec<&Box<dyn Inspector>> = inspectors
        .iter()
        .filter(|i| !i.descriptor().requires_all_nodes_processed)
        .collect();
    if candidates.is_empty() {
        return Ok((0, true));
    }

    let ordered = topological_order(&candidates)?;

    let mut passes_run = 0;
    let mut converged = false;

    for pass in 1..=config.max_passes {
        if cancel.is_cancelled() {
            break;
        }
        passes_run = pass;
        let mut any_change = false;
        let mut changed_inspectors: Vec<&'static str> = Vec::new();

        for inspector in &ordered {
            if cancel.is_cancelled() {
                break;
            }
            let descriptor = inspector.descriptor();
            let changed = run_one_inspector(repo, inspector.as_ref(), &descriptor, node_kind, config, cancel, report);
            if changed {
                any_change = true;
                changed_inspectors.push(descriptor.name);
            }
        }

        if !any_change {
            converged = true;
            debug!(node_kind, pass, "multi-pass: converged");
            break;
        }
    }

    if !converged && !cancel.is_cancelled() {
        warn!(node_kind, max_passes = config.max_passes, "multi-pass: max_passes reached without convergence");
    }

    Ok((passes_run, converged))
}

fn run_one_inspector(
    repo: &mut Repository,
    inspector: &dyn Inspector,
    descriptor: &InspectorDescriptor,
    node_kind: &str,
    config: &SchedulerConfig,
    cancel: &CancellationToken,
    report: &mut RunReport,
) -> bool {
    // Per the concurrency model, two inspectors may run concurrently on
    // different nodes but never on the same one, and a single-threaded
    // implementation is conforming. Mutation here goes through one
    // `&mut Repository`, including `add_edge`'s dangling-reference check
    // against the shared edge index, so this dispatch loop stays
    // sequential; `config.parallel` instead governs the independent,
    // side-effect-free collection phase (file walking, archive reads) in
    // `kernel::analyze_project`, where rayon's `par_iter` has no shared
    // mutable state to serialize around.
    let _ = config.parallel;
    let ids: Vec<String> = repo.nodes_of_type(node_kind).map(|n| n.id().to_string()).collect();
    let mut any_change = false;
    for id in ids {
        if cancel.is_cancelled() {
            break;
        }
        let eligible = match repo.get_node(&id) {
            Some(node) => node.has_all_tags(descriptor.requires.iter().copied()),
            None => false,
        };
        if !eligible {
            continue;
        }

        let before = match repo.get_node(&id) {
            Some(node) => node.clone(),
            None => continue,
        };

        let mut handle = match repo.node_handle(&id) {
            Some(h) => h,
            None => continue,
        };

        match inspector.inspect(&mut handle) {
            Ok(()) => {
                let changed = handle.changed();
                drop(handle);
                if changed {
                    any_change = true;
                }
                if let Some(node) = repo.get_node(&id) {
                    for tag in descriptor.produces {
                        if !node.has_tag(tag) {
                            report.contract_violations.push(ContractViolation::MissingProducedTag {
                                inspector: descriptor.name.to_string(),
                                node_id: id.clone(),
                                tag: tag.to_string(),
                            });
                        }
                    }
                }
            }
            Err(err) => {
                drop(handle);
                if let Some(slot) = repo.node_mut(&id) {
                    *slot = before;
                }
                report.inspection_errors.push(InspectionError {
                    inspector: descriptor.name.to_string(),
                    node_id: id.clone(),
                    message: err.to_string(),
                });
            }
        }

        if report.budget_exceeded(config) {
            warn!(inspector = descriptor.name, "error budget exceeded; continuing to completion of this node set");
        }
    }

    any_change
}

fn run_global_phase(
    repo: &mut Repository,
    inspectors: &[Box<dyn Inspector>],
    node_kind: &str,
    cancel: &CancellationToken,
    report: &mut RunReport,
) -> Result<(), KernelError> {
    let globals: Vec<&Box<dyn Inspector>> = inspectors
        .iter()
        .filter(|i| i.descriptor().requires_all_nodes_processed)
        .collect();
    if globals.is_empty() {
        return Ok(());
    }

    let ordered = topological_order(&globals)?;
    for inspector in ordered {
        if cancel.is_cancelled() {
            break;
        }
        let descriptor = inspector.descriptor();
        let config = SchedulerConfig { error_budget: None, ..Default::default() };
        info!(inspector = descriptor.name, node_kind, "global phase: running");
        run_one_inspector(repo, inspector.as_ref(), &descriptor, node_kind, &config, cancel, report);
    }

    Ok(())
}

/// Kahn's-algorithm topological sort over `needs`. An inspector whose
/// `needs` name is not present in this candidate set is treated as already
/// satisfied (the dependency belongs to a different phase/kind). Cycles
/// are reported with the set of names involved, never guessed at.
fn topological_order<'a>(
    inspectors: &'a [&'a Box<dyn Inspector>],
) -> Result<Vec<&'a Box<dyn Inspector>>, KernelError> {
    let descriptors: Vec<InspectorDescriptor> = inspectors.iter().map(|i| i.descriptor()).collect();
    let name_index: HashMap<&str, usize> =
        descriptors.iter().enumerate().map(|(i, d)| (d.name, i)).collect();

    let mut in_degree = vec![0usize; descriptors.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];

    for (i, d) in descriptors.iter().enumerate() {
        for needed in d.needs {
            if let Some(&j) = name_index.get(needed) {
                dependents[j].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> =
        in_degree.iter().enumerate().filter(|(_, &d)| d == 0).map(|(i, _)| i).collect();
    let mut order = Vec::with_capacity(descriptors.len());
    let mut visited = HashSet::new();

    while let Some(i) = queue.pop_front() {
        order.push(i);
        visited.insert(i);
        for &j in &dependents[i] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                queue.push_back(j);
            }
        }
    }

    if order.len() != descriptors.len() {
        let cyclic: Vec<&str> = (0..descriptors.len())
            .filter(|i| !visited.contains(i))
            .map(|i| descriptors[i].name)
            .collect();
        return Err(ConfigurationError::Cycle(cyclic.join(" -> ")).into());
    }

    Ok(order.into_iter().map(|i| inspectors[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::ProjectFile;
    use crate::graph::{GraphNode, NodeKind};
    use crate::inspector::{FileInspector, InspectorDescriptor};

    struct TagSetter {
        name: &'static str,
        requires: &'static [&'static str],
        needs: &'static [&'static str],
        sets: &'static str,
    }

    impl Inspector for TagSetter {
        fn descriptor(&self) -> InspectorDescriptor {
            InspectorDescriptor {
                name: self.name,
                supported_kind: "file",
                requires: self.requires,
                needs: self.needs,
                produces: std::slice::from_ref(&self.sets),
                requires_all_nodes_processed: false,
            }
        }

        fn inspect(&self, handle: &mut crate::graph::NodeHandle) -> crate::error::Result<()> {
            handle.enable_tag(self.sets)
        }
    }
    impl FileInspector for TagSetter {}

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
    fn cycle_in_needs_is_reported_as_configuration_error() {
        let a: Box<dyn Inspector> =
            Box::new(TagSetter { name: "A", requires: &[], needs: &["B"], sets: "a" });
        let b: Box<dyn Inspector> =
            Box::new(TagSetter { name: "B", requires: &[], needs: &["A"], sets: "b" });
        let inspectors = vec![a, b];
        let refs: Vec<&Box<dyn Inspector>> = inspectors.iter().collect();

        let err = topological_order(&refs).unwrap_err();
        assert!(matches!(err, KernelError::Configuration(ConfigurationError::Cycle(_))));
    }

    #[test]
    fn chained_requires_resolve_within_one_pass() {
        let mut repo = Repository::new();
        repo.add_node(file_node("a")).unwrap();

        let first: Box<dyn Inspector> =
            Box::new(TagSetter { name: "first", requires: &[], needs: &[], sets: "stage:one" });
        let second: Box<dyn Inspector> = Box::new(TagSetter {
            name: "second",
            requires: &["stage:one"],
            needs: &["first"],
            sets: "stage:two",
        });

        let config = SchedulerConfig::default();
        let cancel = CancellationToken::new();
        let mut report = RunReport::default();
        let (_, converged) =
            run_multi_pass(&mut repo, &[first, second], "file", &config, &cancel, &mut report).unwrap();

        assert!(converged);
        let node = repo.get_node("a").unwrap();
        assert!(node.has_tag("stage:one"));
        assert!(node.has_tag("stage:two"));
    }

    #[test]
    fn converges_without_further_changes_on_second_run() {
        let mut repo = Repository::new();
        repo.add_node(file_node("a")).unwrap();

        let setter: Box<dyn Inspector> =
            Box::new(TagSetter { name: "setter", requires: &[], needs: &[], sets: "done" });
        let config = SchedulerConfig::default();
        let cancel = CancellationToken::new();
        let mut report = RunReport::default();

        run_multi_pass(&mut repo, std::slice::from_ref(&setter), "file", &config, &cancel, &mut report).unwrap();
        let revision_after_first = repo.revision();

        let mut report2 = RunReport::default();
        run_multi_pass(&mut repo, std::slice::from_ref(&setter), "file", &config, &cancel, &mut report2).unwrap();

        assert_eq!(repo.revision(), revision_after_first);
    }
}
