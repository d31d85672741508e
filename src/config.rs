//! `KernelConfig`: the single plain struct driving `kernel::analyze_project`.
//! No singleton, no global mutable state, per the re-architecture decision
//! recorded in DESIGN.md.

use std::path::PathBuf;

use crate::inspector::scheduler::CancellationToken;

/// Inputs to one analysis run. `inspectors`/`package_filters` are allow-lists;
/// `None` means "all registered", matching the CLI-facing contract this
/// mirrors (a CLI itself is out of scope for this crate).
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub project_root: PathBuf,
    /// `None` runs against an in-memory store only; the snapshot is still
    /// returned but nothing is written to disk.
    pub database_path: Option<PathBuf>,
    /// Restrict the run to these inspector names. `None` runs every
    /// registered inspector.
    pub inspectors: Option<Vec<String>>,
    pub max_passes: usize,
    pub package_filters: Option<Vec<String>>,
    pub parallel: bool,
    pub error_budget: Option<usize>,
    /// `None` has `analyze_project` mint its own token, equivalent to a run
    /// no caller can ever cancel. Supply one to hold the other end yourself
    /// (e.g. signal it from a Ctrl-C handler on another thread).
    pub cancellation: Option<CancellationToken>,
}

impl KernelConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            database_path: None,
            inspectors: None,
            max_passes: 5,
            package_filters: None,
            parallel: true,
            error_budget: None,
            cancellation: None,
        }
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn with_inspectors(mut self, names: Vec<String>) -> Self {
        self.inspectors = Some(names);
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_package_filters(mut self, filters: Vec<String>) -> Self {
        self.package_filters = Some(filters);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_error_budget(mut self, budget: usize) -> Self {
        self.error_budget = Some(budget);
        self
    }

    /// Hold onto `token` elsewhere and call `token.cancel()` to stop this
    /// run early; `analyze_project` checks it between passes, between
    /// inspectors, and between nodes within one inspector's pass.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Whether `name` should run, honoring the `inspectors` allow-list.
    pub fn allows_inspector(&self, name: &str) -> bool {
        match &self.inspectors {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }

    /// Whether `package` should be collected/analyzed, honoring
    /// `package_filters`. An empty or absent filter list allows everything.
    pub fn allows_package(&self, package: &str) -> bool {
        match &self.package_filters {
            Some(filters) if !filters.is_empty() => filters.iter().any(|f| package.starts_with(f.as_str())),
            _ => true,
        }
    }
}
