//! Collectors: code that turns raw inputs (files, archive entries, class
//! bytes) into `GraphNode`s. Never produces edges; never sets tags that an
//! inspector declares in its `produces` list — that's an inspector's job.

pub mod binary_class;
pub mod java_source;
pub mod source_file;

use std::path::Path;

use crate::error::CollectionError;
use crate::graph::GraphNode;
use crate::repository::Repository;

pub use binary_class::BinaryClassCollector;
pub use java_source::JavaSourceCollector;
pub use source_file::SourceFileCollector;

/// What a collector is allowed to see while producing nodes: the
/// in-progress repository (for existence checks, so a collector never
/// emits a duplicate id) and the project root (for path normalization).
pub struct CollectionContext<'a> {
    pub repository: &'a Repository,
    pub project_root: &'a Path,
}

impl<'a> CollectionContext<'a> {
    pub fn new(repository: &'a Repository, project_root: &'a Path) -> Self {
        Self { repository, project_root }
    }

    /// True if a node with this id is already present — collectors use this
    /// to stay duplicate-free without needing write access to the repository.
    pub fn already_collected(&self, id: &str) -> bool {
        self.repository.get_node(id).is_some()
    }
}

/// `Collector<S, T>`: converts source items of type `S` into nodes.
/// Failures on a single input are per-item (`CollectionError`), never fatal;
/// callers capture them into a run report and continue with the next input.
pub trait Collector<S, T> {
    /// Decide membership without side effects.
    fn can_collect(&self, input: &S) -> bool;

    /// Produce zero or more nodes for one input. Must not produce
    /// duplicates of nodes already present in `ctx.repository`.
    fn collect(&self, input: &S, ctx: &CollectionContext) -> Result<Vec<T>, CollectionError>;
}
