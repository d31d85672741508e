//! `SourceFileCollector`: walks a project root and yields `ProjectFile` nodes.
//!
//! Walking goes through `ignore::WalkBuilder` rather than hand-rolled
//! recursion, so `.gitignore`-style excludes are honored for free; the
//! include/exclude lists on top of that are plain `glob::Pattern`s matched
//! against the path relative to the project root.

use std::path::{Path, PathBuf};

use glob::Pattern;
use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::debug;

use crate::collector::{CollectionContext, Collector};
use crate::error::CollectionError;
use crate::graph::node::ProjectFile;
use crate::graph::{GraphNode, NodeKind};

pub struct SourceFileCollector {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl SourceFileCollector {
    /// No filters: every regular file under the root is collected.
    pub fn new() -> Self {
        Self { include: Vec::new(), exclude: Vec::new() }
    }

    pub fn with_filters(include: &[&str], exclude: &[&str]) -> Self {
        Self {
            include: include.iter().filter_map(|p| Pattern::new(p).ok()).collect(),
            exclude: exclude.iter().filter_map(|p| Pattern::new(p).ok()).collect(),
        }
    }

    fn relative_id(&self, project_root: &Path, path: &Path) -> String {
        path.strip_prefix(project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn passes_filters(&self, relative: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(relative)) {
            return false;
        }
        if self.exclude.iter().any(|p| p.matches(relative)) {
            return false;
        }
        true
    }

    /// Walk `ctx.project_root`, collecting a `ProjectFile` node for every
    /// regular file that passes the include/exclude filters and is not
    /// already present in the repository. Per-file I/O errors are captured
    /// and returned alongside the successfully collected nodes.
    ///
    /// Directory walking (via `ignore::WalkBuilder`) always runs on this
    /// thread, since it is inherently sequential. When `parallel` is true,
    /// the per-file read-and-parse step (`self.collect`) fans out over
    /// `rayon`: each file is independent, side-effect-free, and only reads
    /// `ctx.repository` (never mutates it), so there is no shared state to
    /// serialize around. `parallel = false` keeps the conforming
    /// single-threaded path.
    pub fn collect_all(&self, ctx: &CollectionContext, parallel: bool) -> (Vec<GraphNode>, Vec<CollectionError>) {
        let mut candidates = Vec::new();
        let mut errors = Vec::new();

        let walker = WalkBuilder::new(ctx.project_root).build();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    errors.push(CollectionError::UnreadableFile {
                        path: ctx.project_root.display().to_string(),
                        source: std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
                    });
                    continue;
                }
            };

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let path = entry.path().to_path_buf();
            if !self.can_collect(&path) {
                continue;
            }
            candidates.push(path);
        }

        let results: Vec<Result<Vec<GraphNode>, CollectionError>> = if parallel {
            candidates.par_iter().map(|path| self.collect(path, ctx)).collect()
        } else {
            candidates.iter().map(|path| self.collect(path, ctx)).collect()
        };

        let mut nodes = Vec::new();
        for result in results {
            match result {
                Ok(mut produced) => nodes.append(&mut produced),
                Err(err) => errors.push(err),
            }
        }

        nodes.retain(|n| !ctx.already_collected(n.id()));
        (nodes, errors)
    }
}

impl Default for SourceFileCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector<PathBuf, GraphNode> for SourceFileCollector {
    fn can_collect(&self, input: &PathBuf) -> bool {
        input.is_file()
    }

    fn collect(&self, input: &PathBuf, ctx: &CollectionContext) -> Result<Vec<GraphNode>, CollectionError> {
        let relative = self.relative_id(ctx.project_root, input);
        if !self.passes_filters(&relative) || ctx.already_collected(&relative) {
            return Ok(Vec::new());
        }

        let metadata = std::fs::metadata(input).map_err(|source| CollectionError::UnreadableFile {
            path: input.display().to_string(),
            source,
        })?;

        let extension = input
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        let node = GraphNode::new(
            relative.clone(),
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: input.display().to_string(),
                extension,
                size_bytes: metadata.len(),
                language: None,
            }),
            relative,
        );

        debug!(path = %input.display(), "source_file_collector: collected");
        Ok(vec![node])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;
    use std::io::Write;

    #[test]
    fn collects_project_files_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        let mut f = std::fs::File::create(dir.path().join("src/Foo.java")).unwrap();
        writeln!(f, "package x; class Foo {{}}").unwrap();

        let repo = Repository::new();
        let ctx = CollectionContext::new(&repo, dir.path());
        let collector = SourceFileCollector::new();
        let (nodes, errors) = collector.collect_all(&ctx, true);

        assert!(errors.is_empty());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id(), "src/Foo.java");
    }

    #[test]
    fn exclude_filter_skips_matching_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::File::create(dir.path().join("target/Foo.class")).unwrap();
        std::fs::File::create(dir.path().join("Main.java")).unwrap();

        let repo = Repository::new();
        let ctx = CollectionContext::new(&repo, dir.path());
        let collector = SourceFileCollector::with_filters(&[], &["target/*"]);
        let (nodes, _) = collector.collect_all(&ctx, false);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id(), "Main.java");
    }
}
