//! `jakern`: a static-analysis kernel and persistent property graph store
//! for Java codebases.
//!
//! A project is walked into a graph of `ProjectFile`/`JavaClassNode`/
//! `PackageNode` nodes, decorated by dependency-ordered, tag-gated
//! inspectors running to convergence, and optionally persisted to an
//! embedded SQLite store. [`kernel::analyze_project`] is the single public
//! orchestration entry point; the other modules are usable independently
//! by a caller assembling a custom inspector set or querying a graph
//! already on disk.

pub mod collector;
pub mod config;
pub mod error;
pub mod graph;
pub mod inspector;
pub mod kernel;
pub mod query;
pub mod repository;
pub mod serialization;
pub mod store;
pub mod value;

pub use config::KernelConfig;
pub use error::{KernelError, Result};
pub use kernel::analyze_project;
pub use repository::{Repository, Snapshot};
