//! Error taxonomy for the analysis kernel.
//!
//! Recovery mode differs by variant: configuration errors are fatal and
//! abort before any phase runs; collection/inspection errors are captured
//! per-item into a `RunReport` and never unwind the scheduler; storage
//! errors propagate directly from the persistent store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KernelError>;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error budget exceeded: {failed} failures over budget of {budget}")]
    BudgetExceeded { failed: usize, budget: usize },
}

/// Fatal errors that abort a run before any phase executes.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("cycle in inspector `needs`: {0}")]
    Cycle(String),

    #[error("duplicate inspector name: {0}")]
    DuplicateInspector(String),

    #[error("unknown node variant in supported_kind: {0}")]
    UnknownNodeKind(String),
}

/// Per-input failure produced by a `Collector`. Captured into the run
/// report; never aborts the run.
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("unreadable file {path}: {source}")]
    UnreadableFile { path: String, source: std::io::Error },

    #[error("malformed archive entry {entry} in {archive}: {message}")]
    MalformedArchiveEntry {
        archive: String,
        entry: String,
        message: String,
    },
}

/// Per-node failure produced by an `Inspector`. Captured into the run
/// report; the node reverts to its pre-invocation state.
#[derive(Error, Debug)]
#[error("inspector `{inspector}` failed on node `{node_id}`: {message}")]
pub struct InspectionError {
    pub inspector: String,
    pub node_id: String,
    pub message: String,
}

/// Success-path contract violation: a warning, not a hard failure.
#[derive(Error, Debug, Clone)]
pub enum ContractViolation {
    #[error("inspector `{inspector}` declared produces `{tag}` but did not set it on `{node_id}`")]
    MissingProducedTag {
        inspector: String,
        node_id: String,
        tag: String,
    },

    #[error("duplicate edge rejected: ({source} -> {target}, {edge_type})")]
    DuplicateEdge {
        source: String,
        target: String,
        edge_type: String,
    },
}

/// Errors from the in-memory repository and the persistent store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("node already exists: {0}")]
    AlreadyExists(String),

    #[error("edge references missing endpoint: ({source} -> {target}, {edge_type})")]
    DanglingReference {
        source: String,
        target: String,
        edge_type: String,
    },

    #[error("load failed: {0}")]
    LoadFailed(String),

    #[error("persist failed: {0}")]
    PersistFailed(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Stable string code for callers that branch on error kind without
    /// matching the full enum.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "NOT_FOUND",
            StorageError::AlreadyExists(_) => "ALREADY_EXISTS",
            StorageError::DanglingReference { .. } => "DANGLING_REFERENCE",
            StorageError::LoadFailed(_) => "LOAD_FAILED",
            StorageError::PersistFailed(_) => "PERSIST_FAILED",
            StorageError::Sqlite(_) => "STORAGE_BACKEND",
            StorageError::Json(_) => "JSON_CODEC",
        }
    }
}
