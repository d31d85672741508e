//! Embedded relational schema: two tables plus a read-only stats view.
//!
//! Column types are semantic, not literal SQLite storage classes: `TEXT`
//! columns are short strings (id, node_type, edge_type, display_label);
//! `BLOB` columns hold canonical JSON bytes for the sparse/heterogeneous
//! payloads (`properties`, `metrics`, `tags`, `kind_data`). BLOB rather
//! than TEXT so the load path can use SQLite's incremental-blob-I/O API
//! (`Connection::blob_open`) and genuinely exercise the decode-before-
//! session-release invariant instead of merely asserting it.
//!
//! `kind_data` is one column beyond `properties`/`metrics`/`tags`: it
//! holds the node variant's own typed fields
//! (`ProjectFile`/`JavaClassNode`/`PackageNode`), which are distinct from
//! the free-form `properties` bag. Folding them into `properties` would
//! blur a real distinction in the data model for no benefit; a dedicated
//! BLOB column keeps the schema JSON-stable the same way `properties`
//! does. See DESIGN.md's Open Question log.
//!
//! Schema creation is idempotent: every statement is `IF NOT EXISTS`.

pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id              TEXT PRIMARY KEY,
    node_type       TEXT NOT NULL,
    display_label   TEXT NOT NULL,
    kind_data       BLOB NOT NULL,
    properties      BLOB NOT NULL,
    metrics         BLOB NOT NULL,
    tags            BLOB NOT NULL,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_nodes_node_type ON nodes(node_type);
CREATE INDEX IF NOT EXISTS idx_nodes_created_at ON nodes(created_at);

CREATE TABLE IF NOT EXISTS edges (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id       TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    target_id       TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    edge_type       TEXT NOT NULL,
    metadata        BLOB NOT NULL,
    created_at      INTEGER NOT NULL,
    UNIQUE(source_id, target_id, edge_type)
);

CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);
CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(edge_type);

CREATE VIEW IF NOT EXISTS graph_statistics AS
SELECT
    (SELECT COUNT(*) FROM nodes) AS node_count,
    (SELECT COUNT(*) FROM edges) AS edge_count,
    (SELECT COUNT(DISTINCT node_type) FROM nodes) AS distinct_node_types,
    (SELECT COUNT(DISTINCT edge_type) FROM edges) AS distinct_edge_types;
"#;

/// Row counts from `graph_statistics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStatistics {
    pub node_count: i64,
    pub edge_count: i64,
    pub distinct_node_types: i64,
    pub distinct_edge_types: i64,
}
