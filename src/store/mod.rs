//! The persistent graph store: an embedded SQLite database with JSON-blob
//! columns for the sparse property/metric/tag payloads.
//!
//! Two query styles per the design: `persist`/`load` are single-shot —
//! they open a session, do the work, and close it, safe for the bounded,
//! whole-graph operations they perform. `open_session` hands back a
//! `SessionHandle` for callers (the Query Surface, when store-backed)
//! that want to share one session across several queries.

pub mod schema;
pub mod session;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::params;
use tracing::info;

use crate::error::{Result, StorageError};
use crate::graph::edge::GraphEdge;
use crate::graph::node::{GraphNode, NodeKind};
use crate::repository::Repository;
use crate::serialization;
use crate::value::PropertyValue;

pub use schema::GraphStatistics;
pub use session::SessionHandle;

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

static MEMORY_STORE_COUNTER: AtomicU64 = AtomicU64::new(0);

enum Backend {
    File(PathBuf),
    /// A named, shared-cache in-memory database. `_anchor` is never read
    /// again but must outlive every session opened against `uri` — SQLite
    /// discards a shared-cache memory database as soon as its last
    /// connection closes, and without this every `new_session()` call
    /// would otherwise open a connection to a fresh, empty database.
    Memory { uri: String, _anchor: SessionHandle },
}

/// Embedded relational store backing one analysis run's database file.
pub struct SqliteStore {
    backend: Backend,
}

impl SqliteStore {
    /// Open (creating if absent) the on-disk database at `path`, running
    /// idempotent schema creation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Open-and-drop to create the schema eagerly; every later call
        // opens its own short-lived session rather than holding this one.
        let _ = SessionHandle::open(&path)?;
        Ok(Self { backend: Backend::File(path) })
    }

    /// An ephemeral, never-persisted-to-disk store, used for ephemeral
    /// analysis runs and tests. Backed by a uniquely-named shared-cache
    /// in-memory database so repeated `persist`/`load` calls against the
    /// same `SqliteStore` value see each other's writes, the same way two
    /// calls against an on-disk path do.
    pub fn open_in_memory() -> Result<Self> {
        let id = MEMORY_STORE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let uri = format!("file:jakern_mem_{id}?mode=memory&cache=shared");
        let anchor = SessionHandle::open_shared_memory(&uri)?;
        Ok(Self { backend: Backend::Memory { uri, _anchor: anchor } })
    }

    fn new_session(&self) -> Result<SessionHandle> {
        match &self.backend {
            Backend::File(path) => SessionHandle::open(path),
            Backend::Memory { uri, .. } => SessionHandle::open_shared_memory(uri),
        }
    }

    /// Open a session for callers that want to share one connection
    /// across multiple queries (the Query Surface's store-backed mode).
    pub fn open_session(&self) -> Result<SessionHandle> {
        self.new_session()
    }

    /// Upsert every node and edge from `repository`. Node upsert is
    /// insert-or-replace by `id`; edge upsert is by the unique triple.
    /// Deliberately uses `ON CONFLICT ... DO UPDATE`, not
    /// `INSERT OR REPLACE`: the latter deletes-then-reinserts the row,
    /// which would cascade-delete every edge touching a node that is
    /// merely being re-persisted with updated tags.
    pub fn persist(&self, repository: &Repository) -> Result<()> {
        let mut session = self.new_session()?;
        let now = now_unix();
        let tx = session
            .connection_mut()
            .transaction()
            .map_err(StorageError::Sqlite)?;

        for node in repository.all_nodes() {
            let kind_data = serde_json::to_vec(node.kind()).map_err(StorageError::Json)?;
            let properties = serialization::encode_properties(node.properties())?;
            let metrics = serialization::encode_metrics(node.metrics())?;
            let tags = serialization::encode_tags(node.tags())?;

            tx.execute(
                "INSERT INTO nodes (id, node_type, display_label, kind_data, properties, metrics, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    node_type = excluded.node_type,
                    display_label = excluded.display_label,
                    kind_data = excluded.kind_data,
                    properties = excluded.properties,
                    metrics = excluded.metrics,
                    tags = excluded.tags,
                    updated_at = excluded.updated_at",
                params![
                    node.id(),
                    node.node_type(),
                    node.display_label(),
                    kind_data,
                    properties.into_bytes(),
                    metrics.into_bytes(),
                    tags.into_bytes(),
                    now,
                ],
            )
            .map_err(StorageError::Sqlite)?;
        }

        for edge in repository.all_edges() {
            let metadata = serialization::encode_properties(&edge.metadata)?;
            tx.execute(
                "INSERT INTO edges (source_id, target_id, edge_type, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(source_id, target_id, edge_type) DO UPDATE SET
                    metadata = excluded.metadata",
                params![edge.source_id, edge.target_id, edge.edge_type, metadata.into_bytes(), now],
            )
            .map_err(StorageError::Sqlite)?;
        }

        tx.commit().map_err(StorageError::Sqlite)?;
        info!(
            nodes = repository.node_count(),
            edges = repository.edge_count(),
            "persisted repository"
        );
        Ok(())
    }

    /// Load the whole graph into a fresh `Repository`. All reads happen
    /// within one session; every BLOB is fully decoded before the session
    /// (and thus its underlying connection) is allowed to close. A read
    /// that fails mid-decode returns `LoadFailed` and no partial node is
    /// ever inserted into the returned repository.
    pub fn load(&self) -> Result<Repository> {
        let session = self.new_session()?;
        let mut repo = Repository::new();

        let mut node_stmt = session
            .connection()
            .prepare("SELECT rowid, id, node_type, display_label FROM nodes ORDER BY rowid")
            .map_err(StorageError::Sqlite)?;
        let node_rows = node_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StorageError::Sqlite)?;

        for row in node_rows {
            let (row_id, id, _node_type, display_label) = row.map_err(StorageError::Sqlite)?;

            let kind_bytes = session.read_blob("nodes", "kind_data", row_id)?;
            let kind: NodeKind = serde_json::from_slice(&kind_bytes)
                .map_err(|e| StorageError::LoadFailed(format!("decode kind_data for {id}: {e}")))?;

            let properties_bytes = session.read_blob("nodes", "properties", row_id)?;
            let properties = serialization::decode_properties(
                std::str::from_utf8(&properties_bytes)
                    .map_err(|e| StorageError::LoadFailed(e.to_string()))?,
            )?;

            let metrics_bytes = session.read_blob("nodes", "metrics", row_id)?;
            let metrics = serialization::decode_metrics(
                std::str::from_utf8(&metrics_bytes).map_err(|e| StorageError::LoadFailed(e.to_string()))?,
            )?;

            let tags_bytes = session.read_blob("nodes", "tags", row_id)?;
            let tags = serialization::decode_tags(
                std::str::from_utf8(&tags_bytes).map_err(|e| StorageError::LoadFailed(e.to_string()))?,
            )?;

            let node = GraphNode::from_parts(id, kind, display_label, properties, metrics, tags);
            repo.add_node(node)
                .map_err(|e| StorageError::LoadFailed(format!("{e}")))?;
        }
        drop(node_stmt);

        let mut edge_stmt = session
            .connection()
            .prepare("SELECT rowid, source_id, target_id, edge_type FROM edges ORDER BY rowid")
            .map_err(StorageError::Sqlite)?;
        let edge_rows = edge_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StorageError::Sqlite)?;

        for row in edge_rows {
            let (row_id, source_id, target_id, edge_type) = row.map_err(StorageError::Sqlite)?;
            let metadata_bytes = session.read_blob("edges", "metadata", row_id)?;
            let metadata: BTreeMap<String, PropertyValue> = serialization::decode_properties(
                std::str::from_utf8(&metadata_bytes).map_err(|e| StorageError::LoadFailed(e.to_string()))?,
            )?;

            let edge = GraphEdge {
                source_id,
                target_id,
                edge_type,
                metadata,
            };
            repo.get_or_create_edge(edge)
                .map_err(|e| StorageError::LoadFailed(format!("{e}")))?;
        }
        drop(edge_stmt);

        // `session` drops here, after every blob has been fully decoded.
        info!(nodes = repo.node_count(), edges = repo.edge_count(), "loaded repository");
        Ok(repo)
    }

    /// Read the `graph_statistics` view.
    pub fn statistics(&self) -> Result<GraphStatistics> {
        let session = self.new_session()?;
        session
            .connection()
            .query_row(
                "SELECT node_count, edge_count, distinct_node_types, distinct_edge_types FROM graph_statistics",
                [],
                |row| {
                    Ok(GraphStatistics {
                        node_count: row.get(0)?,
                        edge_count: row.get(1)?,
                        distinct_node_types: row.get(2)?,
                        distinct_edge_types: row.get(3)?,
                    })
                },
            )
            .map_err(|e| StorageError::Sqlite(e).into())
    }

    /// Drop all rows from both tables. Does not delete the database file.
    pub fn clear_all(&self) -> Result<()> {
        let session = self.new_session()?;
        session
            .connection()
            .execute_batch("DELETE FROM edges; DELETE FROM nodes;")
            .map_err(|e| StorageError::Sqlite(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{JavaClassNode, PackageNode, ProjectFile};
    use crate::graph::{ClassOrigin, GraphNode};
    use crate::value::MetricValue;

    fn build_repo() -> Repository {
        let mut repo = Repository::new();
        repo.add_node(GraphNode::new(
            "src/x/Foo.java",
            NodeKind::ProjectFile(ProjectFile {
                absolute_path: "/proj/src/x/Foo.java".to_string(),
                extension: Some("java".to_string()),
                size_bytes: 42,
                language: Some("java".to_string()),
            }),
            "Foo.java",
        ))
        .unwrap();

        repo.add_node(GraphNode::new(
            "x.Foo",
            NodeKind::JavaClassNode(JavaClassNode {
                fully_qualified_name: "x.Foo".to_string(),
                simple_name: "Foo".to_string(),
                package: "x".to_string(),
                origin: ClassOrigin::Source,
                parent_class: None,
                interfaces: vec![],
            }),
            "Foo",
        ))
        .unwrap();

        repo.add_node(GraphNode::new(
            "x",
            NodeKind::PackageNode(PackageNode {
                fully_qualified_name: "x".to_string(),
            }),
            "x",
        ))
        .unwrap();

        {
            let mut handle = repo.node_handle("x.Foo").unwrap();
            handle.enable_tag("java:source").unwrap();
            handle.set_metric("loc", MetricValue::Int(12)).unwrap();
            handle
                .set_property("fqcn", PropertyValue::Str("x.Foo".to_string()))
                .unwrap();
        }

        repo.get_or_create_edge(GraphEdge::new("src/x/Foo.java", "x.Foo", "contains"))
            .unwrap();
        repo.get_or_create_edge(GraphEdge::new("x", "x.Foo", "contains")).unwrap();

        repo
    }

    #[test]
    fn persist_then_load_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let repo = build_repo();
        store.persist(&repo).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.node_count(), repo.node_count());
        assert_eq!(reloaded.edge_count(), repo.edge_count());

        let foo = reloaded.get_node("x.Foo").unwrap();
        assert!(foo.has_tag("java:source"));
        assert_eq!(foo.metrics().get("loc"), Some(&MetricValue::Int(12)));
    }

    #[test]
    fn persisting_twice_does_not_cascade_delete_edges() {
        let store = SqliteStore::open_in_memory().unwrap();
        let repo = build_repo();
        store.persist(&repo).unwrap();
        // Re-persist unchanged repository; this must not drop the edges
        // that reference these node ids via ON DELETE CASCADE.
        store.persist(&repo).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.edge_count(), repo.edge_count());
    }

    #[test]
    fn statistics_reflect_persisted_graph() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.persist(&build_repo()).unwrap();
        let stats = store.statistics().unwrap();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 2);
    }

    #[test]
    fn clear_all_empties_the_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.persist(&build_repo()).unwrap();
        store.clear_all().unwrap();
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.node_count(), 0);
    }
}
