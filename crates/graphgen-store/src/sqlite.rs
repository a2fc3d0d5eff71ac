//! SQLite-backed graph store

use crate::StoreError;
use async_trait::async_trait;
use graphgen_domain::traits::GraphStore;
use graphgen_domain::{CanonicalEdge, CanonicalNode, EdgeKey};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-based implementation of GraphStore
///
/// Use `:memory:` for an in-memory database (useful for testing).
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so one store can be shared between
/// merge tasks. Statements are short and run while the lock is held.
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    /// Open (or create) a store at `path`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use graphgen_store::SqliteGraphStore;
    ///
    /// let store = SqliteGraphStore::new("graph.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        debug!("Opened graph store at {}", path.as_ref().display());
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.lock()?.execute_batch(schema)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn row_to_node(row: &Row<'_>) -> rusqlite::Result<CanonicalNode> {
        Ok(CanonicalNode {
            entity_type: row.get(0)?,
            description: row.get(1)?,
            source_id: row.get(2)?,
        })
    }

    fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<CanonicalEdge> {
        Ok(CanonicalEdge {
            description: row.get(0)?,
            keywords: row.get(1)?,
            weight: row.get(2)?,
            source_id: row.get(3)?,
        })
    }

    fn count(&self, table: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative count {}", count)))
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    type Error = StoreError;

    async fn get_node(&self, name: &str) -> Result<Option<CanonicalNode>, Self::Error> {
        let conn = self.lock()?;
        let node = conn
            .query_row(
                "SELECT entity_type, description, source_id FROM nodes WHERE name = ?1",
                params![name],
                Self::row_to_node,
            )
            .optional()?;
        Ok(node)
    }

    async fn upsert_node(&self, name: &str, node: CanonicalNode) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO nodes (name, entity_type, description, source_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
             entity_type = excluded.entity_type,
             description = excluded.description,
             source_id = excluded.source_id",
            params![name, node.entity_type, node.description, node.source_id],
        )?;
        Ok(())
    }

    async fn get_edge(
        &self,
        src_id: &str,
        tgt_id: &str,
    ) -> Result<Option<CanonicalEdge>, Self::Error> {
        let conn = self.lock()?;
        let edge = conn
            .query_row(
                "SELECT description, keywords, weight, source_id
                 FROM edges WHERE src_id = ?1 AND tgt_id = ?2",
                params![src_id, tgt_id],
                Self::row_to_edge,
            )
            .optional()?;
        Ok(edge)
    }

    async fn upsert_edge(
        &self,
        src_id: &str,
        tgt_id: &str,
        edge: CanonicalEdge,
    ) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO edges (src_id, tgt_id, description, keywords, weight, source_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(src_id, tgt_id) DO UPDATE SET
             description = excluded.description,
             keywords = excluded.keywords,
             weight = excluded.weight,
             source_id = excluded.source_id",
            params![
                src_id,
                tgt_id,
                edge.description,
                edge.keywords,
                edge.weight,
                edge.source_id
            ],
        )?;
        Ok(())
    }

    async fn node_count(&self) -> Result<usize, Self::Error> {
        self.count("nodes")
    }

    async fn edge_count(&self) -> Result<usize, Self::Error> {
        self.count("edges")
    }

    async fn all_nodes(&self) -> Result<Vec<(String, CanonicalNode)>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, entity_type, description, source_id FROM nodes ORDER BY name",
        )?;
        let nodes = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    CanonicalNode {
                        entity_type: row.get(1)?,
                        description: row.get(2)?,
                        source_id: row.get(3)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    async fn all_edges(&self) -> Result<Vec<(EdgeKey, CanonicalEdge)>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT src_id, tgt_id, description, keywords, weight, source_id
             FROM edges ORDER BY src_id, tgt_id",
        )?;
        let edges = stmt
            .query_map([], |row| {
                Ok((
                    (row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    CanonicalEdge {
                        description: row.get(2)?,
                        keywords: row.get(3)?,
                        weight: row.get(4)?,
                        source_id: row.get(5)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }
}
