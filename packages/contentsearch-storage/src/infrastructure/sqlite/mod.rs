//! SQLite document store
//!
//! File-based persistent storage. Every `apply` runs in one transaction:
//! a failing op rolls the whole commit back.

use chrono::{DateTime, Utc};
use contentsearch_maintenance::UniqueItemId;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::domain::{Document, DocumentOp, DocumentStore};
use crate::{Result, StorageError};

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// In-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                index_name TEXT NOT NULL,
                item_id TEXT NOT NULL,
                version TEXT NOT NULL,
                path TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT,
                indexed_at TEXT NOT NULL,
                PRIMARY KEY (index_name, item_id, version)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_path
             ON documents(index_name, path)",
            [],
        )?;

        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::serialization(format!("Invalid timestamp '{}'", raw)).with_source(e)
        })
}

impl DocumentStore for SqliteDocumentStore {
    fn apply(&self, index: &str, ops: &[DocumentOp]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        for op in ops {
            match op {
                DocumentOp::Upsert(doc) => {
                    tx.execute(
                        "INSERT OR REPLACE INTO documents
                         (index_name, item_id, version, path, content, metadata, indexed_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            index,
                            doc.id.item.as_str(),
                            &doc.id.version,
                            &doc.path,
                            &doc.content,
                            serde_json::to_string(&doc.metadata)?,
                            doc.indexed_at.to_rfc3339(),
                        ],
                    )?;
                }
                DocumentOp::DeleteItem(item) => {
                    tx.execute(
                        "DELETE FROM documents WHERE index_name = ?1 AND item_id = ?2",
                        params![index, item.as_str()],
                    )?;
                }
                DocumentOp::DeleteVersion(id) => {
                    tx.execute(
                        "DELETE FROM documents
                         WHERE index_name = ?1 AND item_id = ?2 AND version = ?3",
                        params![index, id.item.as_str(), &id.version],
                    )?;
                }
            }
        }

        tx.commit()?;
        debug!(index, ops = ops.len(), "Applied document batch");
        Ok(())
    }

    fn get(&self, index: &str, id: &UniqueItemId) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT path, content, metadata, indexed_at FROM documents
                 WHERE index_name = ?1 AND item_id = ?2 AND version = ?3",
                params![index, id.item.as_str(), &id.version],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((path, content, metadata, indexed_at)) = row else {
            return Ok(None);
        };

        let metadata = match metadata {
            Some(raw) => serde_json::from_str(&raw)?,
            None => serde_json::Value::Null,
        };

        Ok(Some(Document {
            id: id.clone(),
            path,
            content,
            metadata,
            indexed_at: parse_timestamp(&indexed_at)?,
        }))
    }

    fn count(&self, index: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE index_name = ?1",
            params![index],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn check_ready(&self, index: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT 1 FROM documents WHERE index_name = ?1 LIMIT 1",
            params![index],
            |_| Ok(()),
        )
        .optional()?;
        Ok(())
    }
}
