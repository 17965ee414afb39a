// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-based storage for embedding records.
//!
//! Records are append/delete only: an item's chunks are written in one
//! transaction and removed wholesale. Every read is scoped to a workspace.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: &str = "1";

const RECORD_COLUMNS: &str = "id, workspace_id, item_id, chunk_index, chunk_text, model, \
                              dimensions, embedding, created_at";

/// A persisted embedding with the chunk it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    /// Row id; increases with insertion order.
    pub id: i64,
    /// Owning workspace (tenant).
    pub workspace_id: String,
    /// Owning document/item within the workspace.
    pub item_id: String,
    /// Position of the chunk within the item.
    pub chunk_index: u32,
    /// Chunk text that was embedded.
    pub text: String,
    /// Identifier of the embedding method.
    pub model: String,
    /// Embedding vector (f32 values)
    pub embedding: Vec<f32>,
    /// Unix timestamp when this record was created
    pub created_at: i64,
}

impl EmbeddingRecord {
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// Input chunk data for writing an item's records.
pub struct RecordInput<'a> {
    pub chunk_index: u32,
    pub text: &'a str,
    pub model: &'a str,
    pub embedding: &'a [f32],
}

/// Per-item summary for a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub item_id: String,
    pub record_count: u64,
    pub model: String,
    pub dimensions: usize,
}

/// SQLite-based store for embedding records.
///
/// Stores records in `.paperdex/embeddings.sqlite` by default.
pub struct EmbeddingStorage {
    conn: Connection,
    path: PathBuf,
}

impl EmbeddingStorage {
    /// Opens or creates a store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let storage = Self { conn, path };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let storage = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embedding_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workspace_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                chunk_text TEXT NOT NULL,
                model TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_embedding_records_workspace_item
                ON embedding_records(workspace_id, item_id);
            "#,
            )
            .context("Failed to initialize database schema")?;

        self.conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the storage connection explicitly.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    /// Appends records for one item in a single transaction.
    ///
    /// Either every record is written or none is. Existing records for the
    /// item are left alone. Returns the ids of the new rows in input order.
    pub fn insert_item_records(
        &mut self,
        workspace_id: &str,
        item_id: &str,
        records: &[RecordInput<'_>],
    ) -> Result<Vec<i64>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = unix_now();
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO embedding_records (
                    workspace_id, item_id, chunk_index, chunk_text, model,
                    dimensions, embedding, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for record in records {
                stmt.execute(params![
                    workspace_id,
                    item_id,
                    record.chunk_index,
                    record.text,
                    record.model,
                    record.embedding.len() as i64,
                    Self::embedding_to_blob(record.embedding),
                    created_at
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit().context("Failed to commit item records")?;

        Ok(ids)
    }

    /// Loads every record in a workspace in insertion order.
    pub fn records_for_workspace(&self, workspace_id: &str) -> Result<Vec<EmbeddingRecord>> {
        let sql = format!(
            "SELECT {} FROM embedding_records WHERE workspace_id = ?1 ORDER BY id",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![workspace_id], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to query workspace records")?;
        Ok(records)
    }

    /// Loads the records of one item in chunk order.
    pub fn records_for_item(
        &self,
        workspace_id: &str,
        item_id: &str,
    ) -> Result<Vec<EmbeddingRecord>> {
        let sql = format!(
            "SELECT {} FROM embedding_records WHERE workspace_id = ?1 AND item_id = ?2 \
             ORDER BY id",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![workspace_id, item_id], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to query item records")?;
        Ok(records)
    }

    /// Deletes all records of an item. Returns the number removed.
    pub fn delete_item(&self, workspace_id: &str, item_id: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM embedding_records WHERE workspace_id = ?1 AND item_id = ?2",
                params![workspace_id, item_id],
            )
            .context("Failed to delete item records")?;
        Ok(deleted)
    }

    /// Deletes every record in a workspace.
    pub fn delete_workspace(&self, workspace_id: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM embedding_records WHERE workspace_id = ?1",
                params![workspace_id],
            )
            .context("Failed to delete workspace records")?;
        Ok(deleted)
    }

    /// Counts records in a workspace.
    pub fn count_records(&self, workspace_id: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM embedding_records WHERE workspace_id = ?1",
            params![workspace_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Lists items in a workspace with their record counts.
    ///
    /// An item embedded by several models shows up once per model.
    pub fn list_items(&self, workspace_id: &str) -> Result<Vec<ItemSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT item_id, COUNT(*), model, dimensions
            FROM embedding_records
            WHERE workspace_id = ?1
            GROUP BY item_id, model, dimensions
            ORDER BY item_id, model
            "#,
        )?;

        let items = stmt
            .query_map(params![workspace_id], |row| {
                let count: i64 = row.get(1)?;
                let dimensions: i64 = row.get(3)?;
                Ok(ItemSummary {
                    item_id: row.get(0)?,
                    record_count: count as u64,
                    model: row.get(2)?,
                    dimensions: dimensions as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to list items")?;

        Ok(items)
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<EmbeddingRecord> {
        let embedding_blob: Vec<u8> = row.get(7)?;
        Ok(EmbeddingRecord {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            item_id: row.get(2)?,
            chunk_index: row.get(3)?,
            text: row.get(4)?,
            model: row.get(5)?,
            embedding: Self::blob_to_embedding(&embedding_blob),
            created_at: row.get(8)?,
        })
    }

    /// Converts an embedding vector to a compact blob.
    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Converts a blob back to an embedding vector.
    fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
