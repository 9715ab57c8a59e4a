//! Metadata store: the `memories` table.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{search::validate_limit, Database, Memory, Result};

const SELECT_MEMORY: &str = r#"
    SELECT id, title, content, full_content, tags, created_at, updated_at
    FROM memories
"#;

/// Current UTC time with fixed microsecond precision, so that timestamps
/// compare correctly as strings.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_memory(row: &Row<'_>) -> rusqlite::Result<Memory> {
    Ok(Memory {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        full_content: row.get(3)?,
        tags: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Database {
    /// Insert a memory or replace every field except `created_at`.
    ///
    /// A single `INSERT ... ON CONFLICT` statement, so readers never see a
    /// partially updated record.
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails.
    pub fn upsert_memory(
        &self,
        id: &str,
        title: &str,
        content: &str,
        full_content: Option<&str>,
        tags: &str,
    ) -> Result<()> {
        self.upsert_memory_at(id, title, content, full_content, tags, &now_timestamp())
    }

    /// Upsert with an explicit write time (`created_at` on insert, `updated_at` always).
    pub(crate) fn upsert_memory_at(
        &self,
        id: &str,
        title: &str,
        content: &str,
        full_content: Option<&str>,
        tags: &str,
        now: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO memories (id, title, content, full_content, tags, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                full_content = excluded.full_content,
                tags = excluded.tags,
                updated_at = excluded.updated_at
            "#,
            params![id, title, content, full_content, tags, now],
        )?;
        Ok(())
    }

    /// Retrieve a single memory by ID.
    ///
    /// Returns None if the memory does not exist.
    pub fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_MEMORY} WHERE id = ?1"))?;
        Ok(stmt.query_row([id], row_to_memory).optional()?)
    }

    /// List memories ordered by creation time (newest first).
    ///
    /// # Errors
    ///
    /// Returns error if the limit is invalid or the query fails.
    pub fn list_memories(&self, limit: usize) -> Result<Vec<Memory>> {
        validate_limit(limit)?;

        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_MEMORY} ORDER BY created_at DESC, id ASC LIMIT ?1"
        ))?;
        let memories = stmt
            .query_map(params![limit as i64], row_to_memory)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(memories)
    }

    /// Number of records in the metadata store.
    pub fn count_memories(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
