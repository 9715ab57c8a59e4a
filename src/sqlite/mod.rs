//! SQLite backend for amnesia memory storage.
//!
//! One database file holds two logical stores that share the memory id:
//! - `metadata`: the `memories` table (canonical identity and text fields)
//! - `vectors`: the `memory_vectors` table plus `vector_index_meta`, which
//!   records the fixed dimension and the embedding model identity
//! - `search`: exact k-nearest-neighbor queries over the vector index
//! - `embedding`: BLOB conversion and L2 distance
//!
//! Nothing here spans both stores in one transaction; consistency between
//! them is kept by `MemoryRepository`.

pub mod embedding;
pub mod metadata;
pub mod search;
pub mod vectors;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use self::embedding::{blob_to_vec, l2_distance, vec_to_blob};
pub use self::search::{validate_limit, MAX_SEARCH_LIMIT};

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// A single memory record from the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memory {
    pub id: String,
    pub title: String,
    pub content: String,
    pub full_content: Option<String>,
    pub tags: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Error types for SQLite operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database not initialized: {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("Invalid BLOB size: expected {expected} bytes, got {actual} bytes")]
    InvalidBlobSize { expected: usize, actual: usize },

    #[error("Mismatched dimensions: expected {expected} dimensions, got {actual} dimensions")]
    MismatchedDimensions { expected: usize, actual: usize },

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Invalid vector dimension: {0} (must be greater than 0)")]
    InvalidDimension(usize),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Corrupt database: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// SQLite database backend for amnesia.
pub struct Database {
    conn: Connection,
    path: PathBuf,
    dimension: usize,
}

/// Tables for both stores. Indexes are created after column migration so
/// that they can reference columns added by it.
const CREATE_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS memories (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        full_content TEXT,
        tags TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS memory_vectors (
        id TEXT PRIMARY KEY,
        embedding BLOB NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vector_index_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

const CREATE_INDEXES: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);
    CREATE INDEX IF NOT EXISTS idx_memories_tags ON memories(tags);
"#;

/// SQLite `strftime` layout matching `metadata::now_timestamp`.
const RFC3339_MICROS: &str = "%Y-%m-%dT%H:%M:%S.000000Z";

/// Columns that older `memories` tables may lack.
const LEGACY_COLUMNS: [(&str, &str); 3] = [
    ("full_content", "TEXT"),
    ("tags", "TEXT"),
    ("updated_at", "TEXT"),
];

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Bring an existing `memories` table up to the current column set and
/// timestamp layout.
fn migrate_columns(conn: &mut Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (column, decl) in LEGACY_COLUMNS {
        if !column_exists(&tx, "memories", column)? {
            tracing::info!(column, "adding missing column to memories table");
            tx.execute_batch(&format!("ALTER TABLE memories ADD COLUMN {column} {decl}"))?;
            if column == "updated_at" {
                tx.execute(
                    "UPDATE memories SET updated_at = created_at WHERE updated_at IS NULL",
                    [],
                )?;
            }
        }
    }
    for column in ["created_at", "updated_at"] {
        let sql = format!(
            "UPDATE memories SET {column} = strftime('{RFC3339_MICROS}', {column})
             WHERE instr({column}, 'T') = 0 AND strftime('{RFC3339_MICROS}', {column}) IS NOT NULL"
        );
        let rewritten = tx.execute(&sql, [])?;
        if rewritten > 0 {
            tracing::info!(column, rewritten, "normalized legacy timestamps");
        }
    }
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    tx.commit()?;
    Ok(())
}

/// Create both stores if missing and migrate older layouts. Idempotent.
fn apply_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;
    migrate_columns(conn)?;
    conn.execute_batch(CREATE_INDEXES)?;
    Ok(())
}

impl Database {
    /// Open an existing database.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotInitialized` if the file does not exist or either
    /// store's tables are missing; never creates anything except the column
    /// migration of an already initialized database.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotInitialized(path.to_path_buf()));
        }

        let mut conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        for table in ["memories", "memory_vectors", "vector_index_meta"] {
            if !table_exists(&conn, table)? {
                return Err(Error::NotInitialized(path.to_path_buf()));
            }
        }
        apply_schema(&mut conn)?;

        let dimension = vectors::read_dimension(&conn)?
            .ok_or_else(|| Error::NotInitialized(path.to_path_buf()))?;

        tracing::debug!(path = %path.display(), dimension, "opened memory database");
        let db = Self {
            conn,
            path: path.to_path_buf(),
            dimension,
        };
        db.warn_missing_vectors()?;
        Ok(db)
    }

    /// Create the database file, both stores and the vector index.
    ///
    /// Initializing an existing database with the same dimension is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::MismatchedDimensions` if the index already exists with a
    /// different dimension, or an error if the file cannot be created.
    pub fn initialize(path: &Path, dimension: usize, model_id: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        apply_schema(&mut conn)?;
        vectors::initialize_index(&conn, dimension, model_id)?;

        tracing::info!(path = %path.display(), dimension, model_id, "memory database initialized");
        let db = Self {
            conn,
            path: path.to_path_buf(),
            dimension,
        };
        db.warn_missing_vectors()?;
        Ok(db)
    }

    /// Memories without a vector are invisible to search until saved again.
    fn warn_missing_vectors(&self) -> Result<()> {
        let missing = self.count_memories_without_vectors()?;
        if missing > 0 {
            tracing::warn!(
                missing,
                "memories have no vector and will not appear in search; save them again to repair"
            );
        }
        Ok(())
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fixed vector dimension of the index.
    pub fn vector_dimension(&self) -> usize {
        self.dimension
    }

    /// Embedding model identity recorded when the index was created.
    pub fn vector_model(&self) -> Result<Option<String>> {
        vectors::read_meta(&self.conn, vectors::META_MODEL)
    }

    /// Get internal connection (for internal use, e.g., tests).
    #[allow(dead_code)] // Used in tests to plant corrupt rows
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.db");

        let result = Database::open(&path);
        assert!(matches!(result, Err(Error::NotInitialized(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_empty_sqlite_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path).unwrap();

        let result = Database::open(&path);
        assert!(matches!(result, Err(Error::NotInitialized(_))));
    }

    #[test]
    fn test_initialize_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/memories.db");

        let db = Database::initialize(&path, 4, "test/model").unwrap();
        assert!(path.exists());
        assert_eq!(db.vector_dimension(), 4);
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.db");

        Database::initialize(&path, 4, "test/model").unwrap();
        let db = Database::initialize(&path, 4, "test/model").unwrap();
        assert_eq!(db.vector_dimension(), 4);
    }

    #[test]
    fn test_initialize_then_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.db");

        {
            Database::initialize(&path, 8, "test/model").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.vector_dimension(), 8);
        assert_eq!(db.vector_model().unwrap().as_deref(), Some("test/model"));
    }

    #[test]
    fn test_schema_has_auxiliary_indexes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.db");
        let db = Database::initialize(&path, 4, "test/model").unwrap();

        let names: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'memories'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        assert!(names.iter().any(|n| n == "idx_memories_created_at"));
        assert!(names.iter().any(|n| n == "idx_memories_tags"));
    }

    #[test]
    fn test_schema_version_recorded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.db");
        let db = Database::initialize(&path, 4, "test/model").unwrap();

        let version: i64 = db
            .conn()
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_legacy_table_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE memories (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                INSERT INTO memories (id, title, content, created_at)
                VALUES ('old', 'Old title', 'Old content', '2024-01-01T00:00:00.000000Z');",
            )
            .unwrap();
        }

        let db = Database::initialize(&path, 4, "test/model").unwrap();
        for column in ["full_content", "tags", "updated_at"] {
            assert!(column_exists(db.conn(), "memories", column).unwrap());
        }

        let memory = db.get_memory("old").unwrap().unwrap();
        assert_eq!(memory.title, "Old title");
        assert_eq!(memory.tags, "");
        assert_eq!(memory.full_content, None);
        assert_eq!(memory.updated_at, memory.created_at);
    }

    #[test]
    fn test_legacy_sqlite_timestamps_are_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE memories (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                INSERT INTO memories (id, title, content, created_at)
                VALUES ('older', 'Older', 'first', '2024-01-01 10:00:00');
                INSERT INTO memories (id, title, content, created_at)
                VALUES ('newer', 'Newer', 'second', '2024-01-01T09:00:00.000000Z');",
            )
            .unwrap();
        }

        let db = Database::initialize(&path, 4, "test/model").unwrap();

        let older = db.get_memory("older").unwrap().unwrap();
        assert_eq!(older.created_at, "2024-01-01T10:00:00.000000Z");
        assert_eq!(older.updated_at, "2024-01-01T10:00:00.000000Z");
        let newer = db.get_memory("newer").unwrap().unwrap();
        assert_eq!(newer.created_at, "2024-01-01T09:00:00.000000Z");

        // The later timestamp sorts first once both use the same layout.
        let listed: Vec<String> = db
            .list_memories(10)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(listed, ["older", "newer"]);
    }

    #[test]
    fn test_open_reports_memories_without_vectors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = Database::initialize(&path, 3, "test/model").unwrap();
            db.upsert_memory("with", "T", "c", None, "").unwrap();
            db.upsert_vector("with", &[1.0, 0.0, 0.0]).unwrap();
            db.upsert_memory("without", "T", "c", None, "").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_memories_without_vectors().unwrap(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidBlobSize {
            expected: 3072,
            actual: 10,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("expected"));
        assert!(msg.contains("3072"));
        assert!(msg.contains("10"));
    }
}
