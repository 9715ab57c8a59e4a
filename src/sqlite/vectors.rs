//! Vector index: the `memory_vectors` table and its fixed-dimension metadata.

use rusqlite::{params, Connection, OptionalExtension};

use super::embedding::{validate_vector, vec_to_blob};
use super::{Database, Error, Result};

pub(crate) const META_DIMENSION: &str = "dimension";
pub(crate) const META_MODEL: &str = "model";

pub(crate) fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM vector_index_meta WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn read_dimension(conn: &Connection) -> Result<Option<usize>> {
    match read_meta(conn, META_DIMENSION)? {
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::Corrupt(format!("vector index dimension '{value}': {e}"))),
        None => Ok(None),
    }
}

/// Record the index dimension and model identity. Idempotent.
///
/// # Errors
///
/// Returns `Error::MismatchedDimensions` if the index was created with another
/// dimension. A different model identity only logs a warning, because vectors
/// of equal length from another model still compare without failing.
pub(crate) fn initialize_index(conn: &Connection, dimension: usize, model_id: &str) -> Result<()> {
    if dimension == 0 {
        return Err(Error::InvalidDimension(dimension));
    }

    if let Some(existing) = read_dimension(conn)? {
        if existing != dimension {
            return Err(Error::MismatchedDimensions {
                expected: existing,
                actual: dimension,
            });
        }
        if let Some(recorded) = read_meta(conn, META_MODEL)? {
            if recorded != model_id {
                tracing::warn!(
                    recorded = %recorded,
                    requested = %model_id,
                    "vector index was built with a different embedding model"
                );
            }
        }
        return Ok(());
    }

    conn.execute(
        "INSERT INTO vector_index_meta (key, value) VALUES (?1, ?2), (?3, ?4)",
        params![
            META_DIMENSION,
            dimension.to_string(),
            META_MODEL,
            model_id
        ],
    )?;
    Ok(())
}

impl Database {
    /// Replace the vector stored for `id`.
    ///
    /// This is a two-step write, delete then insert, with no transaction around
    /// it: between the steps the id is absent from the index, and a crash there
    /// leaves it absent until the next save. The vector is validated before the
    /// delete, so an invalid vector never removes the previous one.
    ///
    /// # Errors
    ///
    /// Returns `Error::MismatchedDimensions` or `Error::InvalidEmbedding` for a
    /// bad vector, or a database error from either step.
    pub fn upsert_vector(&self, id: &str, vector: &[f32]) -> Result<()> {
        validate_vector(vector, self.dimension)?;
        self.remove_vector(id)?;
        self.insert_vector(id, vector)
    }

    /// First step of `upsert_vector`. Returns true if a vector was removed.
    pub(crate) fn remove_vector(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM memory_vectors WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Second step of `upsert_vector`. Fails on an id that is already present.
    pub(crate) fn insert_vector(&self, id: &str, vector: &[f32]) -> Result<()> {
        validate_vector(vector, self.dimension)?;
        let blob = vec_to_blob(vector, self.dimension)?;
        self.conn.execute(
            "INSERT INTO memory_vectors (id, embedding) VALUES (?1, ?2)",
            params![id, blob],
        )?;
        Ok(())
    }

    /// Whether the index holds a vector for `id`.
    pub fn has_vector(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memory_vectors WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of memories with no vector in the index.
    pub fn count_memories_without_vectors(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memories m
             WHERE NOT EXISTS (SELECT 1 FROM memory_vectors v WHERE v.id = m.id)",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Number of vectors in the index.
    pub fn count_vectors(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM memory_vectors", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
