//! Core repository struct combining an embedding provider and persistence.

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::sqlite::{validate_limit, Database};

/// Maximum allowed input length (100,000 characters).
pub const MAX_INPUT_LENGTH: usize = 100_000;

/// Memory repository combining an embedding provider with both stores.
///
/// Wraps an initialized [`Database`] and an [`Embedder`] to provide semantic
/// search over saved conversation memories.
///
/// # Mutability Requirements
///
/// Methods that generate embeddings (`save`, `search`) require `&mut self`
/// because `Embedder::embed` may mutate provider state (ONNX tensor
/// allocations for [`EmbeddingEngine`](crate::embedding::EmbeddingEngine)).
pub struct MemoryRepository<E: Embedder> {
    pub(crate) db: Database,
    pub(crate) embedder: E,
}

impl<E: Embedder> MemoryRepository<E> {
    /// Build a repository over an opened database and a loaded embedder.
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if the embedder produces vectors of
    /// a different length than the database's vector index stores.
    pub fn new(db: Database, embedder: E) -> Result<Self, Error> {
        let expected = db.vector_dimension();
        let actual = embedder.dimension();
        if expected != actual {
            return Err(Error::DimensionMismatch { expected, actual });
        }

        if let Some(recorded) = db.vector_model()? {
            if recorded != embedder.model_id() {
                tracing::warn!(
                    recorded = %recorded,
                    model = %embedder.model_id(),
                    "embedding model differs from the one the index was built with"
                );
            }
        }

        Ok(MemoryRepository { db, embedder })
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The embedding provider.
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Mutable access to the embedding provider.
    pub fn embedder_mut(&mut self) -> &mut E {
        &mut self.embedder
    }
}

/// Check the inputs of [`MemoryRepository::save`].
///
/// Needs neither store nor embedder, so callers can reject bad input before
/// opening a database or loading a model.
///
/// # Errors
///
/// Returns `Error::Validation` if `id`, `title` or `content` is empty or any
/// field exceeds `MAX_INPUT_LENGTH` characters.
pub fn validate_save(id: &str, title: &str, content: &str, tags: &str) -> Result<(), Error> {
    validate_required("id", id)?;
    validate_required("title", title)?;
    validate_required("content", content)?;
    validate_input_length("tags", tags)
}

/// Check the inputs of [`MemoryRepository::search`].
///
/// # Errors
///
/// Returns `Error::Validation` for an empty or oversized query, or a limit
/// outside `1..=MAX_SEARCH_LIMIT`.
pub fn validate_query(query: &str, limit: usize) -> Result<(), Error> {
    validate_required("query", query)?;
    validate_limit(limit)?;
    Ok(())
}

/// Validate a required text field (rejects empty and whitespace-only input).
fn validate_required(field: &str, text: &str) -> Result<(), Error> {
    if text.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    validate_input_length(field, text)
}

/// Validate input length in characters.
fn validate_input_length(field: &str, text: &str) -> Result<(), Error> {
    let length = text.chars().count();
    if length > MAX_INPUT_LENGTH {
        return Err(Error::Validation(format!(
            "{field} is too long: {length} characters (max {MAX_INPUT_LENGTH})"
        )));
    }
    Ok(())
}
