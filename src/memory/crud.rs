//! Save, get and list operations for the memory repository.

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::sqlite::{validate_limit, Memory};

use super::store::{validate_save, MemoryRepository};

impl<E: Embedder> MemoryRepository<E> {
    #[must_use = "handle the error or results may be lost"]
    /// Save a memory, replacing any existing memory with the same id.
    ///
    /// The embedding is computed from `"{title}. {content}"`. The metadata
    /// record is written before the vector, so a vector failure leaves the
    /// metadata in place and returns the error. Saving the same id again
    /// repairs a missing vector.
    ///
    /// # Arguments
    ///
    /// * `id` - Caller-supplied identifier (typically a session id)
    /// * `title` - Short title (1 to 100,000 characters)
    /// * `content` - Summary text used for embedding (1 to 100,000 characters)
    /// * `full_content` - Optional verbatim transcript; empty is stored as absent
    /// * `tags` - Comma-separated tags, may be empty
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `id`, `title` or `content` is empty or exceeds 100,000 characters
    /// - Embedding generation fails
    /// - The vector length differs from the index dimension
    /// - Database operations fail
    pub fn save(
        &mut self,
        id: &str,
        title: &str,
        content: &str,
        full_content: Option<&str>,
        tags: &str,
    ) -> Result<(), Error> {
        validate_save(id, title, content, tags)?;

        let full_content = full_content.filter(|text| !text.is_empty());

        let embedding = self.embedder.embed(&format!("{title}. {content}"))?;

        self.db
            .upsert_memory(id, title, content, full_content, tags)?;
        self.db.upsert_vector(id, &embedding)?;

        tracing::debug!(id, "saved memory");
        Ok(())
    }

    #[must_use = "handle the error or results may be lost"]
    /// Get a specific memory by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no memory has this id, or a storage error.
    pub fn get(&self, id: &str) -> Result<Memory, Error> {
        self.db
            .get_memory(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    #[must_use = "handle the error or results may be lost"]
    /// List memories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `limit` is 0 or above the maximum.
    pub fn list(&self, limit: usize) -> Result<Vec<Memory>, Error> {
        validate_limit(limit)?;
        Ok(self.db.list_memories(limit)?)
    }
}
