//! Semantic search for the memory repository.

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::memory_types::ScoredMemory;

use super::store::{validate_query, MemoryRepository};

/// Convert an L2 distance into a display score in (0, 100].
///
/// `exp(-distance) * 100`: identical vectors score 100, and the score halves
/// for every `ln 2` of distance.
pub fn similarity_from_distance(distance: f64) -> f64 {
    (-distance).exp() * 100.0
}

impl<E: Embedder> MemoryRepository<E> {
    #[must_use = "handle the error or results may be lost"]
    /// Search memories by semantic similarity.
    ///
    /// Returns at most `limit` memories ordered by ascending distance. Ids
    /// present in the vector index but missing from the metadata store are
    /// skipped, so fewer than `limit` results may come back even when more
    /// memories exist.
    ///
    /// # Arguments
    ///
    /// * `query` - Search text (1 to 100,000 characters)
    /// * `limit` - Maximum number of results (1 to 10,000)
    /// * `include_full` - Return the stored full content when it is non-empty
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query is empty or exceeds 100,000 characters
    /// - Limit is 0 or exceeds 10,000
    /// - Embedding generation fails
    /// - Database query fails
    pub fn search(
        &mut self,
        query: &str,
        limit: usize,
        include_full: bool,
    ) -> Result<Vec<ScoredMemory>, Error> {
        validate_query(query, limit)?;

        let query_embedding = self.embedder.embed(query)?;
        let neighbours = self.db.search_vectors(&query_embedding, limit)?;

        let mut results = Vec::with_capacity(neighbours.len());
        let mut orphans = 0usize;
        for (id, distance) in neighbours {
            let Some(memory) = self.db.get_memory(&id)? else {
                orphans += 1;
                continue;
            };
            let full_content = if include_full {
                memory.full_content.filter(|text| !text.is_empty())
            } else {
                None
            };
            results.push(ScoredMemory {
                id: memory.id,
                similarity: similarity_from_distance(distance),
                distance,
                title: memory.title,
                tags: memory.tags,
                created_at: memory.created_at,
                content: memory.content,
                full_content,
            });
        }

        if orphans > 0 {
            tracing::debug!(orphans, "skipped vectors without metadata");
        }
        tracing::debug!(results = results.len(), limit, "search complete");
        Ok(results)
    }
}
