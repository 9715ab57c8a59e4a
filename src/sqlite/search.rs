//! Exact k-nearest-neighbor search over the vector index.

use std::cmp::Ordering;

use super::embedding::{blob_to_vec, l2_distance, validate_vector};
use super::{Database, Error};

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum allowed `k` for nearest-neighbor and list queries.
pub const MAX_SEARCH_LIMIT: usize = 10_000;

/// Validate search limit is within acceptable bounds.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// Ascending distance, ties broken by id so equal distances order stably.
fn by_distance(a: &(String, f64), b: &(String, f64)) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

impl Database {
    /// Find the `k` stored vectors closest to `query` by L2 distance.
    ///
    /// Returns `(id, distance)` pairs ordered by ascending distance. Fewer than
    /// `k` pairs are returned when the index holds fewer vectors.
    ///
    /// # Errors
    ///
    /// - Returns `Error::InvalidLimit` if `k` is 0 or above `MAX_SEARCH_LIMIT`.
    /// - Returns `Error::MismatchedDimensions` if the query length differs from
    ///   the index dimension.
    /// - Returns `Error::InvalidBlobSize` if a stored vector is corrupt.
    pub fn search_vectors(&self, query: &[f32], k: usize) -> Result<Vec<(String, f64)>> {
        validate_limit(k)?;
        validate_vector(query, self.dimension)?;

        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, embedding FROM memory_vectors")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut candidates: Vec<(String, f64)> = Vec::new();
        for row_result in rows {
            let (id, blob) = row_result?;
            let stored = blob_to_vec(&blob, self.dimension)?;
            candidates.push((id, l2_distance(query, &stored)?));
        }

        if candidates.len() > k {
            candidates.select_nth_unstable_by(k - 1, by_distance);
            candidates.truncate(k);
        }
        candidates.sort_by(by_distance);
        Ok(candidates)
    }
}
