//! Embedding BLOB conversion and L2 distance computation.

use super::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Check a vector against the index dimension and reject NaN/infinite values.
///
/// # Errors
///
/// - Returns `Error::MismatchedDimensions` if the length differs from `dims`.
/// - Returns `Error::InvalidEmbedding` if any value is NaN or infinite.
pub fn validate_vector(vec: &[f32], dims: usize) -> Result<()> {
    if vec.len() != dims {
        return Err(Error::MismatchedDimensions {
            expected: dims,
            actual: vec.len(),
        });
    }
    if vec.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

/// Convert a vector of f32 embedding values to a BLOB (little-endian bytes).
///
/// # Errors
///
/// Returns `Error::MismatchedDimensions` if the vector length is not `dims`.
pub fn vec_to_blob(vec: &[f32], dims: usize) -> Result<Vec<u8>> {
    if vec.len() != dims {
        return Err(Error::MismatchedDimensions {
            expected: dims,
            actual: vec.len(),
        });
    }
    Ok(vec.iter().flat_map(|&x| x.to_le_bytes()).collect())
}

/// Convert a BLOB (little-endian bytes) to a vector of f32 embedding values.
///
/// # Errors
///
/// Returns `Error::InvalidBlobSize` if the blob is not exactly `dims * 4` bytes.
pub fn blob_to_vec(blob: &[u8], dims: usize) -> Result<Vec<f32>> {
    let expected = dims * std::mem::size_of::<f32>();
    if blob.len() != expected {
        return Err(Error::InvalidBlobSize {
            expected,
            actual: blob.len(),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Euclidean (L2) distance between two vectors, accumulated in f64.
///
/// # Errors
///
/// Returns `Error::MismatchedDimensions` if the vectors have different lengths.
pub fn l2_distance(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::MismatchedDimensions {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}
