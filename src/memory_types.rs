//! Memory repository result types.

use serde::Serialize;

/// One ranked search hit, joined from the vector index and the metadata store.
///
/// Results arrive in ascending `distance` order, which is the same as
/// descending `similarity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMemory {
    /// Memory identifier shared by both stores.
    pub id: String,
    /// Display score, `exp(-distance) * 100`, in (0, 100].
    pub similarity: f64,
    /// Raw L2 distance between the query and the stored vector.
    pub distance: f64,
    pub title: String,
    pub tags: String,
    pub created_at: String,
    /// Summary text; always present.
    pub content: String,
    /// Verbatim long form, only when requested and stored non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
}
