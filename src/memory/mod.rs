//! Memory repository coordinating the embedding provider and both stores.
//!
//! Provides save, search, get and list over a [`Database`](crate::sqlite::Database),
//! with embeddings produced by an injected [`Embedder`](crate::embedding::Embedder).

mod crud;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use search::similarity_from_distance;
pub use store::{validate_query, validate_save, MemoryRepository, MAX_INPUT_LENGTH};
