//! amnesia - Local conversation memories with semantic search.
//!
//! Saves session summaries (with an optional verbatim transcript) into a
//! single SQLite file and retrieves them by meaning. The file holds two
//! logical stores: memory metadata and a fixed-dimension vector index.
//! All operations are synchronous (no async/await required).
//!
//! # Example
//!
//! ```no_run
//! use amnesia::{Config, Database, EmbeddingEngine, MemoryRepository};
//!
//! let config = Config::load().expect("Failed to load config");
//! let db = Database::initialize(
//!     &config.database_path,
//!     config.embedding_dims,
//!     &config.embedding_model,
//! )
//! .expect("Failed to initialize database");
//! let engine = EmbeddingEngine::new(
//!     &config.embedding_model,
//!     config.embedding_dims,
//!     &config.model_cache,
//! )
//! .expect("Failed to load model");
//! let mut repo = MemoryRepository::new(db, engine).expect("Dimension mismatch");
//!
//! repo.save("ses_123", "Rust lifetimes", "Explained elision rules", None, "rust")
//!     .expect("Failed to save");
//!
//! for result in repo.search("how do lifetimes work", 5, false).unwrap() {
//!     println!("{:.1}: {}", result.similarity, result.title);
//! }
//! ```
//!
//! # Mutability Requirements
//!
//! Methods that generate embeddings (`save`, `search`) require `&mut self`
//! because the embedding engine internally mutates state for ONNX tensor allocations.

pub mod config;
pub mod embedding;
pub mod errors;
pub mod memory;
pub mod memory_types;
pub mod output;
pub mod sqlite;
pub mod transcript;

// Re-export public API
pub use config::Config;
pub use embedding::{Embedder, EmbeddingEngine, EmbeddingError, EMBEDDING_DIMS};
pub use errors::Error;
pub use memory::{
    similarity_from_distance, validate_query, validate_save, MemoryRepository, MAX_INPUT_LENGTH,
};
pub use memory_types::ScoredMemory;
pub use output::preview;
pub use sqlite::{Database, Memory, MAX_SEARCH_LIMIT};
pub use transcript::{OpencodeExporter, TranscriptSource};
