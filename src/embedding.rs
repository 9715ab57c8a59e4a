//! Synchronous ONNX embedding engine for text-to-vector conversion.
//!
//! Defaults to the all-mpnet-base-v2 sentence-transformers model (768
//! dimensions) with mean pooling and L2 normalization. The repository only
//! sees the [`Embedder`] trait, so tests and callers can supply their own
//! provider.

use std::path::Path;

use hf_hub::api::sync::ApiBuilder;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tokenizers::{Tokenizer, TruncationParams};

/// Default embedding dimensions (all-mpnet-base-v2).
pub const EMBEDDING_DIMS: usize = 768;

/// Token limit applied by the tokenizer before inference.
const MAX_TOKENS: usize = 512;

/// Failures of the embedding provider.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Model or tokenizer download failed.
    #[error("model download failed: {0}")]
    Download(String),

    /// Tokenization error.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// ONNX session or inference error.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The provider returned something that is not a usable vector.
    #[error("malformed embedding: {0}")]
    Malformed(String),
}

/// A text-to-vector function with a fixed output dimension.
///
/// Implementations must be deterministic for a fixed `model_id`.
pub trait Embedder {
    /// Identity of the model producing the vectors.
    fn model_id(&self) -> &str;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// ONNX embedding engine for synchronous text-to-vector conversion.
pub struct EmbeddingEngine {
    model_id: String,
    dimension: usize,
    session: Session,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
}

impl EmbeddingEngine {
    /// Load model from the cache directory or download on first use.
    ///
    /// Uses `hf_hub::api::sync` for blocking I/O, matching the crate's
    /// no-async policy. Files are downloaded once into `cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the download, tokenizer setup or ONNX session
    /// creation fails.
    pub fn new(model_id: &str, dimension: usize, cache_dir: &Path) -> Result<Self, EmbeddingError> {
        tracing::info!(model_id, dimension, "loading embedding model");

        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .build()
            .map_err(|e| EmbeddingError::Download(e.to_string()))?;
        let repo = api.model(model_id.to_string());

        let model_path = repo
            .get("onnx/model.onnx")
            .or_else(|_| repo.get("model.onnx"))
            .map_err(|e| EmbeddingError::Download(e.to_string()))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbeddingError::Download(e.to_string()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

        let session = Session::builder()
            .map_err(inference_error)?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(inference_error)?
            .commit_from_file(&model_path)
            .map_err(inference_error)?;

        // Check if model requires token_type_ids input
        let requires_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        Ok(EmbeddingEngine {
            model_id: model_id.to_string(),
            dimension,
            session,
            tokenizer,
            requires_token_type_ids,
        })
    }

    fn run(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;
        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        if input_ids.is_empty() {
            return Err(EmbeddingError::Tokenization(
                "text produced no tokens".to_string(),
            ));
        }

        let seq_len = input_ids.len();
        let input_ids_vec: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let attention_mask_vec: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();

        let input_ids_tensor =
            Tensor::from_array(([1usize, seq_len], input_ids_vec)).map_err(inference_error)?;
        let attention_mask_tensor =
            Tensor::from_array(([1usize, seq_len], attention_mask_vec)).map_err(inference_error)?;

        // Only include token_type_ids if the model requires it
        let outputs = if self.requires_token_type_ids {
            let token_type_ids_tensor =
                Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len])).map_err(inference_error)?;
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
        } else {
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])
        }
        .map_err(inference_error)?;

        let (shape, data) = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                EmbeddingError::Malformed(
                    "Output tensor 'last_hidden_state' or 'token_embeddings' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?;

        if shape.len() != 3 {
            return Err(EmbeddingError::Malformed(format!(
                "Expected 3D output (batch, seq_len, hidden), got {:?}",
                shape
            )));
        }
        let batch_size = shape[0] as usize;
        let hidden_dim = shape[2] as usize;
        if batch_size != 1 || hidden_dim != self.dimension {
            return Err(EmbeddingError::Malformed(format!(
                "Unexpected output shape: {:?}, batch=1, hidden={} expected",
                shape, self.dimension
            )));
        }

        Ok(mean_pool(data, attention_mask, hidden_dim))
    }
}

impl Embedder for EmbeddingEngine {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    /// Generate an L2-normalized embedding.
    ///
    /// Texts exceeding 512 tokens are silently truncated by the tokenizer.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let pooled = self.run(text)?;
        Ok(l2_normalize(&pooled))
    }
}

fn inference_error(e: impl std::fmt::Display) -> EmbeddingError {
    EmbeddingError::Inference(e.to_string())
}

/// Mean of the token vectors in `data` weighted by the attention mask.
fn mean_pool(data: &[f32], attention_mask: &[u32], hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];

    for (chunk, &mask) in data.chunks(hidden_dim).zip(attention_mask.iter()) {
        let mask_value = mask as f32;
        for (pooled_value, &value) in pooled.iter_mut().zip(chunk.iter()) {
            *pooled_value += value * mask_value;
        }
    }

    let mask_sum: f32 = attention_mask
        .iter()
        .map(|&m| m as f32)
        .sum::<f32>()
        .max(1e-9);

    for value in pooled.iter_mut() {
        *value /= mask_sum;
    }
    pooled
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}
