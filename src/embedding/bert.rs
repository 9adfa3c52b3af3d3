//! Sentence encoder over a BERT-family checkpoint with attention-masked mean pooling.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::Embedder;
use super::device::select_device;
use super::error::EmbeddingError;
use super::utils::load_tokenizer;

/// Texts per forward pass.
const FORWARD_BATCH_SIZE: usize = 32;

/// Lower bound for the pooling denominator.
const MIN_TOKEN_COUNT: f64 = 1e-9;

struct BertInner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Embeds text with a local BERT checkpoint (`config.json`, `tokenizer.json`,
/// `model.safetensors`), e.g. all-MiniLM-L6-v2.
#[derive(Clone)]
pub struct BertEmbedder {
    inner: Arc<BertInner>,
    dim: usize,
    model_dir: PathBuf,
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("model_dir", &self.model_dir)
            .field("dim", &self.dim)
            .field("device", &self.inner.device)
            .finish()
    }
}

impl BertEmbedder {
    /// Loads the model from `model_dir`. Fails if its hidden size is not `expected_dim`.
    pub fn load(
        model_dir: &Path,
        expected_dim: usize,
        max_seq_len: usize,
    ) -> Result<Self, EmbeddingError> {
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        for path in [&config_path, &weights_path] {
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
        }

        let config_content = std::fs::read_to_string(&config_path)?;
        let config: BertConfig =
            serde_json::from_str(&config_content).map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("failed to parse config.json: {}", e),
            })?;

        if config.hidden_size != expected_dim {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "model hidden size {} does not match configured dimension {}",
                    config.hidden_size, expected_dim
                ),
            });
        }

        let tokenizer = load_tokenizer(model_dir, max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {}", e),
            }
        })?;

        let device = select_device();
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)?
        } else {
            BertModel::load(vb, &config)?
        };

        info!(
            model_dir = %model_dir.display(),
            dim = expected_dim,
            max_seq_len,
            ?device,
            "embedding model loaded"
        );

        Ok(Self {
            inner: Arc::new(BertInner {
                model,
                tokenizer,
                device,
            }),
            dim: expected_dim,
            model_dir: model_dir.to_path_buf(),
        })
    }

    fn embed_blocking(inner: &BertInner, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(FORWARD_BATCH_SIZE) {
            out.extend(Self::forward_batch(inner, batch)?);
        }
        Ok(out)
    }

    fn forward_batch(inner: &BertInner, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = inner
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let rows = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

        let mut ids = Vec::with_capacity(rows * seq_len);
        let mut mask = Vec::with_capacity(rows * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        debug!(rows, seq_len, "embedding forward pass");

        let input_ids = Tensor::from_vec(ids, (rows, seq_len), &inner.device)?;
        let attention_mask = Tensor::from_vec(mask, (rows, seq_len), &inner.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        // [rows, seq_len, hidden]
        let hidden = inner
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.maximum(MIN_TOKEN_COUNT)?;
        let pooled = summed.broadcast_div(&counts)?;

        Ok(pooled.to_vec2::<f32>()?)
    }
}

#[async_trait]
impl Embedder for BertEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || Self::embed_blocking(&inner, &texts)).await?
    }
}
