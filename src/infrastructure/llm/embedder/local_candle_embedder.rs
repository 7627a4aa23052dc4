use std::fmt::Display;
use std::path::PathBuf;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;

pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Sentence embedder running a BERT checkpoint through candle. Output vectors
/// are mean-pooled over the attention mask and L2-normalised, so cosine
/// similarity and dot product rank identically.
pub struct LocalCandleEmbedder {
    model_id: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

fn load_error(stage: &str, e: impl Display) -> EmbedderError {
    EmbedderError::ModelLoadFailed(format!("{stage}: {e}"))
}

fn inference_error(e: impl Display) -> EmbedderError {
    EmbedderError::InferenceFailed(e.to_string())
}

impl LocalCandleEmbedder {
    /// Downloads (or reuses the hub cache for) `model_id` and loads it. Blocks.
    pub fn new(model_id: &str) -> Result<Self, EmbedderError> {
        let device = Device::new_metal(0).unwrap_or(Device::Cpu);
        tracing::info!(device = ?device, model = model_id, "Loading sentence embedding model");

        let files = fetch_model_files(model_id)?;

        let config: BertConfig = std::fs::read_to_string(&files.config)
            .map_err(|e| load_error("read config.json", e))
            .and_then(|raw| {
                serde_json::from_str(&raw).map_err(|e| load_error("parse config.json", e))
            })?;

        let mut tokenizer =
            Tokenizer::from_file(&files.tokenizer).map_err(|e| load_error("tokenizer.json", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| load_error("truncation", e))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        let dtype = if device.is_cpu() { DType::F32 } else { DType::F16 };
        // SAFETY: the safetensors file is memory-mapped read-only and outlives the model load.
        let weights = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], dtype, &device)
                .map_err(|e| load_error("model.safetensors", e))?
        };
        let model = BertModel::load(weights, &config).map_err(|e| load_error("bert", e))?;

        tracing::info!(hidden_size = config.hidden_size, "Sentence embedding model ready");

        Ok(Self {
            model_id: model_id.to_string(),
            model,
            tokenizer,
            device,
        })
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedderError::InferenceFailed(format!("tokenization: {e}")))?;

        let rows = |pick: fn(&Encoding) -> &[u32]| -> Result<Tensor, EmbedderError> {
            let tensors = encodings
                .iter()
                .map(|encoding| Tensor::new(pick(encoding), &self.device))
                .collect::<candle_core::Result<Vec<_>>>()
                .map_err(inference_error)?;
            Tensor::stack(&tensors, 0).map_err(inference_error)
        };

        let input_ids = rows(Encoding::get_ids)?;
        let type_ids = rows(Encoding::get_type_ids)?;
        let attention_mask = rows(Encoding::get_attention_mask)?;

        let hidden = self
            .model
            .forward(&input_ids, &type_ids, Some(&attention_mask))
            .map_err(inference_error)?;

        mean_pool_normalized(&hidden, &attention_mask)
            .and_then(|pooled| pooled.to_vec2::<f32>())
            .map_err(inference_error)
    }
}

fn fetch_model_files(model_id: &str) -> Result<ModelFiles, EmbedderError> {
    let api = Api::new().map_err(|e| load_error("hf-hub", e))?;
    let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

    let get = |name: &str| repo.get(name).map_err(|e| load_error(name, e));
    Ok(ModelFiles {
        config: get("config.json")?,
        tokenizer: get("tokenizer.json")?,
        weights: get("model.safetensors")?,
    })
}

const MIN_NORM: f32 = 1e-12;

/// `[batch, tokens, hidden]` → `[batch, hidden]`, averaging unmasked tokens, unit length.
pub fn mean_pool_normalized(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let hidden = hidden.to_dtype(DType::F32)?;
    let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;

    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?;
    let pooled = summed.broadcast_div(&counts)?;

    // Floor keeps an all-zero row at zero instead of NaN.
    let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(MIN_NORM)?;
    pooled.broadcast_div(&norms)
}

#[async_trait]
impl Embedder for LocalCandleEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.encode(&[text])?
            .into_iter()
            .next()
            .map(Embedding::new)
            .ok_or_else(|| EmbedderError::InferenceFailed("empty result".to_string()))
    }

    #[tracing::instrument(skip(self, texts), fields(batch = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.encode(texts)?.into_iter().map(Embedding::new).collect())
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
